//! Domain models for NextNote.
//!
//! - [`Note`]: a persisted note, owned by the user who created it.
//! - [`NoteRef`]: a per-user listing entry, either a full note or just its id.
//! - [`ResponseNote`]: the outward shape of a note, built fresh per response
//!   with the owner expanded and the requester's permissions attached.
//! - [`ShareRole`]: a grant of [`Permissions`] on one note to one recipient.
//! - [`UserId`] / [`UserInfo`]: a user and its human-readable expansion.

mod note;
mod share;
mod user;

pub use note::*;
pub use share::*;
pub use user::*;

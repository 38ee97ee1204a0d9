//! Collaborators the controller delegates to.
//!
//! [`crate::db::Database`] implements all three against SQLite; tests swap in
//! in-memory fakes.

use anyhow::Result;

use crate::models::*;

/// Looks users up on the host platform.
pub trait UserDirectory: Send + Sync {
    /// Expand a uid. Unknown uids come back as [`UserInfo::unknown`].
    fn user_info(&self, uid: &UserId) -> Result<UserInfo>;

    fn exists(&self, uid: &UserId) -> Result<bool>;
}

/// Note persistence.
pub trait NoteStore: Send + Sync {
    /// Notes visible to `uid`, in the order they should be displayed.
    ///
    /// `deleted` and `group` filter on the soft-delete flag and the grouping;
    /// `None` leaves that column unfiltered.
    fn find_by_user(
        &self,
        uid: &UserId,
        deleted: Option<bool>,
        group: Option<&str>,
    ) -> Result<Vec<NoteRef>>;

    fn find(&self, id: NoteId) -> Result<Option<Note>>;

    fn create(&self, draft: NoteDraft, owner: &UserId) -> Result<Note>;

    /// Returns `None` if the note no longer exists.
    fn update(&self, patch: NotePatch) -> Result<Option<Note>>;

    /// Returns whether a note was removed.
    fn delete(&self, id: NoteId) -> Result<bool>;
}

/// Sharing backend: permission checks and share roles.
pub trait ShareGuard: Send + Sync {
    /// Whether `uid` holds every bit of `permission` on `note`.
    fn check_permission(&self, uid: &UserId, permission: Permissions, note: &Note)
        -> Result<bool>;

    /// Share roles on a note owned by `owner`.
    fn roles_for(&self, note_id: NoteId, owner: &UserId) -> Result<Vec<ShareRole>>;

    /// Create or replace the role for `recipient`, recording `shared_by` as
    /// its grantor.
    fn grant(
        &self,
        note_id: NoteId,
        recipient: &UserId,
        permissions: Permissions,
        shared_by: &UserId,
    ) -> Result<ShareRole>;

    /// Returns whether a role was removed.
    fn revoke(&self, note_id: NoteId, recipient: &UserId) -> Result<bool>;
}

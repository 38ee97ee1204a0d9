use std::fmt;
use std::ops::BitOr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NoteId, UserId};

/// Bitmask of actions a user may perform on a note.
///
/// Bit values match the host platform's permission constants so existing
/// clients can keep testing bits the way they always have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u32);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1);
    pub const UPDATE: Self = Self(2);
    pub const CREATE: Self = Self(4);
    pub const DELETE: Self = Self(8);
    pub const SHARE: Self = Self(16);
    pub const ALL: Self = Self(31);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every bit in `other` is also set here.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no bits outside [`Permissions::ALL`] are set.
    pub const fn is_known(self) -> bool {
        self.0 & !Self::ALL.0 == 0
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A grant of permissions on one note to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRole {
    pub note_id: NoteId,
    pub share_with: UserId,
    pub permissions: Permissions,
    /// The owner, or the recipient who passed the note on.
    pub shared_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Request body for `PUT /notes/{id}/shares/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareNoteInput {
    pub permissions: Permissions,
}

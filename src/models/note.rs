use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{Permissions, UserId, UserInfo};

pub type NoteId = Uuid;

/// A persisted note.
///
/// `name` always mirrors `title`; clients read either one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub name: String,
    pub grouping: Option<String>,
    pub content: String,
    /// The user who created the note. Never changes.
    pub owner: UserId,
    /// Soft-delete flag. Deleted notes stay in the store until removed.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a per-user listing yields.
///
/// Owned notes come back fully materialized. Notes reached through a share
/// only carry their id and have to be fetched before they can be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteRef {
    Full(Note),
    IdOnly(NoteId),
}

impl NoteRef {
    pub fn id(&self) -> NoteId {
        match self {
            Self::Full(note) => note.id,
            Self::IdOnly(id) => *id,
        }
    }
}

/// A validated note about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub name: String,
    pub grouping: Option<String>,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: String, grouping: Option<String>, content: Option<String>) -> Self {
        Self {
            name: title.clone(),
            title,
            grouping,
            content: content.unwrap_or_default(),
        }
    }
}

/// Fields to write over an existing note. `None` keeps the stored value;
/// `grouping: Some(None)` clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct NotePatch {
    pub id: NoteId,
    pub title: String,
    pub name: String,
    pub grouping: Option<Option<String>>,
    pub content: Option<String>,
    pub deleted: Option<bool>,
}

/// Request body for `POST /notes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub grouping: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for `PUT /notes/{id}`.
///
/// An absent `grouping` keeps the stored one, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub grouping: Option<Option<String>>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
}

/// Query parameters for `GET /notes`.
///
/// `deleted` accepts `true`/`false` as well as `1`/`0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListNotesQuery {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub deleted: Option<bool>,
    pub group: Option<String>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some("1") | Some("true") => Ok(Some(true)),
        Some("0") | Some("false") => Ok(Some(false)),
        Some(other) => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"true, false, 1 or 0",
        )),
    }
}

/// Who a note is shared with, as seen by the requester.
///
/// The owner gets every recipient expanded. Anyone else only learns about
/// themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SharedWith {
    Recipients(Vec<UserInfo>),
    Requester(Vec<UserId>),
}

/// The outward shape of a note, built per response and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseNote {
    pub id: NoteId,
    pub title: String,
    pub name: String,
    pub grouping: Option<String>,
    pub content: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: UserInfo,
    pub permissions: Permissions,
    pub shared_with: SharedWith,
}

/// Fixed body returned by delete and unshare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub const OK: Self = Self { success: true };
}

//! Note API orchestration.
//!
//! [`NoteApiController`] turns each API call into calls on a [`NoteStore`],
//! a [`ShareGuard`] and a [`UserDirectory`], then flattens the result into a
//! [`ResponseNote`]. It holds no state of its own. The requesting user is
//! passed into every operation by the request layer.

mod ports;

pub use ports::*;

use std::sync::Arc;

use crate::error::{ApiResult, NoteApiError};
use crate::models::*;

#[derive(Clone)]
pub struct NoteApiController {
    store: Arc<dyn NoteStore>,
    guard: Arc<dyn ShareGuard>,
    users: Arc<dyn UserDirectory>,
}

impl NoteApiController {
    pub fn new(
        store: Arc<dyn NoteStore>,
        guard: Arc<dyn ShareGuard>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            guard,
            users,
        }
    }

    /// Notes visible to `uid`, in store order.
    pub fn list(
        &self,
        uid: &UserId,
        deleted: Option<bool>,
        group: Option<&str>,
    ) -> ApiResult<Vec<ResponseNote>> {
        tracing::debug!(%uid, ?deleted, ?group, "Listing notes");

        let refs = self.store.find_by_user(uid, deleted, group)?;
        let mut notes = Vec::with_capacity(refs.len());
        for note_ref in refs {
            let id = note_ref.id();
            let note = match note_ref {
                NoteRef::Full(note) => note,
                NoteRef::IdOnly(_) => match self.store.find(id)? {
                    Some(note) => note,
                    None => {
                        tracing::debug!(%id, "Shared note vanished before it could be listed");
                        continue;
                    }
                },
            };
            notes.push(self.format(note, uid)?);
        }

        Ok(notes)
    }

    /// A single note. Any authenticated user may read any note by id.
    pub fn get(&self, uid: &UserId, id: NoteId) -> ApiResult<ResponseNote> {
        let note = self.store.find(id)?.ok_or(NoteApiError::NotFound)?;
        self.format(note, uid)
    }

    pub fn create(
        &self,
        uid: &UserId,
        title: Option<String>,
        grouping: Option<String>,
        content: Option<String>,
    ) -> ApiResult<ResponseNote> {
        let title = require_title(title)?;
        let note = self
            .store
            .create(NoteDraft::new(title, grouping, content), uid)?;

        tracing::debug!(%uid, id = %note.id, "Created note");
        self.format(note, uid)
    }

    pub fn update(
        &self,
        uid: &UserId,
        id: NoteId,
        title: Option<String>,
        grouping: Option<Option<String>>,
        content: Option<String>,
        deleted: Option<bool>,
    ) -> ApiResult<ResponseNote> {
        let title = require_title(title)?;
        let existing = self.store.find(id)?.ok_or(NoteApiError::NotFound)?;
        self.require(uid, Permissions::UPDATE, &existing)?;

        let patch = NotePatch {
            id,
            name: title.clone(),
            title,
            grouping,
            content,
            deleted,
        };
        let note = self.store.update(patch)?.ok_or(NoteApiError::NotFound)?;

        tracing::debug!(%uid, %id, "Updated note");
        self.format(note, uid)
    }

    pub fn delete(&self, uid: &UserId, id: NoteId) -> ApiResult<SuccessResponse> {
        let existing = self.store.find(id)?.ok_or(NoteApiError::NotFound)?;
        self.require(uid, Permissions::DELETE, &existing)?;

        self.store.delete(id)?;

        tracing::debug!(%uid, %id, "Deleted note");
        Ok(SuccessResponse::OK)
    }

    /// Grant `recipient` the given permissions on a note, replacing any
    /// earlier grant.
    ///
    /// The owner may grant anything. A recipient holding [`Permissions::SHARE`]
    /// may pass on at most what they hold, never to themselves, and may only
    /// replace roles they granted.
    pub fn share(
        &self,
        uid: &UserId,
        id: NoteId,
        recipient: &UserId,
        permissions: Permissions,
    ) -> ApiResult<ShareRole> {
        let note = self.store.find(id)?.ok_or(NoteApiError::NotFound)?;
        self.require(uid, Permissions::SHARE, &note)?;

        if *recipient == note.owner {
            return Err(NoteApiError::Validation(
                "cannot share a note with its owner".to_string(),
            ));
        }
        if !permissions.is_known() || !permissions.contains(Permissions::READ) {
            return Err(NoteApiError::Validation(format!(
                "invalid permissions: {}",
                permissions
            )));
        }
        if *uid != note.owner {
            self.require_reshare(uid, &note, recipient, permissions)?;
        }
        if !self.users.exists(recipient)? {
            return Err(NoteApiError::Validation(format!(
                "unknown user: {}",
                recipient
            )));
        }

        let role = self.guard.grant(id, recipient, permissions, uid)?;

        tracing::debug!(%uid, %id, %recipient, %permissions, "Shared note");
        Ok(role)
    }

    /// Revoke a role. Recipients may only revoke roles they granted.
    pub fn unshare(
        &self,
        uid: &UserId,
        id: NoteId,
        recipient: &UserId,
    ) -> ApiResult<SuccessResponse> {
        let note = self.store.find(id)?.ok_or(NoteApiError::NotFound)?;
        self.require(uid, Permissions::SHARE, &note)?;

        if *uid != note.owner {
            let roles = self.guard.roles_for(id, &note.owner)?;
            let role = roles
                .iter()
                .find(|role| role.share_with == *recipient)
                .ok_or(NoteApiError::NotFound)?;
            if role.shared_by != *uid {
                tracing::warn!(
                    %uid,
                    %id,
                    %recipient,
                    shared_by = %role.shared_by,
                    "Refusing to revoke a role granted by someone else"
                );
                return Err(NoteApiError::Unauthorized);
            }
        }

        if !self.guard.revoke(id, recipient)? {
            return Err(NoteApiError::NotFound);
        }

        tracing::debug!(%uid, %id, %recipient, "Revoked share");
        Ok(SuccessResponse::OK)
    }

    pub fn me(&self, uid: &UserId) -> ApiResult<UserInfo> {
        Ok(self.users.user_info(uid)?)
    }

    fn require(&self, uid: &UserId, permission: Permissions, note: &Note) -> ApiResult<()> {
        if self.guard.check_permission(uid, permission, note)? {
            Ok(())
        } else {
            tracing::warn!(%uid, id = %note.id, %permission, "Permission check failed");
            Err(NoteApiError::Unauthorized)
        }
    }

    fn require_reshare(
        &self,
        uid: &UserId,
        note: &Note,
        recipient: &UserId,
        permissions: Permissions,
    ) -> ApiResult<()> {
        let roles = self.guard.roles_for(note.id, &note.owner)?;
        let held = roles
            .iter()
            .find(|role| role.share_with == *uid)
            .map(|role| role.permissions)
            .unwrap_or(Permissions::NONE);
        let replaces_foreign_grant = roles
            .iter()
            .any(|role| role.share_with == *recipient && role.shared_by != *uid);

        if *recipient == *uid || !held.contains(permissions) || replaces_foreign_grant {
            tracing::warn!(
                %uid,
                id = %note.id,
                %recipient,
                %held,
                %permissions,
                "Reshare exceeds the requester's role"
            );
            return Err(NoteApiError::Unauthorized);
        }
        Ok(())
    }

    /// Build the response shape for `note` as seen by `uid`.
    fn format(&self, note: Note, uid: &UserId) -> ApiResult<ResponseNote> {
        let is_owner = *uid == note.owner;
        let roles = self.guard.roles_for(note.id, &note.owner)?;

        let (permissions, shared_with) = if is_owner {
            let recipients = roles
                .iter()
                .map(|role| self.users.user_info(&role.share_with))
                .collect::<anyhow::Result<Vec<_>>>()?;
            (Permissions::ALL, SharedWith::Recipients(recipients))
        } else {
            let permissions = roles
                .iter()
                .find(|role| role.share_with == *uid)
                .map(|role| role.permissions)
                .unwrap_or(Permissions::NONE);
            (permissions, SharedWith::Requester(vec![uid.clone()]))
        };

        let owner = self.users.user_info(&note.owner)?;

        Ok(ResponseNote {
            id: note.id,
            title: note.title,
            name: note.name,
            grouping: note.grouping,
            content: note.content,
            deleted: note.deleted,
            created_at: note.created_at,
            updated_at: note.updated_at,
            owner,
            permissions,
            shared_with,
        })
    }
}

fn require_title(title: Option<String>) -> ApiResult<String> {
    match title {
        Some(title) if !title.is_empty() => Ok(title),
        _ => Err(NoteApiError::title_missing()),
    }
}

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use uuid::Uuid;

use crate::controller::{NoteStore, ShareGuard, UserDirectory};
use crate::models::*;

const NOTE_COLUMNS: &str =
    "id, title, name, grouping, content, owner, deleted, created_at, updated_at";

/// SQLite-backed store. Cloning shares the underlying connection.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // User operations
    // ============================================================

    /// Register a user, or rename one that already exists.
    pub fn create_user(&self, input: CreateUserInput) -> Result<UserInfo> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let display_name = input
            .display_name
            .unwrap_or_else(|| input.uid.to_string());

        conn.execute(
            "INSERT INTO users (uid, display_name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(uid) DO UPDATE SET display_name = excluded.display_name",
            (input.uid.as_str(), &display_name, Utc::now().to_rfc3339()),
        )?;

        Ok(UserInfo {
            uid: input.uid,
            display_name,
        })
    }

    pub fn get_user(&self, uid: &UserId) -> Result<Option<UserInfo>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let display_name = conn
            .query_row(
                "SELECT display_name FROM users WHERE uid = ?",
                [uid.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(display_name.map(|display_name| UserInfo {
            uid: uid.clone(),
            display_name,
        }))
    }

    // ============================================================
    // Note operations
    // ============================================================

    /// Notes owned by `uid` (most recently updated first), followed by the
    /// ids of notes shared with `uid`.
    pub fn get_notes_for_user(
        &self,
        uid: &UserId,
        deleted: Option<bool>,
        group: Option<&str>,
    ) -> Result<Vec<NoteRef>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let uid = uid.as_str();

        let (filter, filter_params) = note_filters("", deleted, group);
        let sql = format!(
            "SELECT {} FROM notes WHERE owner = ?{} ORDER BY updated_at DESC, title",
            NOTE_COLUMNS, filter
        );
        let mut params: Vec<&dyn ToSql> = vec![&uid];
        params.extend(filter_params.iter().map(|p| p.as_ref()));

        let mut stmt = conn.prepare(&sql)?;
        let mut refs = stmt
            .query_map(params.as_slice(), |row| note_from_row(row).map(NoteRef::Full))?
            .collect::<Result<Vec<_>, _>>()?;

        let (filter, filter_params) = note_filters("n.", deleted, group);
        let sql = format!(
            "SELECT n.id FROM note_shares s JOIN notes n ON n.id = s.note_id
             WHERE s.share_with = ?{} ORDER BY n.updated_at DESC, n.title",
            filter
        );
        let mut params: Vec<&dyn ToSql> = vec![&uid];
        params.extend(filter_params.iter().map(|p| p.as_ref()));

        let mut stmt = conn.prepare(&sql)?;
        let shared = stmt
            .query_map(params.as_slice(), |row| {
                Ok(NoteRef::IdOnly(parse_uuid(row.get::<_, String>(0)?)))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        refs.extend(shared);
        Ok(refs)
    }

    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let note = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS),
                [id.to_string()],
                note_from_row,
            )
            .optional()?;
        Ok(note)
    }

    pub fn create_note(&self, draft: NoteDraft, owner: &UserId) -> Result<Note> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO notes (id, title, name, grouping, content, owner, deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                &draft.title,
                &draft.name,
                &draft.grouping,
                &draft.content,
                owner.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Note {
            id,
            title: draft.title,
            name: draft.name,
            grouping: draft.grouping,
            content: draft.content,
            owner: owner.clone(),
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_note(&self, patch: NotePatch) -> Result<Option<Note>> {
        let Some(existing) = self.get_note(patch.id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let grouping = patch.grouping.unwrap_or(existing.grouping);
        let content = patch.content.unwrap_or(existing.content);
        let deleted = patch.deleted.unwrap_or(existing.deleted);

        let rows = conn.execute(
            "UPDATE notes SET title = ?, name = ?, grouping = ?, content = ?, deleted = ?, updated_at = ?
             WHERE id = ?",
            (
                &patch.title,
                &patch.name,
                &grouping,
                &content,
                deleted,
                now.to_rfc3339(),
                patch.id.to_string(),
            ),
        )?;
        if rows == 0 {
            return Ok(None);
        }

        Ok(Some(Note {
            id: patch.id,
            title: patch.title,
            name: patch.name,
            grouping,
            content,
            owner: existing.owner,
            deleted,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Remove a note together with its share roles.
    pub fn delete_note(&self, id: NoteId) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM note_shares WHERE note_id = ?", [id.to_string()])?;
        let rows = tx.execute("DELETE FROM notes WHERE id = ?", [id.to_string()])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Share operations
    // ============================================================

    /// Roles on `note_id`, provided the note belongs to `owner`.
    pub fn get_share_roles(&self, note_id: NoteId, owner: &UserId) -> Result<Vec<ShareRole>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT s.note_id, s.share_with, s.permissions, s.shared_by, s.created_at
             FROM note_shares s JOIN notes n ON n.id = s.note_id
             WHERE s.note_id = ? AND n.owner = ?
             ORDER BY s.created_at, s.share_with",
        )?;

        let roles = stmt
            .query_map((note_id.to_string(), owner.as_str()), share_role_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(roles)
    }

    pub fn get_share_permissions(
        &self,
        note_id: NoteId,
        uid: &UserId,
    ) -> Result<Option<Permissions>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let bits = conn
            .query_row(
                "SELECT permissions FROM note_shares WHERE note_id = ? AND share_with = ?",
                (note_id.to_string(), uid.as_str()),
                |row| row.get::<_, u32>(0),
            )
            .optional()?;
        Ok(bits.map(Permissions::from_bits))
    }

    /// Insert or replace a role. Replacing keeps the original grant time but
    /// takes over the grantor.
    pub fn upsert_share(
        &self,
        note_id: NoteId,
        recipient: &UserId,
        permissions: Permissions,
        shared_by: &UserId,
    ) -> Result<ShareRole> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO note_shares (note_id, share_with, permissions, shared_by, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(note_id, share_with) DO UPDATE SET
                permissions = excluded.permissions,
                shared_by = excluded.shared_by",
            (
                note_id.to_string(),
                recipient.as_str(),
                permissions.bits(),
                shared_by.as_str(),
                Utc::now().to_rfc3339(),
            ),
        )?;

        let role = conn.query_row(
            "SELECT note_id, share_with, permissions, shared_by, created_at
             FROM note_shares WHERE note_id = ? AND share_with = ?",
            (note_id.to_string(), recipient.as_str()),
            share_role_from_row,
        )?;
        Ok(role)
    }

    pub fn delete_share(&self, note_id: NoteId, recipient: &UserId) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM note_shares WHERE note_id = ? AND share_with = ?",
            (note_id.to_string(), recipient.as_str()),
        )?;
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

impl UserDirectory for Database {
    fn user_info(&self, uid: &UserId) -> Result<UserInfo> {
        Ok(self
            .get_user(uid)?
            .unwrap_or_else(|| UserInfo::unknown(uid)))
    }

    fn exists(&self, uid: &UserId) -> Result<bool> {
        Ok(self.get_user(uid)?.is_some())
    }
}

impl NoteStore for Database {
    fn find_by_user(
        &self,
        uid: &UserId,
        deleted: Option<bool>,
        group: Option<&str>,
    ) -> Result<Vec<NoteRef>> {
        self.get_notes_for_user(uid, deleted, group)
    }

    fn find(&self, id: NoteId) -> Result<Option<Note>> {
        self.get_note(id)
    }

    fn create(&self, draft: NoteDraft, owner: &UserId) -> Result<Note> {
        self.create_note(draft, owner)
    }

    fn update(&self, patch: NotePatch) -> Result<Option<Note>> {
        self.update_note(patch)
    }

    fn delete(&self, id: NoteId) -> Result<bool> {
        self.delete_note(id)
    }
}

impl ShareGuard for Database {
    fn check_permission(
        &self,
        uid: &UserId,
        permission: Permissions,
        note: &Note,
    ) -> Result<bool> {
        if *uid == note.owner {
            return Ok(true);
        }
        Ok(self
            .get_share_permissions(note.id, uid)?
            .is_some_and(|granted| granted.contains(permission)))
    }

    fn roles_for(&self, note_id: NoteId, owner: &UserId) -> Result<Vec<ShareRole>> {
        self.get_share_roles(note_id, owner)
    }

    fn grant(
        &self,
        note_id: NoteId,
        recipient: &UserId,
        permissions: Permissions,
        shared_by: &UserId,
    ) -> Result<ShareRole> {
        self.upsert_share(note_id, recipient, permissions, shared_by)
    }

    fn revoke(&self, note_id: NoteId, recipient: &UserId) -> Result<bool> {
        self.delete_share(note_id, recipient)
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "nextnote")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("nextnote.db"))
}

/// Extra `AND` clauses for the optional list filters. `prefix` qualifies the
/// column names when the notes table is joined.
fn note_filters(
    prefix: &str,
    deleted: Option<bool>,
    group: Option<&str>,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut sql = String::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(deleted) = deleted {
        sql.push_str(&format!(" AND {}deleted = ?", prefix));
        params.push(Box::new(deleted));
    }
    if let Some(group) = group {
        sql.push_str(&format!(" AND {}grouping = ?", prefix));
        params.push(Box::new(group.to_string()));
    }

    (sql, params)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        name: row.get(2)?,
        grouping: row.get(3)?,
        content: row.get(4)?,
        owner: UserId::new(row.get::<_, String>(5)?),
        deleted: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn share_role_from_row(row: &Row<'_>) -> rusqlite::Result<ShareRole> {
    Ok(ShareRole {
        note_id: parse_uuid(row.get::<_, String>(0)?),
        share_with: UserId::new(row.get::<_, String>(1)?),
        permissions: Permissions::from_bits(row.get(2)?),
        shared_by: UserId::new(row.get::<_, String>(3)?),
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

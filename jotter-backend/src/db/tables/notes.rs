//! Note table operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::super::{Database, StoreError};
use crate::models::Note;

impl Database {
    /// List all notes, newest first. Ties on `created_at` fall back to
    /// insertion order so N inserts always list in reverse order.
    pub fn list_notes(&self) -> Result<Vec<Note>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let notes = stmt
            .query_map([], |row| Self::row_to_note(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(notes)
    }

    /// Get a note by id
    pub fn get_note(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
        )?;

        let note = stmt
            .query_row([id], |row| Self::row_to_note(row))
            .optional()?;

        Ok(note)
    }

    /// Create a note. The store assigns the id and both timestamps;
    /// `created_at == updated_at` on a fresh note.
    pub fn create_note(&self, title: &str, content: &str) -> Result<Note, StoreError> {
        let conn = self.conn()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, title, content, now.to_rfc3339(), now.to_rfc3339()],
        )?;

        Ok(Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite a note's title and content, refreshing `updated_at`.
    /// Returns `None` when no note has the given id.
    pub fn update_note(
        &self,
        id: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        let changed = conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
            params![title, content, now, id],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        drop(conn);

        // Return the updated note
        self.get_note(id)
    }

    /// Delete a note permanently. Returns whether a row was removed.
    pub fn delete_note(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;

        let removed = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;

        Ok(removed > 0)
    }

    fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
        let created_at_str: String = row.get(3)?;
        let updated_at_str: String = row.get(4)?;

        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_db(dir: &tempfile::TempDir) -> Database {
        Database::new(dir.path().join("notes.db").to_str().unwrap())
            .expect("Failed to open database")
    }

    #[test]
    fn test_create_then_get_roundtrip() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir);

        let created = db
            .create_note("Groceries", "Milk, eggs")
            .expect("Failed to create note");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = db
            .get_note(&created.id)
            .expect("Failed to get note")
            .expect("Note missing after create");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "Groceries");
        assert_eq!(fetched.content, "Milk, eggs");
    }

    #[test]
    fn test_ids_are_unique() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir);

        let a = db.create_note("a", "1").unwrap();
        let b = db.create_note("b", "2").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir);

        for title in ["first", "second", "third"] {
            db.create_note(title, "body").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let notes = db.list_notes().expect("Failed to list notes");
        let titles: Vec<&str> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_update_refreshes_updated_at_only() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir);

        let created = db.create_note("draft", "v1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let updated = db
            .update_note(&created.id, "draft", "v2")
            .expect("Failed to update note")
            .expect("Note missing on update");

        assert_eq!(updated.content, "v2");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > updated.created_at);
    }

    #[test]
    fn test_update_unknown_id() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir);

        let missing = db
            .update_note(&Uuid::new_v4().to_string(), "x", "y")
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_delete_then_get() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir);

        let note = db.create_note("scrap", "gone soon").unwrap();

        assert!(db.delete_note(&note.id).unwrap());
        assert!(db.get_note(&note.id).unwrap().is_none());

        // Second delete is a no-op
        assert!(!db.delete_note(&note.id).unwrap());
    }
}

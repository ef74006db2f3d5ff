use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

/// Key/value store that plays the role of browser local storage.
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        let path = dir.join("storage.db");
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open local storage at {}", path.display()))?;
        let storage = Self { conn };
        storage.init()?;
        debug!(path = %path.display(), "local storage opened");
        Ok(storage)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.init()?;
        Ok(storage)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read '{}' from local storage", key))
    }

    /// Writes every pair or none of them.
    pub fn set_items(&self, items: &[(&str, &str)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in items {
            tx.execute(
                "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                params![key, value],
            )?;
        }
        tx.commit().context("Failed to write local storage")
    }

    pub fn remove_items(&self, keys: &[&str]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for key in keys {
            tx.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        }
        tx.commit().context("Failed to clear local storage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = LocalStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_item("user_id").unwrap(), None);

        storage.set_items(&[("user_id", "7")]).unwrap();
        assert_eq!(storage.get_item("user_id").unwrap().as_deref(), Some("7"));

        storage.set_items(&[("user_id", "8")]).unwrap();
        assert_eq!(storage.get_item("user_id").unwrap().as_deref(), Some("8"));

        storage.remove_items(&["user_id"]).unwrap();
        assert_eq!(storage.get_item("user_id").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = LocalStorage::open(dir.path()).unwrap();
            storage.set_items(&[("user_id", "7"), ("user_email", "a@b.com")]).unwrap();
        }
        assert!(dir.path().join("storage.db").is_file());
        let storage = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get_item("user_email").unwrap().as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_remove_items_clears_all_keys() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_items(&[("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
        storage.remove_items(&["a", "b"]).unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        assert_eq!(storage.get_item("b").unwrap(), None);
        assert_eq!(storage.get_item("c").unwrap().as_deref(), Some("3"));
    }
}

pub mod app_meta;
pub mod schema;

use sqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local client-side database. Holds small key/value state such as the API key.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = sqlite::open(db_path)?;
        Self::configure(&conn)?;
        schema::run_migrations(&conn)?;
        Ok(Store { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = sqlite::open(":memory:")?;
        Self::configure(&conn)?;
        schema::run_migrations(&conn)?;
        Ok(Store { conn })
    }

    fn configure(conn: &Connection) -> Result<(), sqlite::Error> {
        conn.execute(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        let mut stmt = store.conn().prepare("PRAGMA journal_mode").unwrap();
        assert_eq!(stmt.next().unwrap(), sqlite::State::Row);
        let mode = stmt.read::<String, _>(0).unwrap();
        // In-memory databases use "memory" journal mode, not WAL
        assert!(mode == "wal" || mode == "memory");
    }

    #[test]
    fn test_migrations_idempotent() {
        let store = Store::open_in_memory().unwrap();
        schema::run_migrations(store.conn()).unwrap();
        schema::run_migrations(store.conn()).unwrap();
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.db");
        Store::open(&path).unwrap();
        assert!(path.exists());
    }
}

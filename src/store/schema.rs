use sqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), sqlite::Error> {
    conn.execute(
        "
        CREATE TABLE IF NOT EXISTS app_meta (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )
}

#[cfg(test)]
mod tests {
    use crate::store::Store;

    #[test]
    fn test_app_meta_created() {
        let store = Store::open_in_memory().unwrap();
        let mut stmt = store
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        let mut tables = Vec::new();
        while let Ok(sqlite::State::Row) = stmt.next() {
            tables.push(stmt.read::<String, _>(0).unwrap());
        }
        assert!(tables.contains(&"app_meta".to_string()));
    }
}

use super::Store;

impl Store {
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, sqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_meta WHERE key = ?")?;
        stmt.bind((1, key))?;
        if let sqlite::State::Row = stmt.next()? {
            Ok(Some(stmt.read::<String, _>(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), sqlite::Error> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO app_meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')",
        )?;
        stmt.bind((1, key))?;
        stmt.bind((2, value))?;
        stmt.next()?;
        Ok(())
    }

    pub fn delete_meta(&self, key: &str) -> Result<(), sqlite::Error> {
        let mut stmt = self.conn.prepare("DELETE FROM app_meta WHERE key = ?")?;
        stmt.bind((1, key))?;
        stmt.next()?;
        Ok(())
    }
}

//! Persisted session token.
//!
//! One key-value entry: `auth-token -> string`.  The row is upserted on
//! login, read on startup, and deleted on logout.

use rusqlite::params;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Persist the session token, replacing any previous one.
    pub fn save_token(&self, token: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO session (id, token, saved_at) VALUES (1, ?1, ?2)",
            params![token, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the persisted session token, if any.
    pub fn load_token(&self) -> Result<Option<String>> {
        let token = self
            .conn()
            .query_row("SELECT token FROM session WHERE id = 1", [], |row| {
                row.get::<_, String>(0)
            });

        match token {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the persisted session token.  Succeeds even if none exists.
    pub fn clear_token(&self) -> Result<()> {
        self.conn().execute("DELETE FROM session WHERE id = 1", [])?;
        Ok(())
    }
}

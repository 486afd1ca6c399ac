//! v001 -- Initial schema creation.
//!
//! Creates the `session` table.  The table holds at most one row: the
//! opaque auth token returned by the server after OTP verification.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Session (single row; absence of the row means logged out)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS session (
    id       INTEGER PRIMARY KEY CHECK (id = 1),
    token    TEXT NOT NULL,                -- opaque server-issued token
    saved_at TEXT NOT NULL                 -- ISO-8601 / RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

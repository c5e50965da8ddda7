//! Process-wide key/value state (e.g. the month views were last reset).

use reelmark_common::{Error, Result};
use rusqlite::Connection;

/// Read a value.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    match conn.query_row("SELECT value FROM app_state WHERE key = ?1", [key], |row| {
        row.get(0)
    }) {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Insert or replace a value.
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

//! Profile operations.

use chrono::Utc;
use reelmark_common::{Error, ProfileId, Result};
use rusqlite::Connection;

use crate::models::Profile;

const COLS: &str = "id, name, created_at";

/// Create a new profile.
pub fn create_profile(conn: &Connection, name: &str) -> Result<Profile> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("profile name must not be empty"));
    }

    let profile = Profile {
        id: ProfileId::new(),
        name: name.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    conn.execute(
        "INSERT INTO profiles (id, name, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![profile.id.to_string(), profile.name, profile.created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(profile)
}

/// Get a profile by ID.
pub fn get_profile(conn: &Connection, id: ProfileId) -> Result<Option<Profile>> {
    let q = format!("SELECT {COLS} FROM profiles WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Profile::from_row) {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Whether a profile with this ID exists.
pub fn profile_exists(conn: &Connection, id: ProfileId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM profiles WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// List all profiles ordered by name.
pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let q = format!("SELECT {COLS} FROM profiles ORDER BY name");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Profile::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

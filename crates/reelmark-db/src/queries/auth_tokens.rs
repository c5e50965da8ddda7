//! Authentication token operations.
//!
//! Tokens are opaque strings that resolve to a profile until they expire.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reelmark_common::{Error, ProfileId, Result};
use rusqlite::Connection;

use crate::models::AuthToken;

const COLS: &str = "token, profile_id, expires_at";
const TOKEN_LEN: usize = 48;

/// Mint a random token for `profile_id`, valid for `ttl`.
pub fn issue_token(conn: &Connection, profile_id: ProfileId, ttl: Duration) -> Result<AuthToken> {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    let now = Utc::now();
    let expires_at = (now + ttl).to_rfc3339();

    conn.execute(
        "INSERT INTO auth_tokens (token, profile_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![token, profile_id.to_string(), expires_at, now.to_rfc3339()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(AuthToken {
        token,
        profile_id,
        expires_at,
    })
}

/// Look up a token by its value.
pub fn get_token(conn: &Connection, token: &str) -> Result<Option<AuthToken>> {
    let q = format!("SELECT {COLS} FROM auth_tokens WHERE token = ?1");
    match conn.query_row(&q, [token], AuthToken::from_row) {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Resolve a token to its profile if it has not expired at `now`.
pub fn resolve_token(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<ProfileId>> {
    let Some(found) = get_token(conn, token)? else {
        return Ok(None);
    };

    let expires_at = DateTime::parse_from_rfc3339(&found.expires_at)
        .map_err(|e| Error::database(format!("Corrupt token expiry: {e}")))?
        .with_timezone(&Utc);

    if expires_at <= now {
        return Ok(None);
    }
    Ok(Some(found.profile_id))
}

/// Delete all tokens whose `expires_at` is in the past.
pub fn delete_expired_tokens(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM auth_tokens WHERE expires_at < ?1",
        [now.to_rfc3339()],
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::profiles;

    #[test]
    fn issue_and_resolve() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let profile = profiles::create_profile(&conn, "tok").unwrap();

        let tok = issue_token(&conn, profile.id, Duration::hours(1)).unwrap();
        assert_eq!(tok.token.len(), TOKEN_LEN);

        let resolved = resolve_token(&conn, &tok.token, Utc::now()).unwrap();
        assert_eq!(resolved, Some(profile.id));
    }

    #[test]
    fn expired_token_does_not_resolve() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let profile = profiles::create_profile(&conn, "tok").unwrap();

        let tok = issue_token(&conn, profile.id, Duration::hours(1)).unwrap();
        let later = Utc::now() + Duration::hours(2);
        assert_eq!(resolve_token(&conn, &tok.token, later).unwrap(), None);

        assert_eq!(delete_expired_tokens(&conn, later).unwrap(), 1);
        assert!(get_token(&conn, &tok.token).unwrap().is_none());
    }

    #[test]
    fn unknown_token() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert_eq!(resolve_token(&conn, "nope", Utc::now()).unwrap(), None);
    }
}

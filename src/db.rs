//! Async access to the blocking SQLite pool.

use reelmark_common::{Error, Result};
use reelmark_db::pool::{get_conn, DbPool};
use rusqlite::Connection;

/// Run `f` against a pooled connection on the blocking thread pool.
///
/// The connection is checked out and returned inside the blocking task, so a
/// request task never holds a connection across an await point.
pub async fn with_conn<F, T>(pool: &DbPool, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = get_conn(&pool)?;
        f(&conn)
    })
    .await
    .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmark_db::pool::init_memory_pool;
    use reelmark_db::queries::profiles;

    #[tokio::test]
    async fn runs_query_off_the_runtime() {
        let pool = init_memory_pool().unwrap();
        let profile = with_conn(&pool, |conn| profiles::create_profile(conn, "den"))
            .await
            .unwrap();
        let found = with_conn(&pool, move |conn| profiles::get_profile(conn, profile.id))
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "den");
    }

    #[tokio::test]
    async fn propagates_errors() {
        let pool = init_memory_pool().unwrap();
        let err = with_conn(&pool, |conn| profiles::create_profile(conn, "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}

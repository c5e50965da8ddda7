//! Resolves the calling profile.
//!
//! Token resolution order:
//! 1. `Authorization: Bearer <token>`
//! 2. Cookie: `reelmark_session=<token>`
//!
//! Tokens are looked up in the `auth_tokens` table. With auth disabled every
//! request acts as the default profile.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use chrono::Utc;
use reelmark_common::{Error, ProfileId, DEFAULT_PROFILE_ID};
use reelmark_db::queries::auth_tokens;

use super::error::{ApiResult, AppError};
use super::AppContext;
use crate::db::with_conn;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "reelmark_session";

/// The profile a request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentProfile(pub ProfileId);

/// Pull the raw token from the request headers.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Authentication middleware for the `/api` routes.
///
/// On success, inserts [`CurrentProfile`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let profile_id = if ctx.config.server.auth.enabled {
        let token = extract_token(request.headers())
            .ok_or_else(|| Error::Unauthorized("authentication required".into()))?;
        let now = Utc::now();
        with_conn(&ctx.db_pool, move |conn| {
            auth_tokens::resolve_token(conn, &token, now)
        })
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid or expired token".into()))?
    } else {
        DEFAULT_PROFILE_ID
    };

    request.extensions_mut().insert(CurrentProfile(profile_id));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentProfile
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentProfile>()
            .copied()
            .ok_or_else(|| AppError(Error::Unauthorized("authentication required".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; reelmark_session=tok42".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok42"));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer first".parse().unwrap());
        headers.insert(header::COOKIE, "reelmark_session=second".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("first"));
    }

    #[test]
    fn no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(extract_token(&headers), None);
    }
}

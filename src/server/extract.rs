//! Request extractors with validation mapped onto [`Error::Validation`].

use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use reelmark_common::{Error, Result};
use serde::de::DeserializeOwned;

use super::error::AppError;

/// JSON body whose parse failures become 400 `{message, status}` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(AppError(Error::validation(rejection.body_text()))),
        }
    }
}

/// Parse an id taken from the URL path.
pub fn parse_path_id<T: FromStr>(raw: &str, entity: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::validation(format!("invalid {entity} id: {raw}")))
}

//! Error-to-HTTP response conversion.
//!
//! Handlers return [`ApiResult`]; failures render as the shared
//! `{"message": ..., "status": ...}` body.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use reelmark_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(pub Error);

pub type ApiResult<T> = std::result::Result<T, AppError>;

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }

        let body = json!({
            "message": self.0.to_string(),
            "status": status.as_u16(),
        });
        let mut response = (status, axum::Json(body)).into_response();

        if let Error::RangeNotSatisfiable { size, .. } = self.0 {
            if let Ok(v) = HeaderValue::from_str(&format!("bytes */{size}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, v);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_shape() {
        let response = AppError(Error::not_found("movie", "abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "movie not found: abc");
    }

    #[tokio::test]
    async fn missing_range_is_404() {
        let response = AppError(Error::MissingRange).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unsatisfiable_carries_content_range() {
        let response =
            AppError(Error::RangeNotSatisfiable { start: 10, size: 10 }).into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */10");
    }

    #[test]
    fn permission_and_validation() {
        assert_eq!(
            AppError(Error::permission_denied("x")).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError(Error::validation("x")).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}

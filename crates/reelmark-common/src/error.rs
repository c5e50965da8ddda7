//! Unified error type for reelmark.
//!
//! Every layer funnels its failures into [`Error`], which carries enough
//! context for the HTTP boundary to derive a status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in reelmark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested asset, profile or watch entry does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "movie", "profile").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A streaming request arrived without a `Range` header.
    #[error("Range header is required")]
    MissingRange,

    /// The requested range starts at or beyond the end of the file.
    #[error("Requested range not satisfiable: start {start} >= size {size}")]
    RangeNotSatisfiable {
        /// First byte requested by the client.
        start: u64,
        /// Current size of the file in bytes.
        size: u64,
    },

    /// The caller does not own the resource it tried to mutate.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The entry the caller tried to create already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            // Streaming endpoints refuse whole-file responses.
            Error::MissingRange => 404,
            Error::RangeNotSatisfiable { .. } => 416,
            Error::PermissionDenied(_) => 403,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Unauthorized(_) => 401,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Convenience constructor for [`Error::PermissionDenied`].
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Error::PermissionDenied(msg.into())
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Returns true if this is a [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("movie", "abc-123");
        assert_eq!(err.to_string(), "movie not found: abc-123");
        assert_eq!(err.http_status(), 404);
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_range_is_404() {
        let err = Error::MissingRange;
        assert_eq!(err.to_string(), "Range header is required");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn range_not_satisfiable_display() {
        let err = Error::RangeNotSatisfiable {
            start: 500,
            size: 100,
        };
        assert_eq!(
            err.to_string(),
            "Requested range not satisfiable: start 500 >= size 100"
        );
        assert_eq!(err.http_status(), 416);
    }

    #[test]
    fn permission_denied_display() {
        let err = Error::permission_denied("not the owner");
        assert_eq!(err.to_string(), "Permission denied: not the owner");
        assert_eq!(err.http_status(), 403);
    }

    #[test]
    fn validation_display() {
        let err = Error::validation("trackId exceeds duration");
        assert_eq!(err.to_string(), "Validation error: trackId exceeds duration");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn conflict_and_unauthorized() {
        assert_eq!(Error::Conflict("dup".into()).http_status(), 409);
        assert_eq!(Error::Unauthorized("no token".into()).http_status(), 401);
    }

    #[test]
    fn database_display() {
        let err = Error::database("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_not_found());
    }
}

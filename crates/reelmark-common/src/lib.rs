//! Reelmark-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across reelmark:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for profiles, movies, series and episodes
//! - **Core Types**: Video kinds and the playback offset type
//! - **Error Handling**: The unified error type and result alias
//!
//! # Examples
//!
//! ```
//! use reelmark_common::{Error, MovieId, Result, VideoKind};
//!
//! let movie_id = MovieId::new();
//! assert_eq!(VideoKind::Movie.as_str(), "movie");
//!
//! fn example(id: MovieId) -> Result<()> {
//!     Err(Error::not_found("movie", id))
//! }
//! assert!(example(movie_id).is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;

//! Database query modules.
//!
//! This module organizes all database operations into logical groups:
//! - profiles: Viewer profile CRUD
//! - auth_tokens: Opaque session tokens resolving to a profile
//! - videos: Movie/episode assets, preview images and view counters
//! - series: Series catalogue and episode ordering
//! - watching: Per-profile watch progress partial updates
//! - app_state: Process-wide key/value state

pub mod app_state;
pub mod auth_tokens;
pub mod profiles;
pub mod series;
pub mod videos;
pub mod watching;

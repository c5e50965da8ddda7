//! Reelmark-DB: Database schema, migrations, and query operations
//!
//! This crate provides database functionality for reelmark using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```
//! use reelmark_db::pool::{get_conn, init_memory_pool};
//! use reelmark_db::queries::profiles;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let profile = profiles::create_profile(&conn, "living room").unwrap();
//! assert_eq!(profile.name, "living room");
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

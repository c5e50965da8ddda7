//! Per-profile watch progress.
//!
//! [`WatchStore`] is the storage seam: targeted single-entry updates of one
//! profile's movies, series, active episode and watched-episode history.
//! [`ProgressRouter`] sits in front of it and turns playback events into
//! store operations with validation and precondition checks.

mod memory;
mod router;
mod sqlite;
mod store;

#[cfg(test)]
mod behaviour;

pub use memory::MemoryWatchStore;
pub use router::ProgressRouter;
pub use sqlite::SqliteWatchStore;
pub use store::{AddOutcome, WatchStore};

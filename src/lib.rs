//! Reelmark - byte-range video streaming with per-profile watch progress
//!
//! This library crate exposes the core functionality for integration testing.

pub mod assets;
pub mod config;
pub mod db;
pub mod jobs;
pub mod progress;
pub mod server;
pub mod streaming;

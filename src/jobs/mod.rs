//! Background tasks.

pub mod views;

pub use views::{Clock, ResetCheck, SystemClock, ViewsResetTask};

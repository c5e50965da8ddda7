//! Monthly views reset.
//!
//! Each video keeps a running `views_month` counter. Once per calendar month
//! (UTC) all counters go back to zero. The month of the last reset is kept in
//! `app_state`, so a restart neither skips nor repeats a reset.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reelmark_common::{Error, Result};
use reelmark_db::pool::DbPool;
use reelmark_db::queries::{app_state, videos};
use tokio::sync::mpsc;

use crate::db::with_conn;

/// `app_state` key holding the `YYYY-MM` of the last reset.
pub const LAST_RESET_KEY: &str = "views.last_reset_month";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCheck {
    /// First run; the current month was recorded without resetting.
    Initialized,
    /// Still the month of the last reset.
    UpToDate,
    /// The month changed; this many videos had their counter zeroed.
    Reset(usize),
}

pub struct ViewsResetTask {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl ViewsResetTask {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Compare the current month with the last reset and reset if needed.
    pub async fn check(&self) -> Result<ResetCheck> {
        let month = self.clock.now().format("%Y-%m").to_string();

        with_conn(&self.pool, move |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| Error::database(e.to_string()))?;

            let outcome = match app_state::get_value(&tx, LAST_RESET_KEY)? {
                Some(last) if last == month => return Ok(ResetCheck::UpToDate),
                None => ResetCheck::Initialized,
                Some(_) => ResetCheck::Reset(videos::reset_monthly_views(&tx)?),
            };
            app_state::set_value(&tx, LAST_RESET_KEY, &month)?;

            tx.commit().map_err(|e| Error::database(e.to_string()))?;
            Ok(outcome)
        })
        .await
    }

    /// Run [`check`](Self::check) every `interval` until `shutdown` fires.
    pub fn spawn(
        self,
        interval: Duration,
        mut shutdown: mpsc::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.check().await {
                            Ok(ResetCheck::Reset(n)) => {
                                tracing::info!(videos = n, "Monthly views reset");
                            }
                            Ok(ResetCheck::Initialized) => {
                                tracing::debug!("Views reset month initialized");
                            }
                            Ok(ResetCheck::UpToDate) => {}
                            Err(e) => tracing::warn!(error = %e, "Views reset check failed"),
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Views reset task stopping");
                        break;
                    }
                }
            }
        })
    }
}

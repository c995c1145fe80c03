//! Periodic rollover ticker.
//!
//! Runs [`chores::Board::check_rollover`] on a fixed interval so boundaries are
//! applied even when nobody is using the board.

use std::sync::Arc;
use std::time::Duration;

use chores::rollover::RolloverReport;
use tokio::task::JoinHandle;

use crate::state::AppState;

/// Runs one rollover check under the board lock.
///
/// Errors are logged; the ticker keeps running.
pub async fn tick(state: &AppState) -> Option<RolloverReport> {
    let mut board = state.board.lock().await;
    match board.check_rollover() {
        Ok(report) => {
            if report.changed() {
                tracing::info!(
                    daily = ?report.daily,
                    weekly = ?report.weekly,
                    monthly = ?report.monthly,
                    "period rollover applied"
                );
            } else if report.boundaries.any() {
                tracing::debug!(boundaries = ?report.boundaries, "boundary crossed, nothing to roll over");
            }
            Some(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "rollover check failed");
            None
        }
    }
}

/// Spawns the ticker. It runs until the returned handle is aborted or the
/// runtime shuts down.
pub fn spawn(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tick(&state).await;
        }
    })
}

//! Scheduled cleanup of expired revocation entries.

use crate::db::Database;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(e) => {
            error!(error = %e, "System clock is before the Unix epoch, skipping cleanup");
            return;
        }
    };

    match db.revoked_tokens().delete_expired(now).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired revoked tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up revoked tokens: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}

use crate::manager::PollManager;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::interval;

/// Periodically drop polls older than `max_age_hours`.
pub async fn cleanup_old_polls_task(manager: Arc<PollManager>, interval_secs: u64, max_age_hours: u64) {
    info!(
        "Starting background task to clean up polls older than {}h every {}s...",
        max_age_hours, interval_secs
    );
    // A zero period would panic inside tokio.
    let mut interval = interval(StdDuration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;
        match manager.cleanup(max_age_hours).await {
            Ok(0) => {}
            Ok(removed) => info!("Cleanup pass removed {} poll(s).", removed),
            Err(e) => error!("Failed to clean up old polls: {}", e),
        }
    }
}

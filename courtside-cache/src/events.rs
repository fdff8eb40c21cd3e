//! Push-event pump: drains a channel into cache reconciliation.

use crate::cache::Cache;
use courtside_transport::EventChannel;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs until the channel closes, routing every event into
/// [`Cache::handle_event`]. Spawn this once per connection:
///
/// ```ignore
/// tokio::spawn(run_event_pump(channel, Arc::clone(&cache)));
/// ```
pub async fn run_event_pump(mut channel: impl EventChannel, cache: Arc<Cache>) {
    info!("event pump started");
    while let Some(event) = channel.recv().await {
        debug!(?event, "push event received");
        cache.handle_event(&event).await;
    }
    info!("event channel closed, pump stopping");
}

//! The push-event channel contract.

use async_trait::async_trait;
use courtside_types::PushEvent;

/// A persistent connection delivering server-originated invalidation
/// events.
///
/// Delivery is best-effort: implementations are expected to reconnect
/// with backoff on their own, and the engine tolerates dropped or
/// duplicated events (every event is only a reload hint).
#[async_trait]
pub trait EventChannel: Send {
    /// Receives the next push event.
    /// Returns `None` when the channel has shut down for good.
    async fn recv(&mut self) -> Option<PushEvent>;
}

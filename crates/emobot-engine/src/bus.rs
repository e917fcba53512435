//! Telemetry fan-out.
//!
//! Every tick the engine publishes one [`TickTelemetry`] snapshot here.
//! Consumers (the CLI status line, a future dashboard) subscribe and read
//! at their own pace; a slow reader loses old snapshots instead of slowing
//! the tick loop, and having no readers at all is perfectly normal on a
//! headless robot.

use emobot_types::TickTelemetry;
use tokio::sync::broadcast;

/// Snapshots retained per subscriber before the oldest are overwritten.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct TelemetryBus {
    sender: broadcast::Sender<TickTelemetry>,
}

impl TelemetryBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish one snapshot. Returns how many subscribers received it;
    /// zero just means nobody is listening right now.
    pub fn publish(&self, snapshot: &TickTelemetry) -> usize {
        self.sender.send(snapshot.clone()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TickTelemetry> {
        self.sender.subscribe()
    }
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use emobot_types::{AttentionState, BreakerState, EmotionLabel};
    use tokio::sync::broadcast::error::RecvError;

    fn snapshot(level: f32) -> TickTelemetry {
        TickTelemetry {
            timestamp: Utc::now(),
            attention: AttentionState::Watching,
            dominant: EmotionLabel::Happy,
            confidence: 0.8,
            emotion_duration_ms: 1200,
            active: vec![EmotionLabel::Happy],
            interaction_level: level,
            engagement_target: 6.0,
            distance_band: None,
            following: None,
            search_pending: false,
            breaker: BreakerState::Healthy,
            last_action: None,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_snapshots() {
        let bus = TelemetryBus::default();
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(&snapshot(4.2)), 1);
        let received = rx.recv().await.expect("snapshot should arrive");
        assert!((received.interaction_level - 4.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let bus = TelemetryBus::default();
        assert_eq!(bus.publish(&snapshot(1.0)), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = TelemetryBus::new(4);
        let mut rx = bus.subscribe();

        for i in 0..10 {
            bus.publish(&snapshot(i as f32));
        }

        match rx.recv().await {
            Err(RecvError::Lagged(missed)) => assert_eq!(missed, 6),
            other => panic!("expected lag, got {other:?}"),
        }
    }
}

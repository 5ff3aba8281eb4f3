//! Outbound gate — minimum spacing between Slack calls.
//!
//! Slack enforces roughly one message per second per channel and answers
//! `ratelimited` above that. Every outbound call awaits the gate first;
//! the gate's clock persists across consumer iterations, so the spacing
//! also holds between events.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum interval between consecutive gated calls.
pub struct OutboundGate {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl OutboundGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// gated call, then stamp the clock. The first call passes
    /// immediately.
    pub async fn pace(&mut self) {
        if let Some(last) = self.last_call {
            let ready_at = last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tokio::time::sleep(ready_at - now).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_passes_immediately() {
        let mut gate = OutboundGate::new(Duration::from_secs(1));
        let start = Instant::now();
        gate.pace().await;
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_calls_are_spaced() {
        let mut gate = OutboundGate::new(Duration::from_secs(1));
        let start = Instant::now();
        gate.pace().await;
        gate.pace().await;
        gate.pace().await;
        assert!(Instant::now() - start >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_interval_is_not_re_awaited() {
        let mut gate = OutboundGate::new(Duration::from_secs(1));
        gate.pace().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        let before = Instant::now();
        gate.pace().await;
        assert_eq!(Instant::now() - before, Duration::ZERO);
    }
}

//! Liveness gate: pauses background polling when nobody is consuming
//!
//! Every statistics retrieval pushes the deadline out by the grace period.
//! Once wall-clock time passes the deadline the scheduler skips entire
//! iterations, so the cost of polling N devices is a function of observed
//! consumer demand, not a fixed always-on cadence.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Grace period after the last consumer poll before polling pauses
pub const DEFAULT_GRACE: Duration = Duration::from_secs(180);

pub struct LivenessGate {
    grace: Duration,
    deadline: Mutex<Instant>,
}

impl LivenessGate {
    /// Gate with a custom grace period (tests shrink this)
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            grace,
            // Armed at construction: a fresh monitor polls for one grace
            // period even before the first statistics call lands
            deadline: Mutex::new(Instant::now() + grace),
        }
    }

    pub fn new() -> Self {
        Self::with_grace(DEFAULT_GRACE)
    }

    /// Called by the statistics entry point on every invocation
    pub fn record_consumer_poll(&self) {
        *self.deadline.lock() = Instant::now() + self.grace;
    }

    /// True once the deadline has passed without a consumer poll
    pub fn is_paused(&self) -> bool {
        Instant::now() > *self.deadline.lock()
    }
}

impl Default for LivenessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_gate_starts_armed() {
        let gate = LivenessGate::with_grace(Duration::from_millis(100));
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_gate_pauses_after_grace_elapses() {
        let gate = LivenessGate::with_grace(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(60));
        assert!(gate.is_paused());
    }

    #[test]
    fn test_consumer_poll_resumes_polling() {
        let gate = LivenessGate::with_grace(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(60));
        assert!(gate.is_paused());

        gate.record_consumer_poll();
        assert!(!gate.is_paused());
    }
}

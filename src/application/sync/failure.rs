//! Consecutive-failure tracking for sync cycles.
//!
//! Converts a run of failed cycles into a decision to stop trusting delta
//! cursors. The tracker only counts; the caller resets cursors.

/// Counts consecutive sync failures against a threshold.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    threshold: u32,
    consecutive: u32,
}

impl FailureTracker {
    /// Create a tracker that escalates after `threshold` consecutive failures.
    ///
    /// A threshold of zero is treated as one.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
        }
    }

    /// Reset the counter after a successful cycle.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Count a failed cycle.
    ///
    /// Returns true when the threshold is reached, in which case the counter
    /// is reset and the caller must force a full resync.
    #[must_use = "a true result requires the caller to reset cursors"]
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        if self.consecutive >= self.threshold {
            self.consecutive = 0;
            return true;
        }
        false
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}

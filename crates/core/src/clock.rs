//! Wall-clock seam
//!
//! The controller never reads the system clock directly; it goes through
//! [`WallClock`] so tests and the simulator can control time. Cross-device
//! clock skew is not compensated: two devices whose clocks disagree by Δ
//! seconds will disagree on the target position by up to Δ. Deployments are
//! expected to keep device clocks NTP-synced.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "seconds since the Unix epoch".
pub trait WallClock: Send + Sync {
    /// Current wall-clock time in seconds since the Unix epoch.
    fn now_secs(&self) -> f64;
}

/// [`WallClock`] backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_secs(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }
}

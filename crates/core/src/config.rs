//! Controller configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tuning knobs for the drift-correction controller.
///
/// All fields default to values tuned for perceptual sync (tens of
/// milliseconds) on fixed-duration looping video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Drift below this magnitude (seconds) is negligible: no correction,
    /// and the rate is restored to nominal if it was altered.
    #[serde(default = "default_drift_ignore")]
    pub drift_ignore: f64,

    /// Drift at or above this magnitude (seconds) triggers a hard seek.
    /// Between `drift_ignore` and this, a proportional rate nudge is used.
    #[serde(default = "default_drift_seek")]
    pub drift_seek: f64,

    /// Proportional gain: the rate nudge is `1.0 + gain * drift` before
    /// clamping.
    #[serde(default = "default_gain")]
    pub gain: f64,

    /// Lower bound on the playback rate during gradual correction.
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,

    /// Upper bound on the playback rate during gradual correction.
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,

    /// Correction cycle interval in milliseconds. Must be short enough that
    /// drift accumulated between cycles stays inside the gradual band, and
    /// long enough to avoid perceptible rate thrashing.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Rate-write deadband: the rate is only written when the change exceeds
    /// this, avoiding redundant writes that micro-stutter some renderers.
    #[serde(default = "default_rate_epsilon")]
    pub rate_epsilon: f64,
}

fn default_drift_ignore() -> f64 {
    0.05
}

fn default_drift_seek() -> f64 {
    0.3
}

fn default_gain() -> f64 {
    0.4
}

fn default_min_rate() -> f64 {
    0.97
}

fn default_max_rate() -> f64 {
    1.03
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_rate_epsilon() -> f64 {
    0.001
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_ignore: default_drift_ignore(),
            drift_seek: default_drift_seek(),
            gain: default_gain(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
            interval_ms: default_interval_ms(),
            rate_epsilon: default_rate_epsilon(),
        }
    }
}

impl SyncConfig {
    /// Correction cycle interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validate the configuration. Called once at attach time; the periodic
    /// path never re-validates.
    pub fn validate(&self) -> Result<()> {
        if !self.drift_ignore.is_finite() || self.drift_ignore < 0.0 {
            return Err(Error::Config(format!(
                "drift_ignore must be finite and non-negative, got {}",
                self.drift_ignore
            )));
        }
        if !self.drift_seek.is_finite() || self.drift_seek <= self.drift_ignore {
            return Err(Error::Config(format!(
                "drift_seek ({}) must exceed drift_ignore ({})",
                self.drift_seek, self.drift_ignore
            )));
        }
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err(Error::Config(format!(
                "gain must be finite and positive, got {}",
                self.gain
            )));
        }
        if !(self.min_rate.is_finite() && self.max_rate.is_finite())
            || self.min_rate > 1.0
            || self.max_rate < 1.0
            || self.min_rate >= self.max_rate
        {
            return Err(Error::Config(format!(
                "rate bounds [{}, {}] must bracket the nominal rate 1.0",
                self.min_rate, self.max_rate
            )));
        }
        if self.interval_ms == 0 {
            return Err(Error::Config("interval_ms must be non-zero".to_string()));
        }
        if !self.rate_epsilon.is_finite() || self.rate_epsilon < 0.0 {
            return Err(Error::Config(format!(
                "rate_epsilon must be finite and non-negative, got {}",
                self.rate_epsilon
            )));
        }
        Ok(())
    }
}

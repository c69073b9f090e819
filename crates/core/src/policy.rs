//! Three-band correction policy
//!
//! Pure dispatch from measured drift to a corrective action. A pure
//! proportional strategy converges slowly from large errors and never fully
//! clears residue at the band edge; a pure seek strategy stutters visibly
//! whenever sustained small drift crosses its threshold. The shipped policy
//! is the hybrid: negligible drift does nothing, moderate drift nudges the
//! playback rate proportionally, large drift pays one visible seek for
//! guaranteed bounded error.

use crate::config::SyncConfig;

/// Nominal playback rate.
pub const NOMINAL_RATE: f64 = 1.0;

/// Corrective action chosen for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Nothing to do this cycle.
    None,
    /// Drift is negligible but the rate was left altered; restore nominal.
    ResetRate,
    /// Gradual correction: write this playback rate.
    Rate(f64),
    /// Hard reposition to the current target.
    Seek,
}

/// Dispatch `drift` (seconds, positive = behind target) against the two
/// thresholds. The hard threshold is a closed boundary: drift of exactly
/// `drift_seek` repositions.
///
/// Caller guarantees `drift` is finite and the config validated.
pub fn plan(drift: f64, current_rate: f64, config: &SyncConfig) -> Correction {
    let magnitude = drift.abs();

    if magnitude < config.drift_ignore {
        if (current_rate - NOMINAL_RATE).abs() > f64::EPSILON {
            return Correction::ResetRate;
        }
        return Correction::None;
    }

    if magnitude >= config.drift_seek {
        return Correction::Seek;
    }

    // Behind target (positive drift) speeds up, ahead slows down.
    let rate = (NOMINAL_RATE + config.gain * drift).clamp(config.min_rate, config.max_rate);
    if (rate - current_rate).abs() < config.rate_epsilon {
        // Write deadband: skip redundant rate writes.
        return Correction::None;
    }
    Correction::Rate(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negligible_drift_does_nothing_at_nominal_rate() {
        let config = SyncConfig::default();
        assert_eq!(plan(0.0, NOMINAL_RATE, &config), Correction::None);
        assert_eq!(plan(0.049, NOMINAL_RATE, &config), Correction::None);
        assert_eq!(plan(-0.049, NOMINAL_RATE, &config), Correction::None);
    }

    #[test]
    fn negligible_drift_restores_altered_rate() {
        let config = SyncConfig::default();
        assert_eq!(plan(0.01, 1.03, &config), Correction::ResetRate);
        assert_eq!(plan(-0.01, 0.97, &config), Correction::ResetRate);
    }

    #[test]
    fn gradual_band_is_proportional_and_clamped() {
        let config = SyncConfig::default();
        // 0.1s behind: 1.0 + 0.4 * 0.1 = 1.04, clamped to 1.03.
        assert_eq!(plan(0.1, NOMINAL_RATE, &config), Correction::Rate(1.03));
        // 0.06s behind: 1.024, inside the bounds.
        match plan(0.06, NOMINAL_RATE, &config) {
            Correction::Rate(rate) => assert!((rate - 1.024).abs() < 1e-12),
            other => panic!("expected rate nudge, got {other:?}"),
        }
        // Ahead of target slows down.
        assert_eq!(plan(-0.2, NOMINAL_RATE, &config), Correction::Rate(0.97));
    }

    #[test]
    fn rate_write_deadband_suppresses_redundant_writes() {
        let config = SyncConfig::default();
        // Rate already at the value the drift calls for: no write.
        assert_eq!(plan(0.1, 1.03, &config), Correction::None);
        // Change below rate_epsilon: no write.
        match plan(0.06, 1.0240005, &config) {
            Correction::None => {}
            other => panic!("expected deadband suppression, got {other:?}"),
        }
    }

    #[test]
    fn hard_threshold_is_a_closed_boundary() {
        let config = SyncConfig::default();
        assert_eq!(plan(0.3, NOMINAL_RATE, &config), Correction::Seek);
        assert_eq!(plan(-0.3, NOMINAL_RATE, &config), Correction::Seek);
        assert_eq!(plan(2.0, 1.03, &config), Correction::Seek);
    }

    #[test]
    fn deadband_is_idempotent_over_repeated_cycles() {
        let config = SyncConfig::default();
        let mut rate = NOMINAL_RATE;
        for _ in 0..50 {
            match plan(0.03, rate, &config) {
                Correction::None => {}
                Correction::ResetRate => rate = NOMINAL_RATE,
                other => panic!("drift below ignore must not correct, got {other:?}"),
            }
        }
        assert_eq!(rate, NOMINAL_RATE);
    }

    #[test]
    fn gradual_band_converges_monotonically() {
        // Model one cycle of real playback: both the clock and the player
        // advance for `interval` seconds, so drift closes by
        // (rate - 1) * interval per cycle. With no further clock error
        // injected, |drift| must strictly shrink until it falls below the
        // ignore threshold.
        let config = SyncConfig::default();
        let interval = config.interval_ms as f64 / 1000.0;
        let mut drift: f64 = 0.25;
        let mut rate = NOMINAL_RATE;
        let mut cycles = 0;
        while drift.abs() >= config.drift_ignore {
            match plan(drift, rate, &config) {
                Correction::Rate(next) => rate = next,
                Correction::ResetRate => rate = NOMINAL_RATE,
                Correction::None => {}
                Correction::Seek => panic!("gradual band must never seek"),
            }
            let next_drift = drift - (rate - NOMINAL_RATE) * interval;
            assert!(
                next_drift.abs() < drift.abs(),
                "cycle {cycles}: |drift| grew from {drift} to {next_drift}"
            );
            drift = next_drift;
            cycles += 1;
            assert!(cycles < 100, "did not converge");
        }
        // Once negligible, the rate is restored and stays there.
        assert_eq!(plan(drift, rate, &config), Correction::ResetRate);
        assert_eq!(plan(drift, NOMINAL_RATE, &config), Correction::None);
    }
}

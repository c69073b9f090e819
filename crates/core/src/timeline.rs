//! Clock-to-position mapping
//!
//! Pure functions over a looping timeline. Given a video duration, the
//! globally-correct playback position for "now" is `now mod duration`: every
//! device that agrees on the wall clock agrees on the position, with no
//! coordination. Drift is the signed gap between that target and the actual
//! position, wrapped to the shortest path around the loop.
//!
//! Callers guarantee `duration` is finite and positive; every entry point in
//! the controller guards before calling in here.

/// Playback position the media should currently be at, in `[0, duration)`.
pub fn target_position(now_secs: f64, duration: f64) -> f64 {
    debug_assert!(duration > 0.0 && duration.is_finite());
    now_secs.rem_euclid(duration)
}

/// Signed drift between the wall-clock target and `actual`, wrap-adjusted
/// into `(-duration/2, duration/2]`.
///
/// Positive drift means playback is behind the target (speed up to close);
/// negative means ahead. Wrapping guarantees correction takes the shortest
/// path around the loop: with a 10s loop, target 1s and actual 9s is a +2s
/// nudge forward, not an 8s rewind.
pub fn drift(now_secs: f64, actual: f64, duration: f64) -> f64 {
    let half = duration / 2.0;
    let mut gap = target_position(now_secs, duration) - actual;
    if gap > half {
        gap -= duration;
    } else if gap <= -half {
        gap += duration;
    }
    gap
}

/// Seconds until the next wall-clock loop boundary.
pub fn secs_until_boundary(now_secs: f64, duration: f64) -> f64 {
    duration - target_position(now_secs, duration)
}

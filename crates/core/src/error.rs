//! Error types for LoopSync

use thiserror::Error;

/// Result type alias for LoopSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in LoopSync
///
/// Only `Config` is ever surfaced to the caller (rejected at attach time).
/// Everything the playback element reports on the periodic path is absorbed
/// by the controller and logged; a failed cycle degrades to "try again next
/// cycle".
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Playback element error
    #[error("Playback error: {0}")]
    Playback(String),

    /// Repositioning failed
    #[error("Seek to {position}s failed: {reason}")]
    Seek {
        /// Requested position in seconds
        position: f64,
        /// Failure reason reported by the element
        reason: String,
    },

    /// The environment refused to start playback (autoplay policy).
    /// Starting muted/inline is the caller's responsibility; the controller
    /// swallows this and leaves the element paused.
    #[error("Autoplay blocked: playback requires a muted start or user gesture")]
    AutoplayBlocked,
}

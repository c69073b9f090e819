//! Environment visibility signal
//!
//! "Became hidden" / "became visible" notifications from the hosting
//! context, carried on a watch channel. Used only by the controller's
//! suspended-state transitions: while hidden, drift is irrelevant and the
//! controller withholds all corrective action.

use tokio::sync::watch;

/// Whether the hosting context is visible to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Context is visible; normal correction applies.
    #[default]
    Visible,
    /// Context is hidden; the session suspends.
    Hidden,
}

/// Create a visibility channel seeded with `initial`. The sender side is
/// driven by the environment integration; the receiver is handed to
/// [`crate::SyncController::attach`].
pub fn channel(initial: Visibility) -> (watch::Sender<Visibility>, watch::Receiver<Visibility>) {
    watch::channel(initial)
}

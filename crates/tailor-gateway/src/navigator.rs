//! Navigation escape hatch for unrecoverable session expiry

use tracing::warn;

/// Host-provided navigation. Called once per failed refresh episode, after
/// the stored session has been purged.
pub trait Navigator: Send + Sync {
    /// Send the user back to the unauthenticated entry point of the app.
    fn redirect_to_entry(&self);
}

/// Navigator for headless hosts: only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_entry(&self) {
        warn!("session expired, sign in again to continue");
    }
}

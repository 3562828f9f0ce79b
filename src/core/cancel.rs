//! Cooperative cancellation shared between the streaming loop and an
//! interrupt source such as a Ctrl+C handler.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Per-turn cancellation flag.
///
/// Cloning yields another handle to the same flag, so one clone can live in a
/// signal handler for the whole process while the engine re-arms it at the
/// start of every turn. The streaming loop only ever holds the turn's own
/// [`CancellationToken`], which it polls without locking.
#[derive(Clone, Debug, Default)]
pub struct CancellationController {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a fresh, unset flag for a new turn and returns the token the
    /// turn should observe. Earlier tokens keep whatever state they had, so
    /// a late request can never leak into the new turn.
    pub fn reset(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.lock() = token.clone();
        token
    }

    /// Requests cancellation of the current turn. Returns `true` only for
    /// the call that actually set the flag.
    pub fn request(&self) -> bool {
        let token = self.lock().clone();
        if token.is_cancelled() {
            return false;
        }
        token.cancel();
        debug!("cancellation requested");
        true
    }

    pub fn is_requested(&self) -> bool {
        self.lock().is_cancelled()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_idempotent() {
        let controller = CancellationController::new();
        let token = controller.reset();

        assert!(controller.request());
        assert!(!controller.request());
        assert!(token.is_cancelled());
        assert!(controller.is_requested());
    }

    #[test]
    fn reset_starts_each_turn_unset() {
        let controller = CancellationController::new();
        let first = controller.reset();
        controller.request();

        let second = controller.reset();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!controller.is_requested());
    }

    #[test]
    fn clones_share_the_flag() {
        let controller = CancellationController::new();
        let handler_side = controller.clone();
        let token = controller.reset();

        handler_side.request();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn request_from_another_thread_wakes_waiter() {
        let controller = CancellationController::new();
        let token = controller.reset();
        let remote = controller.clone();

        std::thread::spawn(move || {
            remote.request();
        });

        tokio::time::timeout(std::time::Duration::from_secs(5), token.cancelled())
            .await
            .expect("token should be cancelled");
    }
}

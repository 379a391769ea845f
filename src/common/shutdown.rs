//! One-shot shutdown signal shared between the engine and running executions.

use std::future::Future;

use tokio::sync::watch;

/// A latch that flips once and wakes every waiter.
///
/// Waiting futures are `'static` so they can be raced against a traversal
/// inside `tokio::select!` without borrowing the owner.
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender,
        }
    }

    /// Trigger the signal. Calling it again is a no-op.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_terminated(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `shutdown` has been called.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            // the sender lives as long as the owner; a closed channel also means shut down
            let _ = receiver.wait_for(|terminated| *terminated).await;
        }
    }
}

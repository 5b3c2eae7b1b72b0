//! Cooperative cancellation of running invocations

use async_channel::{Receiver, Sender};

/// A clonable flag that, once raised, stops the invocations watching it
///
/// Built on channel closure: no message is ever sent, closing the channel
/// wakes every waiter at once and stays observable afterwards.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Sender<()>,
    receiver: Receiver<()>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::bounded(1);
        Self { sender, receiver }
    }

    /// Cancel every invocation watching this token. Idempotent.
    pub fn cancel(&self) {
        self.sender.close();
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        // Nothing is ever sent, so this only returns on close
        let _ = self.receiver.recv().await;
    }
}

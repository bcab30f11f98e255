use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{Error, Result};

/// Shutdown signal shared between tasks.
///
/// Every clone holds its own receiver, so any number of tasks can wait on
/// the same signal. Clones created after the signal was sent still observe
/// it.
pub struct Shutdown {
    sender: broadcast::Sender<()>,
    receiver: broadcast::Receiver<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = broadcast::channel(1);
        Self {
            sender,
            receiver,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Broadcasts the shutdown signal to all clones.
    pub fn shutdown(&self) -> Result<()> {
        self.triggered.store(true, Ordering::SeqCst);
        // no active receivers is not an error, everyone is gone already
        let _ = self.sender.send(());
        Ok(())
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Waits until the shutdown signal is sent.
    pub async fn recv(&mut self) -> Result<()> {
        if self.is_triggered() {
            return Ok(());
        }
        match self.receiver.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => Ok(()),
            Err(broadcast::error::RecvError::Closed) => {
                Err(Error::Other("shutdown sender dropped".to_string()))
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Shutdown {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.sender.subscribe(),
            triggered: self.triggered.clone(),
        }
    }
}

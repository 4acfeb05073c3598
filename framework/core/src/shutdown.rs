use std::sync::Arc;

use tokio::sync::watch::{Receiver, Sender};

/// Signals that a sweep should stop at the next opportunity.
///
/// The flag is latched, once shutdown has been requested every listener keeps observing it.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<Sender<bool>>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(tokio::sync::watch::channel(false).0),
        }
    }

    pub fn shutdown(&self) {
        // send_replace never fails, even with no listeners left.
        if !self.sender.send_replace(true) {
            log::debug!("Shutdown requested");
        }
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownListener {
    receiver: Receiver<bool>,
}

impl ShutdownListener {
    /// Point in time check of the shutdown flag.
    pub fn should_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until shutdown is requested. Safe to race against other work so that the work is
    /// cancelled when the user interrupts the run.
    pub async fn wait_for_shutdown(&mut self) {
        if self.receiver.wait_for(|requested| *requested).await.is_err() {
            // The handle is gone so nobody can request a shutdown any more.
            std::future::pending::<()>().await;
        }
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Sweep interrupted by shutdown signal".to_string(),
        }
    }
}

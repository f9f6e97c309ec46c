use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Persistence mode, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// JSON file on local disk, shared by every process on the machine
    Local,
    /// Hosted table reachable over the network
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Remote => write!(f, "backend"),
        }
    }
}

/// One row of the hosted `properties` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRow {
    pub id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Notifications about changes made by another process or client.
///
/// Dropping the feed stops the background listener.
pub struct ChangeFeed {
    receiver: Option<mpsc::Receiver<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    /// A feed that never fires, for backends without an external channel.
    pub fn disabled() -> Self {
        Self {
            receiver: None,
            task: None,
        }
    }

    /// Run `listener` in the background; it signals changes through the sender
    /// it is given and should return once that sender is closed.
    pub fn spawn<F, Fut>(listener: F) -> Self
    where
        F: FnOnce(mpsc::Sender<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(listener(tx));
        Self {
            receiver: Some(rx),
            task: Some(task),
        }
    }

    /// Wait for the next change. `None` once the feed is closed or disabled.
    pub async fn next_change(&mut self) -> Option<()> {
        match self.receiver.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

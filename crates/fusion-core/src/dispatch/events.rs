//! Per-call message channel and the cancellation signal shared by a run.
//!
//! Every dispatched call reports `Started`, any number of `Progress` updates
//! and exactly one `Finished` on an unbounded mpsc channel drained by the
//! dispatcher. Cancellation travels the other way on a `watch` channel.

use tokio::sync::{mpsc, watch};

use crate::domain::{DispatchResult, RawReading};

/// Lifecycle events of a single agent call.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Started {
        agent_id: String,
    },
    Progress {
        agent_id: String,
        message: String,
    },
    Finished {
        agent_id: String,
        result: DispatchResult<RawReading>,
    },
}

/// Handed to a transport so streaming agents can surface progress updates.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    agent_id: String,
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl ProgressSink {
    pub fn new(agent_id: impl Into<String>, tx: mpsc::UnboundedSender<TaskEvent>) -> Self {
        Self {
            agent_id: agent_id.into(),
            tx,
        }
    }

    /// A sink whose messages go nowhere, for calls made outside a dispatch.
    pub fn detached(agent_id: impl Into<String>) -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self::new(agent_id, tx)
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn report(&self, message: impl Into<String>) {
        // The dispatcher may already have stopped listening after a cancel.
        let _ = self.tx.send(TaskEvent::Progress {
            agent_id: self.agent_id.clone(),
            message: message.into(),
        });
    }
}

/// Owner side of a run's cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side of a run's cancellation signal; cheap to clone into calls.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled; pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

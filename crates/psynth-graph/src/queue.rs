//! Strictly ordered, single-flight dispatch of remote commands.
//!
//! One queue belongs to one graph. Commands are sent in the order they were
//! enqueued and the next command is not sent until the previous response
//! (success, failure sentinel or transport error) has arrived. There are no
//! retries, timeouts or cancellation: a transport call that never returns
//! stalls the queue.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use psynth_core::wire::is_failure;
use psynth_core::{Command, GraphIdentity};

use crate::error::{GraphError, Result};
use crate::transport::Transport;

/// Handler run with the parsed response of a successful command.
pub type Completion = Box<dyn FnOnce(Value) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing in flight and nothing pending.
    Idle,
    /// A drain task is sending commands.
    Draining,
}

struct Pending {
    command: Command,
    completion: Option<Completion>,
}

struct Inner {
    pending: VecDeque<Pending>,
    state: QueueState,
}

struct Shared {
    transport: Arc<dyn Transport>,
    identity: GraphIdentity,
    inner: Mutex<Inner>,
    idle: Notify,
}

/// FIFO dispatcher of one graph's remote commands.
///
/// Clone is cheap; clones share the same queue.
#[derive(Clone)]
pub struct RequestQueue {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl RequestQueue {
    /// Create an idle queue. Must be called from within a tokio runtime,
    /// which is where the drain task will run.
    pub fn new(transport: Arc<dyn Transport>, identity: GraphIdentity) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| GraphError::NoRuntime)?;
        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                identity,
                inner: Mutex::new(Inner {
                    pending: VecDeque::new(),
                    state: QueueState::Idle,
                }),
                idle: Notify::new(),
            }),
            runtime,
        })
    }

    /// Append a command. Starts draining if the queue was idle; otherwise the
    /// command waits behind those already queued.
    pub fn enqueue(&self, command: Command, completion: Option<Completion>) {
        let start = {
            let mut inner = self.shared.inner.lock();
            inner.pending.push_back(Pending {
                command,
                completion,
            });
            if inner.state == QueueState::Idle {
                inner.state = QueueState::Draining;
                true
            } else {
                false
            }
        };

        if start {
            tracing::trace!(filename = %self.shared.identity.filename, "Request queue draining");
            self.runtime.spawn(drain(self.shared.clone()));
        }
    }

    pub fn state(&self) -> QueueState {
        self.shared.inner.lock().state
    }

    /// Commands waiting to be sent, excluding the one in flight.
    pub fn pending(&self) -> usize {
        self.shared.inner.lock().pending.len()
    }

    pub fn identity(&self) -> &GraphIdentity {
        &self.shared.identity
    }

    /// Resolve once the queue is idle with nothing pending.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.state() == QueueState::Idle {
                return;
            }
            notified.await;
        }
    }
}

/// Send pending commands one at a time until none remain.
async fn drain(shared: Arc<Shared>) {
    loop {
        let next = {
            let mut inner = shared.inner.lock();
            let next = inner.pending.pop_front();
            if next.is_none() {
                inner.state = QueueState::Idle;
            }
            next
        };

        let Some(pending) = next else {
            shared.idle.notify_waiters();
            tracing::trace!(filename = %shared.identity.filename, "Request queue idle");
            return;
        };

        dispatch(&shared, pending).await;
    }
}

/// Send one command and route its response.
async fn dispatch(shared: &Shared, pending: Pending) {
    let query = pending.command.query();
    let document = match pending.command.to_document(&shared.identity) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(query, error = %e, "Could not build request document, command dropped");
            return;
        }
    };

    match shared.transport.send(document).await {
        Ok(response) if is_failure(&response) => {
            tracing::warn!(query, "Remote command failed");
        }
        Ok(response) => {
            tracing::debug!(query, "Remote command succeeded");
            if let Some(completion) = pending.completion {
                if catch_unwind(AssertUnwindSafe(|| completion(response))).is_err() {
                    tracing::error!(query, "Completion handler panicked");
                }
            }
        }
        Err(e) => {
            tracing::error!(query, error = %e, "Transport error, command dropped");
        }
    }
}

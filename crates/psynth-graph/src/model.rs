//! The local graph model and its shared state.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use psynth_core::{Command, Detail, GraphIdentity, Link, LinkType, Node, ServerConfig};

use crate::collection::Collection;
use crate::error::Result;
use crate::queue::{Completion, RequestQueue};
use crate::transport::Transport;

/// Everything the graph knows locally. Shared with queued completion
/// handlers so that responses can update positions and names.
#[derive(Debug, Default)]
pub(crate) struct GraphState {
    pub nodes: Collection<Node>,
    pub links: Collection<Link>,
    pub link_types: Collection<LinkType>,
    pub details: Collection<Detail>,
}

/// How a mutation reaches the server.
///
/// The default queues the matching command with no completion handler.
pub struct Dispatch {
    pub(crate) sync: bool,
    pub(crate) completion: Option<Completion>,
}

impl Default for Dispatch {
    fn default() -> Self {
        Self {
            sync: true,
            completion: None,
        }
    }
}

impl Dispatch {
    /// Queue the command and run `completion` with its response.
    pub fn then(completion: impl FnOnce(Value) + Send + 'static) -> Self {
        Self {
            sync: true,
            completion: Some(Box::new(completion)),
        }
    }

    /// Change local state only; queue nothing.
    pub fn local() -> Self {
        Self {
            sync: false,
            completion: None,
        }
    }
}

/// Local mirror of one remote graph.
///
/// Mutations update local state synchronously and return immediately; the
/// matching remote commands are sent later, strictly in issue order, by the
/// graph's [`RequestQueue`]. Remote failures are logged and never rolled back
/// locally. Clone is cheap; clones share state and queue.
#[derive(Clone)]
pub struct Graph {
    pub(crate) name: Arc<RwLock<String>>,
    pub(crate) base_url: String,
    pub(crate) state: Arc<RwLock<GraphState>>,
    pub(crate) queue: RequestQueue,
}

impl Graph {
    /// An empty graph bound to `filename` on the configured server.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: &ServerConfig,
        name: impl Into<String>,
        filename: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let identity = GraphIdentity::new(&config.user, &config.password, filename);
        Ok(Self {
            name: Arc::new(RwLock::new(name.into())),
            base_url: config.base_url(),
            state: Arc::new(RwLock::new(GraphState::default())),
            queue: RequestQueue::new(transport, identity)?,
        })
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// Server-assigned filename, e.g. `b8e1241a-....gt`.
    pub fn filename(&self) -> &str {
        &self.queue.identity().filename
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Queue an arbitrary command behind everything already queued.
    pub fn queue(&self, command: Command, completion: Option<Completion>) {
        self.queue.enqueue(command, completion);
    }

    /// Resolve once every queued command has been answered.
    pub async fn settle(&self) {
        self.queue.wait_idle().await;
    }

    pub(crate) fn dispatch(&self, command: Command, dispatch: Dispatch) {
        if dispatch.sync {
            self.queue.enqueue(command, dispatch.completion);
        }
    }
}

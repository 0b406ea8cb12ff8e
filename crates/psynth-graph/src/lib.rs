//! psynth-graph: local mirror of a Psynth graph with an ordered remote command queue.
//!
//! Every mutation is applied to the local [`Graph`] immediately and then
//! queued for the server. The [`RequestQueue`] sends one command at a time,
//! in the order they were issued, and hands each successful response to the
//! command's completion handler.

pub mod bootstrap;
pub mod collection;
pub mod error;
pub mod layout;
pub mod model;
pub mod mutations;
pub mod queries;
pub mod queue;
pub mod transport;

pub use bootstrap::{create_graph, load_graph};
pub use error::{GraphError, ReferentialError, Result};
pub use model::{Dispatch, Graph};
pub use queries::Anchor;
pub use queue::{Completion, QueueState, RequestQueue};
pub use transport::{HttpTransport, Transport, TransportError};

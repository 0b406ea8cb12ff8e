//! One-shot exchanges that produce a ready [`Graph`].
//!
//! These bypass the request queue: each sends a single request and builds
//! the graph from the answer.

use std::sync::Arc;

use psynth_core::param;
use psynth_core::wire::{is_failure, parse_response, CreatedGraph, GraphSnapshot};
use psynth_core::{Command, GraphIdentity, ServerConfig};

use crate::error::{GraphError, Result};
use crate::model::{Dispatch, Graph};
use crate::transport::Transport;

/// Create a new, empty graph on the server and return its local mirror.
pub async fn create_graph(
    config: &ServerConfig,
    name: &str,
    transport: Arc<dyn Transport>,
) -> Result<Graph> {
    let command = Command::CreateGraph {
        user: config.user.clone(),
        password: config.password.clone(),
        name: name.to_string(),
    };
    let query = command.query();
    let request = serde_json::to_value(&command).map_err(psynth_core::CoreError::from)?;

    let response = transport.provision(request).await?;
    if is_failure(&response) {
        return Err(GraphError::RemoteFailure {
            query: query.to_string(),
        });
    }
    let created: CreatedGraph = parse_response(query, response)?;

    tracing::info!(name, filename = %created.filename, "Graph created");
    Graph::new(config, name, created.filename, transport)
}

/// Fetch a whole graph from the server and return its local mirror.
///
/// Entities are registered locally only; nothing is sent back. Links and
/// details whose references are missing from the snapshot are skipped.
pub async fn load_graph(
    config: &ServerConfig,
    filename: &str,
    transport: Arc<dyn Transport>,
) -> Result<Graph> {
    let identity = GraphIdentity::new(&config.user, &config.password, filename);
    let command = Command::LoadGraph;
    let request = command.to_document(&identity)?;

    let response = transport.send(request).await?;
    if is_failure(&response) {
        return Err(GraphError::RemoteFailure {
            query: command.query().to_string(),
        });
    }
    let snapshot: GraphSnapshot = parse_response(command.query(), response)?;

    let name = param::text(&snapshot.name, "");
    let graph = Graph::new(config, name, filename, transport)?;
    restore(&graph, snapshot);

    tracing::info!(
        filename,
        nodes = graph.node_list().len(),
        links = graph.link_list().len(),
        details = graph.detail_list().len(),
        "Graph loaded"
    );
    Ok(graph)
}

/// Register a snapshot's entities in dependency order: link types, nodes,
/// links, details.
fn restore(graph: &Graph, snapshot: GraphSnapshot) {
    for link_type in snapshot.rel_types {
        graph.add_link_type_with(link_type, Dispatch::local());
    }
    for node in snapshot.nodes {
        graph.add_node_with(node, Dispatch::local());
    }
    for link in snapshot.rels {
        if let Err(e) = graph.add_link_with(link, Dispatch::local()) {
            tracing::warn!(error = %e, "Skipping link with unresolved reference");
        }
    }
    for detail in snapshot.details {
        if let Err(e) = graph.add_detail_with(detail, Dispatch::local()) {
            tracing::warn!(error = %e, "Skipping detail with unresolved anchor");
        }
    }
}

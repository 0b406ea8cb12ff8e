//! Node extents, server-side layout and publishing.

use serde_json::Value;

use psynth_core::codec::decode;
use psynth_core::wire::LayoutResponse;
use psynth_core::{Command, Node};

use crate::error::{GraphError, Result};
use crate::model::{Graph, GraphState};
use crate::queue::Completion;

/// Offset added to the top-left corner sent with `publish`.
const PUBLISH_MARGIN: f64 = 0.1;
/// Height in pixels the published view is scaled to.
const PUBLISH_HEIGHT: f64 = 1080.0;

impl Graph {
    // ── Extents ──────────────────────────────────────────────────
    //
    // All extents are `None` for a graph without nodes.

    pub fn min_x(&self) -> Option<f64> {
        extent(&self.state.read(), |n| n.x, |a, b| a < b)
    }

    pub fn max_x(&self) -> Option<f64> {
        extent(&self.state.read(), |n| n.x, |a, b| a > b)
    }

    pub fn min_y(&self) -> Option<f64> {
        extent(&self.state.read(), |n| n.y, |a, b| a < b)
    }

    pub fn max_y(&self) -> Option<f64> {
        extent(&self.state.read(), |n| n.y, |a, b| a > b)
    }

    pub fn width(&self) -> Option<f64> {
        Some(self.max_x()? - self.min_x()?)
    }

    pub fn height(&self) -> Option<f64> {
        Some(self.max_y()? - self.min_y()?)
    }

    // ── Layout ───────────────────────────────────────────────────

    /// Queue `drawgraph`. When the server answers, every node and detail it
    /// names is moved to the returned position; everything else stays put.
    /// Malformed placements are skipped individually.
    /// `completion` then runs with the raw response.
    pub fn draw(&self, completion: Option<Completion>) {
        let state = self.state.clone();
        let handler = move |response: Value| {
            if response.is_object() {
                let layout = LayoutResponse::from_response(&response);
                apply_layout(&mut state.write(), &layout);
            } else {
                tracing::warn!(response = %response, "Ignoring layout response");
            }
            if let Some(completion) = completion {
                completion(response);
            }
        };
        self.queue.enqueue(Command::Draw, Some(Box::new(handler)));
    }

    /// Queue `publish` with the graph's top-left corner and a scale that fits
    /// its height to 1080 pixels. When the server answers, the public URL is
    /// logged and passed to `completion` as a JSON string.
    ///
    /// Fails without queuing anything if the graph has no nodes.
    pub fn publish(&self, completion: Option<Completion>) -> Result<()> {
        let (x, y, height) = {
            let state = self.state.read();
            let min_x = extent(&state, |n| n.x, |a, b| a < b).ok_or(GraphError::EmptyGraph)?;
            let min_y = extent(&state, |n| n.y, |a, b| a < b).ok_or(GraphError::EmptyGraph)?;
            let max_y = extent(&state, |n| n.y, |a, b| a > b).ok_or(GraphError::EmptyGraph)?;
            (min_x, min_y, max_y - min_y)
        };

        let base_url = self.base_url.clone();
        let handler = move |response: Value| {
            let token = match &response {
                Value::String(token) => token.clone(),
                other => other.to_string(),
            };
            let url = format!("{base_url}p/ublic/{}", decode(&token));
            tracing::info!(url = %url, "Graph published");
            if let Some(completion) = completion {
                completion(Value::String(url));
            }
        };

        self.queue.enqueue(
            Command::Publish {
                x: x + PUBLISH_MARGIN,
                y: y + PUBLISH_MARGIN,
                scale: PUBLISH_HEIGHT / height,
            },
            Some(Box::new(handler)),
        );
        Ok(())
    }
}

/// Fold node coordinates, keeping the first value unless `better` prefers a
/// later one.
fn extent(
    state: &GraphState,
    coordinate: impl Fn(&Node) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<f64> {
    state.nodes.iter().map(coordinate).fold(None, |acc, v| match acc {
        Some(current) if !better(v, current) => Some(current),
        _ => Some(v),
    })
}

fn apply_layout(state: &mut GraphState, layout: &LayoutResponse) {
    let mut moved = 0usize;
    for placement in &layout.nodes {
        match state.nodes.get_mut(&placement.uid) {
            Some(node) => {
                node.x = placement.x.to_number();
                node.y = placement.y.to_number();
                moved += 1;
            }
            None => tracing::debug!(uid = %placement.uid, "Layout names an unknown node"),
        }
    }
    for placement in &layout.details {
        match state.details.get_mut(&placement.uid) {
            Some(detail) => {
                detail.x = placement.x.to_number();
                detail.y = placement.y.to_number();
                moved += 1;
            }
            None => tracing::debug!(uid = %placement.uid, "Layout names an unknown detail"),
        }
    }
    tracing::info!(moved, "Layout applied");
}

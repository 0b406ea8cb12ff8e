//! Write operations on the local graph.
//!
//! Every write lands in local state before it returns. Unless told otherwise
//! with [`Dispatch::local`], it also queues the matching remote command.
//! Links and details are checked against local state first; on a
//! [`ReferentialError`] nothing is registered and nothing is queued.
//! Removals are unconditional and never cascade.

use std::collections::HashMap;

use serde_json::Value;

use psynth_core::codec::{decode, encode};
use psynth_core::wire::{parse_response, LinkTypeUpdate};
use psynth_core::{
    AnchorKind, Command, Detail, DetailInput, DetailParams, Link, LinkInput, LinkType,
    LinkTypeInput, Node, NodeInput,
};

use crate::error::ReferentialError;
use crate::model::{Dispatch, Graph, GraphState};

/// Vertical spacing between details stacked on one anchor.
const DETAIL_SPACING: f64 = 20.0;
/// Horizontal gap between an anchor and its details.
const DETAIL_GAP: f64 = 4.0;

impl Graph {
    // ── Nodes ────────────────────────────────────────────────────

    /// Add a node, or build one from parameters, and queue `newnode`.
    pub fn add_node(&self, node: impl Into<NodeInput>) -> Node {
        self.add_node_with(node, Dispatch::default())
    }

    pub fn add_node_with(&self, node: impl Into<NodeInput>, dispatch: Dispatch) -> Node {
        let node = node.into().into_node();
        self.state.write().nodes.insert(node.uid.clone(), node.clone());
        tracing::trace!(uid = %node.uid, "Node added");
        self.dispatch(Command::NewNode(node.to_record()), dispatch);
        node
    }

    /// Store new field values for a node and queue `updatenode`.
    pub fn update_node(&self, node: &Node, dispatch: Dispatch) {
        self.state.write().nodes.insert(node.uid.clone(), node.clone());
        self.dispatch(Command::UpdateNode(node.to_record()), dispatch);
    }

    /// Remove a node locally and queue `delnode`. Links and details that
    /// reference it are left in place.
    pub fn remove_node(&self, node: &Node) -> Option<Node> {
        self.remove_node_with(node, Dispatch::default())
    }

    pub fn remove_node_with(&self, node: &Node, dispatch: Dispatch) -> Option<Node> {
        let removed = self.state.write().nodes.remove(&node.uid);
        self.dispatch(
            Command::DeleteNode {
                uid: encode(&node.uid),
            },
            dispatch,
        );
        removed
    }

    // ── Links ────────────────────────────────────────────────────

    /// Add a link, or build one from parameters, and queue `newrel`.
    ///
    /// Fails if the origin, terminus or link type is unknown, checked in
    /// that order.
    pub fn add_link(&self, link: impl Into<LinkInput>) -> Result<Link, ReferentialError> {
        self.add_link_with(link, Dispatch::default())
    }

    pub fn add_link_with(
        &self,
        link: impl Into<LinkInput>,
        dispatch: Dispatch,
    ) -> Result<Link, ReferentialError> {
        let link = self.admit_link(link.into())?;
        tracing::trace!(uid = %link.uid, link_type = %link.link_type, "Link added");
        self.dispatch(Command::NewLink(link.to_record()), dispatch);
        Ok(link)
    }

    /// Store new field values for a link and queue `updaterel`.
    pub fn update_link(&self, link: &Link, dispatch: Dispatch) -> Result<(), ReferentialError> {
        let link = self.admit_link(LinkInput::Entity(link.clone()))?;
        self.dispatch(Command::UpdateLink(link.to_record()), dispatch);
        Ok(())
    }

    /// Remove a link locally and queue `delrel`.
    pub fn remove_link(&self, link: &Link) -> Option<Link> {
        self.remove_link_with(link, Dispatch::default())
    }

    pub fn remove_link_with(&self, link: &Link, dispatch: Dispatch) -> Option<Link> {
        let removed = self.state.write().links.remove(&link.uid);
        self.dispatch(
            Command::DeleteLink {
                uid: encode(&link.uid),
            },
            dispatch,
        );
        removed
    }

    fn admit_link(&self, input: LinkInput) -> Result<Link, ReferentialError> {
        let refs = input.references();
        let mut state = self.state.write();
        if !state.nodes.contains(&refs.origin_uid) {
            return Err(ReferentialError::OriginNotFound(refs.origin_uid));
        }
        if !state.nodes.contains(&refs.terminus_uid) {
            return Err(ReferentialError::TerminusNotFound(refs.terminus_uid));
        }
        if !state.link_types.contains(&refs.link_type) {
            return Err(ReferentialError::LinkTypeNotFound(refs.link_type));
        }
        let link = input.into_link();
        state.links.insert(link.uid.clone(), link.clone());
        Ok(link)
    }

    // ── Link types ───────────────────────────────────────────────

    /// Register a link type by name, replacing any of the same name, and
    /// queue `newreltype`.
    pub fn add_link_type(&self, link_type: impl Into<LinkTypeInput>) -> LinkType {
        self.add_link_type_with(link_type, Dispatch::default())
    }

    pub fn add_link_type_with(
        &self,
        link_type: impl Into<LinkTypeInput>,
        dispatch: Dispatch,
    ) -> LinkType {
        let link_type = link_type.into().into_link_type();
        self.state
            .write()
            .link_types
            .insert(link_type.name.clone(), link_type.clone());
        tracing::trace!(name = %link_type.name, "Link type added");
        self.dispatch(Command::NewLinkType(link_type.to_record()), dispatch);
        link_type
    }

    /// Store new field values for a link type and queue `updatereltype`.
    ///
    /// The server answers with the type's old and new names and recomputed
    /// link values; every local link of the old type is renamed and revalued
    /// before `dispatch`'s completion runs.
    pub fn update_link_type(&self, link_type: &LinkType, dispatch: Dispatch) {
        self.state
            .write()
            .link_types
            .insert(link_type.name.clone(), link_type.clone());

        let state = self.state.clone();
        let completion = dispatch.completion;
        let handler = move |response: Value| {
            match parse_response::<LinkTypeUpdate>("updatereltype", response.clone()) {
                Ok(update) => apply_link_type_update(&mut state.write(), &update),
                Err(e) => tracing::warn!(error = %e, "Ignoring link type update response"),
            }
            if let Some(completion) = completion {
                completion(response);
            }
        };

        self.dispatch(
            Command::UpdateLinkType(link_type.to_record()),
            Dispatch {
                sync: dispatch.sync,
                completion: Some(Box::new(handler)),
            },
        );
    }

    // ── Details ──────────────────────────────────────────────────

    /// Add a detail, or build one from parameters, and queue `newdetail`.
    ///
    /// Fails if the anchor does not exist as the stated kind of entity.
    pub fn add_detail(&self, detail: impl Into<DetailInput>) -> Result<Detail, ReferentialError> {
        self.add_detail_with(detail, Dispatch::default())
    }

    pub fn add_detail_with(
        &self,
        detail: impl Into<DetailInput>,
        dispatch: Dispatch,
    ) -> Result<Detail, ReferentialError> {
        let detail = self.admit_detail(detail.into())?;
        tracing::trace!(uid = %detail.uid, anchor = %detail.anchor_uid, "Detail added");
        self.dispatch(Command::NewDetail(detail.to_record()), dispatch);
        Ok(detail)
    }

    /// Attach a detail to an anchor, placing it beside the anchor and below
    /// any details already attached there unless `params` gives a position.
    pub fn attach_detail(
        &self,
        kind: AnchorKind,
        anchor_uid: &str,
        params: DetailParams,
        dispatch: Dispatch,
    ) -> Result<Detail, ReferentialError> {
        let (ax, ay, offset, stacked) = {
            let state = self.state.read();
            let not_found = || ReferentialError::AnchorNotFound {
                kind,
                uid: anchor_uid.to_string(),
            };
            let (x, y, offset) = match kind {
                AnchorKind::Node => {
                    let node = state.nodes.get(anchor_uid).ok_or_else(not_found)?;
                    (node.x, node.y, node.radius)
                }
                AnchorKind::Link => {
                    let link = state.links.get(anchor_uid).ok_or_else(not_found)?;
                    let (x, y) = link_midpoint(&state, link);
                    (x, y, 0.0)
                }
            };
            let stacked = state
                .details
                .iter()
                .filter(|d| d.anchor_type == kind && d.anchor_uid == anchor_uid)
                .count();
            (x, y, offset, stacked)
        };

        let mut params = params.anchor(kind, encode(anchor_uid));
        if params.x.is_none() {
            params.x = Some((ax + offset + DETAIL_GAP).into());
        }
        if params.y.is_none() {
            params.y = Some((ay + offset + DETAIL_SPACING * stacked as f64).into());
        }
        self.add_detail_with(params, dispatch)
    }

    /// Store new field values for a detail and queue `updatedetail`.
    pub fn update_detail(&self, detail: &Detail, dispatch: Dispatch) -> Result<(), ReferentialError> {
        let detail = self.admit_detail(DetailInput::Entity(detail.clone()))?;
        self.dispatch(Command::UpdateDetail(detail.to_record()), dispatch);
        Ok(())
    }

    /// Remove a detail locally and queue `deldetail`.
    pub fn remove_detail(&self, detail: &Detail) -> Option<Detail> {
        self.remove_detail_with(detail, Dispatch::default())
    }

    pub fn remove_detail_with(&self, detail: &Detail, dispatch: Dispatch) -> Option<Detail> {
        let removed = self.state.write().details.remove(&detail.uid);
        self.dispatch(
            Command::DeleteDetail {
                uid: encode(&detail.uid),
            },
            dispatch,
        );
        removed
    }

    fn admit_detail(&self, input: DetailInput) -> Result<Detail, ReferentialError> {
        let (kind, anchor_uid) = input.anchor();
        let Some(kind) = kind else {
            return Err(ReferentialError::AnchorTypeMissing { anchor_uid });
        };
        let mut state = self.state.write();
        let resolved = match kind {
            AnchorKind::Node => state.nodes.contains(&anchor_uid),
            AnchorKind::Link => state.links.contains(&anchor_uid),
        };
        if !resolved {
            return Err(ReferentialError::AnchorNotFound {
                kind,
                uid: anchor_uid,
            });
        }
        let detail = input
            .into_detail()
            .map_err(|_| ReferentialError::AnchorTypeMissing {
                anchor_uid: anchor_uid.clone(),
            })?;
        state.details.insert(detail.uid.clone(), detail.clone());
        Ok(detail)
    }
}

/// Midpoint of whichever of a link's endpoints still exist.
fn link_midpoint(state: &GraphState, link: &Link) -> (f64, f64) {
    let ends: Vec<&Node> = [&link.origin_uid, &link.terminus_uid]
        .into_iter()
        .filter_map(|uid| state.nodes.get(uid))
        .collect();
    if ends.is_empty() {
        return (0.0, 0.0);
    }
    let n = ends.len() as f64;
    (
        ends.iter().map(|node| node.x).sum::<f64>() / n,
        ends.iter().map(|node| node.y).sum::<f64>() / n,
    )
}

/// Rename links of the old type and take the server's recomputed values.
fn apply_link_type_update(state: &mut GraphState, update: &LinkTypeUpdate) {
    let old = decode(&update.rel_type.old_name);
    let new = decode(&update.rel_type.name);
    let values: HashMap<&str, f64> = update
        .rels
        .iter()
        .map(|(uid, value)| (uid.as_str(), value.to_number()))
        .collect();

    let mut renamed = 0usize;
    for link in state.links.values_mut() {
        if link.link_type == old {
            if let Some(value) = values.get(link.uid.as_str()) {
                link.value = *value;
            }
            link.link_type = new.clone();
            renamed += 1;
        }
    }

    if old != new {
        let previous = state.link_types.remove(&old);
        if !state.link_types.contains(&new) {
            if let Some(mut link_type) = previous {
                link_type.name = new.clone();
                state.link_types.insert(new.clone(), link_type);
            }
        }
    }

    tracing::debug!(old = %old, new = %new, renamed, "Link type updated");
}

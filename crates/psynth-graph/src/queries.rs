//! Read operations on the local graph.
//!
//! All reads return owned copies of local state and never touch the server.
//! Lookups return `None` for unknown identifiers.

use std::collections::HashMap;

use psynth_core::{AnchorKind, Detail, Link, LinkType, Node};

use crate::model::Graph;

/// The entity a detail is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    Node(Node),
    Link(Link),
}

impl Graph {
    // ── Lookups ──────────────────────────────────────────────────

    pub fn node(&self, uid: &str) -> Option<Node> {
        self.state.read().nodes.get(uid).cloned()
    }

    pub fn link(&self, uid: &str) -> Option<Link> {
        self.state.read().links.get(uid).cloned()
    }

    pub fn link_type(&self, name: &str) -> Option<LinkType> {
        self.state.read().link_types.get(name).cloned()
    }

    pub fn detail(&self, uid: &str) -> Option<Detail> {
        self.state.read().details.get(uid).cloned()
    }

    // ── Collections ──────────────────────────────────────────────

    /// All nodes by uid.
    pub fn nodes(&self) -> HashMap<String, Node> {
        self.state.read().nodes.snapshot()
    }

    /// All nodes in the order they were added.
    pub fn node_list(&self) -> Vec<Node> {
        self.state.read().nodes.to_list()
    }

    pub fn links(&self) -> HashMap<String, Link> {
        self.state.read().links.snapshot()
    }

    pub fn link_list(&self) -> Vec<Link> {
        self.state.read().links.to_list()
    }

    /// All link types by name.
    pub fn link_types(&self) -> HashMap<String, LinkType> {
        self.state.read().link_types.snapshot()
    }

    pub fn link_type_list(&self) -> Vec<LinkType> {
        self.state.read().link_types.to_list()
    }

    pub fn details(&self) -> HashMap<String, Detail> {
        self.state.read().details.snapshot()
    }

    pub fn detail_list(&self) -> Vec<Detail> {
        self.state.read().details.to_list()
    }

    // ── Relationships ────────────────────────────────────────────

    /// The node a link starts from, if it still exists.
    pub fn origin(&self, link: &Link) -> Option<Node> {
        self.node(&link.origin_uid)
    }

    /// The node a link ends at, if it still exists.
    pub fn terminus(&self, link: &Link) -> Option<Node> {
        self.node(&link.terminus_uid)
    }

    /// The node or link a detail is attached to, if it still exists.
    pub fn anchor(&self, detail: &Detail) -> Option<Anchor> {
        match detail.anchor_type {
            AnchorKind::Node => self.node(&detail.anchor_uid).map(Anchor::Node),
            AnchorKind::Link => self.link(&detail.anchor_uid).map(Anchor::Link),
        }
    }

    /// Links leaving the node.
    pub fn out_links(&self, uid: &str) -> Vec<Link> {
        self.links_where(|l| l.origin_uid == uid)
    }

    /// Links arriving at the node.
    pub fn in_links(&self, uid: &str) -> Vec<Link> {
        self.links_where(|l| l.terminus_uid == uid)
    }

    /// Links touching the node in either direction.
    pub fn all_links(&self, uid: &str) -> Vec<Link> {
        self.links_where(|l| l.origin_uid == uid || l.terminus_uid == uid)
    }

    /// Nodes this node links to. Dangling termini are skipped.
    pub fn out_neighbors(&self, uid: &str) -> Vec<Node> {
        let state = self.state.read();
        state
            .links
            .iter()
            .filter(|l| l.origin_uid == uid)
            .filter_map(|l| state.nodes.get(&l.terminus_uid).cloned())
            .collect()
    }

    /// Nodes that link to this node. Dangling origins are skipped.
    pub fn in_neighbors(&self, uid: &str) -> Vec<Node> {
        let state = self.state.read();
        state
            .links
            .iter()
            .filter(|l| l.terminus_uid == uid)
            .filter_map(|l| state.nodes.get(&l.origin_uid).cloned())
            .collect()
    }

    /// Nodes at the other end of every link touching this node.
    pub fn all_neighbors(&self, uid: &str) -> Vec<Node> {
        let state = self.state.read();
        state
            .links
            .iter()
            .filter_map(|l| {
                if l.terminus_uid == uid {
                    Some(&l.origin_uid)
                } else if l.origin_uid == uid {
                    Some(&l.terminus_uid)
                } else {
                    None
                }
            })
            .filter_map(|other| state.nodes.get(other).cloned())
            .collect()
    }

    /// Links joining the same two nodes as `link`, in either direction,
    /// including `link` itself.
    pub fn parallel(&self, link: &Link) -> Vec<Link> {
        self.links_where(|l| l.is_parallel_to(link))
    }

    /// Details attached to the given anchor, by uid.
    pub fn details_of(&self, kind: AnchorKind, uid: &str) -> HashMap<String, Detail> {
        self.detail_list_of(kind, uid)
            .into_iter()
            .map(|d| (d.uid.clone(), d))
            .collect()
    }

    /// Details attached to the given anchor, in the order they were added.
    pub fn detail_list_of(&self, kind: AnchorKind, uid: &str) -> Vec<Detail> {
        self.state
            .read()
            .details
            .iter()
            .filter(|d| d.anchor_type == kind && d.anchor_uid == uid)
            .cloned()
            .collect()
    }

    fn links_where(&self, predicate: impl Fn(&Link) -> bool) -> Vec<Link> {
        self.state
            .read()
            .links
            .iter()
            .filter(|l| predicate(l))
            .cloned()
            .collect()
    }
}

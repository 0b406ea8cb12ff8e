//! Request documents and response shapes exchanged with the Psynth server.
//!
//! Every request is a JSON object with a `query` field naming the command,
//! the graph identity fields (`user`, `filename`, `password`), and the
//! command's own payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::param::Param;
use crate::types::{AnchorKind, DetailParams, LinkParams, LinkTypeParams, NodeParams};

/// Response value meaning "the remote command did not succeed".
pub const FAILURE_SENTINEL: &str = "invalid";

/// Whether a response is the failure sentinel.
pub fn is_failure(response: &Value) -> bool {
    response.as_str() == Some(FAILURE_SENTINEL)
}

// ── Identity ──────────────────────────────────────────────────────

/// Identity and credentials attached to every graph command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphIdentity {
    pub user: String,
    pub password: String,
    pub filename: String,
}

impl GraphIdentity {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            filename: filename.into(),
        }
    }

    /// Stamp the identity fields onto a request document.
    pub fn attach(&self, document: &mut Value) {
        if let Value::Object(map) = document {
            map.insert("user".into(), Value::String(self.user.clone()));
            map.insert("filename".into(), Value::String(self.filename.clone()));
            map.insert("password".into(), Value::String(self.password.clone()));
        }
    }
}

// ── Entity records ────────────────────────────────────────────────

/// Payload of `newnode` / `updatenode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub uid: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub shape: String,
    pub picture: String,
    pub radius: f64,
    pub color: String,
}

/// Payload of `newrel` / `updaterel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub uid: String,
    pub name: String,
    pub value: f64,
    pub rel_type: String,
    pub o_uid: String,
    pub t_uid: String,
}

/// Payload of `newreltype` / `updatereltype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct LinkTypeRecord {
    pub name: String,
    pub icon: String,
    pub tile: String,
    pub max: f64,
    pub color: String,
}

/// Payload of `newdetail` / `updatedetail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub anchor_uid: String,
    pub anchor_type: AnchorKind,
    pub uid: String,
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
}

// ── Commands ──────────────────────────────────────────────────────

/// One unit of remote work, tagged by its `query` kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query")]
pub enum Command {
    #[serde(rename = "newnode")]
    NewNode(NodeRecord),
    #[serde(rename = "updatenode")]
    UpdateNode(NodeRecord),
    #[serde(rename = "delnode")]
    DeleteNode { uid: String },

    #[serde(rename = "newrel")]
    NewLink(LinkRecord),
    #[serde(rename = "updaterel")]
    UpdateLink(LinkRecord),
    #[serde(rename = "delrel")]
    DeleteLink { uid: String },

    #[serde(rename = "newreltype")]
    NewLinkType(LinkTypeRecord),
    #[serde(rename = "updatereltype")]
    UpdateLinkType(LinkTypeRecord),

    #[serde(rename = "newdetail")]
    NewDetail(DetailRecord),
    #[serde(rename = "updatedetail")]
    UpdateDetail(DetailRecord),
    #[serde(rename = "deldetail")]
    DeleteDetail { uid: String },

    #[serde(rename = "drawgraph")]
    Draw,
    #[serde(rename = "publish")]
    Publish { x: f64, y: f64, scale: f64 },

    #[serde(rename = "createmap")]
    CreateGraph {
        user: String,
        password: String,
        name: String,
    },
    #[serde(rename = "getwholegraph")]
    LoadGraph,
}

impl Command {
    /// The `query` tag this command is sent under.
    pub fn query(&self) -> &'static str {
        match self {
            Command::NewNode(_) => "newnode",
            Command::UpdateNode(_) => "updatenode",
            Command::DeleteNode { .. } => "delnode",
            Command::NewLink(_) => "newrel",
            Command::UpdateLink(_) => "updaterel",
            Command::DeleteLink { .. } => "delrel",
            Command::NewLinkType(_) => "newreltype",
            Command::UpdateLinkType(_) => "updatereltype",
            Command::NewDetail(_) => "newdetail",
            Command::UpdateDetail(_) => "updatedetail",
            Command::DeleteDetail { .. } => "deldetail",
            Command::Draw => "drawgraph",
            Command::Publish { .. } => "publish",
            Command::CreateGraph { .. } => "createmap",
            Command::LoadGraph => "getwholegraph",
        }
    }

    /// Build the request document for this command under `identity`.
    pub fn to_document(&self, identity: &GraphIdentity) -> Result<Value, CoreError> {
        let mut document = serde_json::to_value(self)?;
        identity.attach(&mut document);
        Ok(document)
    }
}

// ── Responses ─────────────────────────────────────────────────────

/// A server-assigned position for one node or detail.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Placement {
    #[serde(rename = "UID")]
    pub uid: String,
    #[serde(rename = "X")]
    pub x: Param,
    #[serde(rename = "Y")]
    pub y: Param,
}

/// Response to `drawgraph`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayoutResponse {
    #[serde(default)]
    pub nodes: Vec<Placement>,
    #[serde(default)]
    pub details: Vec<Placement>,
}

impl LayoutResponse {
    /// Read placements one at a time. A malformed placement is skipped with a
    /// warning; the rest still apply.
    pub fn from_response(response: &Value) -> Self {
        Self {
            nodes: placements(response, "nodes"),
            details: placements(response, "details"),
        }
    }
}

fn placements(response: &Value, key: &str) -> Vec<Placement> {
    let Some(items) = response.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match Placement::deserialize(item) {
            Ok(placement) => Some(placement),
            Err(e) => {
                tracing::warn!(key, placement = %item, error = %e, "Skipping malformed placement");
                None
            }
        })
        .collect()
}

/// Old and new names of a renamed link type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenamedLinkType {
    #[serde(rename = "O_NAME")]
    pub old_name: String,
    #[serde(rename = "NAME")]
    pub name: String,
}

/// Response to `updatereltype`: the rename plus recomputed link values by uid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkTypeUpdate {
    pub rel_type: RenamedLinkType,
    #[serde(default)]
    pub rels: HashMap<String, Param>,
}

/// Response to `createmap`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedGraph {
    pub filename: String,
}

/// Response to `getwholegraph`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub name: Option<Param>,
    #[serde(default)]
    pub rel_types: Vec<LinkTypeParams>,
    #[serde(default)]
    pub nodes: Vec<NodeParams>,
    #[serde(default)]
    pub rels: Vec<LinkParams>,
    #[serde(default)]
    pub details: Vec<DetailParams>,
}

/// Decode a typed response, naming the command in the error.
pub fn parse_response<T: serde::de::DeserializeOwned>(
    what: &'static str,
    response: Value,
) -> Result<T, CoreError> {
    serde_json::from_value(response).map_err(|e| CoreError::MalformedResponse {
        what,
        reason: e.to_string(),
    })
}

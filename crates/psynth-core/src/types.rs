//! Entity types for a Psynth graph.
//!
//! Every entity is built from raw parameters by applying the same policy to
//! each field: an absent value or the `"default"` placeholder takes the
//! field's default, text is percent-decoded once, numbers are coerced.
//! Entities serialize themselves into the record their remote command
//! expects, percent-encoding text on the way out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::encode;
use crate::error::CoreError;
use crate::param::{self, format_number, provided, Param};
use crate::uid;
use crate::wire::{DetailRecord, LinkRecord, LinkTypeRecord, NodeRecord};

// ── Shape ─────────────────────────────────────────────────────────

/// How a node is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle,
    Image,
    /// A regular polygon with this many sides (3 or more).
    Polygon(u32),
    /// A side count the server does not draw, kept as given.
    Other(f64),
}

impl Shape {
    pub fn from_number(n: f64) -> Self {
        if n == 0.0 {
            Shape::Circle
        } else if n == 1.0 {
            Shape::Image
        } else if n >= 3.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
            Shape::Polygon(n as u32)
        } else {
            Shape::Other(n)
        }
    }

    /// Translate a symbolic shape name.
    pub fn from_name(name: &str) -> Option<Self> {
        let shape = match name {
            "circle" => Shape::Circle,
            "triangle" => Shape::Polygon(3),
            "square" | "diamond" => Shape::Polygon(4),
            "pentagon" | "pent" => Shape::Polygon(5),
            "hexagon" | "hex" => Shape::Polygon(6),
            "septagon" | "sept" => Shape::Polygon(7),
            "octagon" | "oct" => Shape::Polygon(8),
            _ => return None,
        };
        Some(shape)
    }

    /// Symbolic names first, numeric coercion otherwise.
    pub fn from_param(param: &Param) -> Self {
        match param {
            Param::Number(n) => Shape::from_number(*n),
            Param::Text(t) => {
                Shape::from_name(t).unwrap_or_else(|| Shape::from_number(param::coerce_number(t)))
            }
        }
    }

    /// The numeric code sent to the server.
    pub fn code(&self) -> f64 {
        match self {
            Shape::Circle => 0.0,
            Shape::Image => 1.0,
            Shape::Polygon(sides) => *sides as f64,
            Shape::Other(n) => *n,
        }
    }
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Polygon(6)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(self.code()))
    }
}

// ── Node ──────────────────────────────────────────────────────────

pub const DEFAULT_NODE_NAME: &str = "Node";
pub const DEFAULT_NODE_X: f64 = 1.0;
pub const DEFAULT_NODE_Y: f64 = 1.0;
pub const DEFAULT_NODE_RADIUS: f64 = 24.0;
pub const DEFAULT_NODE_COLOR: &str = "default";
pub const DEFAULT_NODE_IMAGE: &str = "default";

/// A vertex in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub uid: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub shape: Shape,
    pub radius: f64,
    pub color: String,
    pub image: String,
}

/// Raw parameters for a [`Node`].
///
/// Field aliases accept both the request-document names and the upper-case
/// names used in whole-graph snapshots.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeParams {
    #[serde(default, alias = "UID")]
    pub uid: Option<Param>,
    #[serde(default, alias = "NAME")]
    pub name: Option<Param>,
    #[serde(default, alias = "X")]
    pub x: Option<Param>,
    #[serde(default, alias = "Y")]
    pub y: Option<Param>,
    #[serde(default, alias = "SHAPE")]
    pub shape: Option<Param>,
    #[serde(default, alias = "RADIUS")]
    pub radius: Option<Param>,
    #[serde(default, alias = "COLOR")]
    pub color: Option<Param>,
    #[serde(default, alias = "picture", alias = "PICTURE")]
    pub image: Option<Param>,
}

impl NodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uid(mut self, value: impl Into<Param>) -> Self {
        self.uid = Some(value.into());
        self
    }

    pub fn name(mut self, value: impl Into<Param>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn x(mut self, value: impl Into<Param>) -> Self {
        self.x = Some(value.into());
        self
    }

    pub fn y(mut self, value: impl Into<Param>) -> Self {
        self.y = Some(value.into());
        self
    }

    pub fn shape(mut self, value: impl Into<Param>) -> Self {
        self.shape = Some(value.into());
        self
    }

    pub fn radius(mut self, value: impl Into<Param>) -> Self {
        self.radius = Some(value.into());
        self
    }

    pub fn color(mut self, value: impl Into<Param>) -> Self {
        self.color = Some(value.into());
        self
    }

    pub fn image(mut self, value: impl Into<Param>) -> Self {
        self.image = Some(value.into());
        self
    }
}

impl Node {
    pub fn new(params: NodeParams) -> Self {
        Self {
            uid: uid_or_generate(&params.uid),
            name: param::text(&params.name, DEFAULT_NODE_NAME),
            x: param::number(&params.x, DEFAULT_NODE_X),
            y: param::number(&params.y, DEFAULT_NODE_Y),
            shape: provided(&params.shape)
                .map(Shape::from_param)
                .unwrap_or_default(),
            radius: param::number(&params.radius, DEFAULT_NODE_RADIUS),
            color: param::text(&params.color, DEFAULT_NODE_COLOR),
            image: param::text(&params.image, DEFAULT_NODE_IMAGE),
        }
    }

    /// The `newnode`/`updatenode` payload.
    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            uid: encode(&self.uid),
            name: encode(&self.name),
            x: self.x,
            y: self.y,
            shape: self.shape.to_string(),
            picture: encode(&self.image),
            radius: self.radius,
            color: encode(&self.color),
        }
    }
}

impl From<&NodeRecord> for NodeParams {
    fn from(record: &NodeRecord) -> Self {
        NodeParams::new()
            .uid(&record.uid)
            .name(&record.name)
            .x(record.x)
            .y(record.y)
            .shape(&record.shape)
            .radius(record.radius)
            .color(&record.color)
            .image(&record.picture)
    }
}

/// Either a ready [`Node`] or the parameters to build one.
#[derive(Debug, Clone)]
pub enum NodeInput {
    Entity(Node),
    Params(NodeParams),
}

impl NodeInput {
    pub fn into_node(self) -> Node {
        match self {
            NodeInput::Entity(node) => node,
            NodeInput::Params(params) => Node::new(params),
        }
    }
}

impl From<Node> for NodeInput {
    fn from(node: Node) -> Self {
        NodeInput::Entity(node)
    }
}

impl From<NodeParams> for NodeInput {
    fn from(params: NodeParams) -> Self {
        NodeInput::Params(params)
    }
}

// ── Link ──────────────────────────────────────────────────────────

pub const DEFAULT_LINK_VALUE: f64 = 1.0;

/// A typed, directed edge between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub uid: String,
    pub name: String,
    /// Name of the [`LinkType`] this link belongs to.
    pub link_type: String,
    pub value: f64,
    pub origin_uid: String,
    pub terminus_uid: String,
}

/// Raw parameters for a [`Link`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinkParams {
    #[serde(default, alias = "UID")]
    pub uid: Option<Param>,
    #[serde(default, alias = "NAME")]
    pub name: Option<Param>,
    #[serde(default, rename = "type", alias = "TYPE", alias = "rel_type")]
    pub link_type: Option<Param>,
    #[serde(default, alias = "VALUE")]
    pub value: Option<Param>,
    #[serde(default, alias = "ORIGIN", alias = "o_uid")]
    pub origin_uid: Option<Param>,
    #[serde(default, alias = "TERMINUS", alias = "t_uid")]
    pub terminus_uid: Option<Param>,
}

impl LinkParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uid(mut self, value: impl Into<Param>) -> Self {
        self.uid = Some(value.into());
        self
    }

    pub fn name(mut self, value: impl Into<Param>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn link_type(mut self, value: impl Into<Param>) -> Self {
        self.link_type = Some(value.into());
        self
    }

    pub fn value(mut self, value: impl Into<Param>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn origin(mut self, value: impl Into<Param>) -> Self {
        self.origin_uid = Some(value.into());
        self
    }

    pub fn terminus(mut self, value: impl Into<Param>) -> Self {
        self.terminus_uid = Some(value.into());
        self
    }
}

impl Link {
    pub fn new(params: LinkParams) -> Self {
        let link_type = param::text(&params.link_type, "");
        Self {
            uid: uid_or_generate(&params.uid),
            name: param::text(&params.name, &link_type),
            value: param::number(&params.value, DEFAULT_LINK_VALUE),
            origin_uid: param::text(&params.origin_uid, ""),
            terminus_uid: param::text(&params.terminus_uid, ""),
            link_type,
        }
    }

    /// The `newrel`/`updaterel` payload.
    pub fn to_record(&self) -> LinkRecord {
        LinkRecord {
            uid: encode(&self.uid),
            name: encode(&self.name),
            value: self.value,
            rel_type: encode(&self.link_type),
            o_uid: encode(&self.origin_uid),
            t_uid: encode(&self.terminus_uid),
        }
    }

    /// Whether this link joins the same two nodes as `other`, in either direction.
    pub fn is_parallel_to(&self, other: &Link) -> bool {
        (self.origin_uid == other.origin_uid && self.terminus_uid == other.terminus_uid)
            || (self.origin_uid == other.terminus_uid && self.terminus_uid == other.origin_uid)
    }
}

impl From<&LinkRecord> for LinkParams {
    fn from(record: &LinkRecord) -> Self {
        LinkParams::new()
            .uid(&record.uid)
            .name(&record.name)
            .value(record.value)
            .link_type(&record.rel_type)
            .origin(&record.o_uid)
            .terminus(&record.t_uid)
    }
}

/// The references a link must resolve before it is admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRefs {
    pub origin_uid: String,
    pub terminus_uid: String,
    pub link_type: String,
}

/// Either a ready [`Link`] or the parameters to build one.
#[derive(Debug, Clone)]
pub enum LinkInput {
    Entity(Link),
    Params(LinkParams),
}

impl LinkInput {
    /// Resolve the referenced uids and type name without building the link.
    pub fn references(&self) -> LinkRefs {
        match self {
            LinkInput::Entity(link) => LinkRefs {
                origin_uid: link.origin_uid.clone(),
                terminus_uid: link.terminus_uid.clone(),
                link_type: link.link_type.clone(),
            },
            LinkInput::Params(params) => LinkRefs {
                origin_uid: param::text(&params.origin_uid, ""),
                terminus_uid: param::text(&params.terminus_uid, ""),
                link_type: param::text(&params.link_type, ""),
            },
        }
    }

    pub fn into_link(self) -> Link {
        match self {
            LinkInput::Entity(link) => link,
            LinkInput::Params(params) => Link::new(params),
        }
    }
}

impl From<Link> for LinkInput {
    fn from(link: Link) -> Self {
        LinkInput::Entity(link)
    }
}

impl From<LinkParams> for LinkInput {
    fn from(params: LinkParams) -> Self {
        LinkInput::Params(params)
    }
}

// ── LinkType ──────────────────────────────────────────────────────

pub const DEFAULT_LINK_TYPE_NAME: &str = "Links";
pub const DEFAULT_LINK_TYPE_ICON: &str = "img/link_icon.png";
pub const DEFAULT_LINK_TYPE_TILE: &str = "img/link_tile.png";
pub const DEFAULT_LINK_TYPE_MAX: f64 = 10.0;
pub const DEFAULT_LINK_TYPE_COLOR: &str = "#1aa2d4";

/// A named category of links. Names are unique within a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkType {
    pub name: String,
    pub icon: String,
    pub tile: String,
    pub max: f64,
    pub color: String,
}

/// Raw parameters for a [`LinkType`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinkTypeParams {
    #[serde(default, alias = "NAME")]
    pub name: Option<Param>,
    #[serde(default, alias = "ICON")]
    pub icon: Option<Param>,
    #[serde(default, alias = "TILE")]
    pub tile: Option<Param>,
    #[serde(default, alias = "MAX")]
    pub max: Option<Param>,
    #[serde(default, alias = "COLOR")]
    pub color: Option<Param>,
}

impl LinkTypeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: impl Into<Param>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn icon(mut self, value: impl Into<Param>) -> Self {
        self.icon = Some(value.into());
        self
    }

    pub fn tile(mut self, value: impl Into<Param>) -> Self {
        self.tile = Some(value.into());
        self
    }

    pub fn max(mut self, value: impl Into<Param>) -> Self {
        self.max = Some(value.into());
        self
    }

    pub fn color(mut self, value: impl Into<Param>) -> Self {
        self.color = Some(value.into());
        self
    }
}

impl LinkType {
    pub fn new(params: LinkTypeParams) -> Self {
        Self {
            name: param::text(&params.name, DEFAULT_LINK_TYPE_NAME),
            icon: param::text(&params.icon, DEFAULT_LINK_TYPE_ICON),
            tile: param::text(&params.tile, DEFAULT_LINK_TYPE_TILE),
            max: param::number(&params.max, DEFAULT_LINK_TYPE_MAX),
            color: param::text(&params.color, DEFAULT_LINK_TYPE_COLOR),
        }
    }

    /// The `newreltype`/`updatereltype` payload.
    pub fn to_record(&self) -> LinkTypeRecord {
        LinkTypeRecord {
            name: encode(&self.name),
            icon: encode(&self.icon),
            tile: encode(&self.tile),
            max: self.max,
            color: encode(&self.color),
        }
    }
}

impl Default for LinkType {
    fn default() -> Self {
        LinkType::new(LinkTypeParams::default())
    }
}

impl From<&LinkTypeRecord> for LinkTypeParams {
    fn from(record: &LinkTypeRecord) -> Self {
        LinkTypeParams::new()
            .name(&record.name)
            .icon(&record.icon)
            .tile(&record.tile)
            .max(record.max)
            .color(&record.color)
    }
}

/// Either a ready [`LinkType`] or the parameters to build one.
#[derive(Debug, Clone)]
pub enum LinkTypeInput {
    Entity(LinkType),
    Params(LinkTypeParams),
}

impl LinkTypeInput {
    pub fn into_link_type(self) -> LinkType {
        match self {
            LinkTypeInput::Entity(link_type) => link_type,
            LinkTypeInput::Params(params) => LinkType::new(params),
        }
    }
}

impl From<LinkType> for LinkTypeInput {
    fn from(link_type: LinkType) -> Self {
        LinkTypeInput::Entity(link_type)
    }
}

impl From<LinkTypeParams> for LinkTypeInput {
    fn from(params: LinkTypeParams) -> Self {
        LinkTypeInput::Params(params)
    }
}

// ── Detail ────────────────────────────────────────────────────────

/// What a detail is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    #[default]
    Node,
    Link,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorKind::Node => f.write_str("Node"),
            AnchorKind::Link => f.write_str("Link"),
        }
    }
}

impl FromStr for AnchorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Node" => Ok(AnchorKind::Node),
            "Link" => Ok(AnchorKind::Link),
            other => Err(format!("unknown anchor type: {other}")),
        }
    }
}

/// The kind of content a detail carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailKind {
    #[default]
    Comment,
    Link,
    Image,
    Video,
    /// Any other kind the server knows about, kept verbatim.
    Other(String),
}

impl From<&str> for DetailKind {
    fn from(s: &str) -> Self {
        match s {
            "comment" => DetailKind::Comment,
            "link" => DetailKind::Link,
            "image" => DetailKind::Image,
            "video" => DetailKind::Video,
            other => DetailKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailKind::Comment => f.write_str("comment"),
            DetailKind::Link => f.write_str("link"),
            DetailKind::Image => f.write_str("image"),
            DetailKind::Video => f.write_str("video"),
            DetailKind::Other(kind) => f.write_str(kind),
        }
    }
}

pub const DEFAULT_DETAIL_KIND: &str = "comment";

/// A content annotation anchored to a node or a link.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub uid: String,
    pub name: String,
    pub kind: DetailKind,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub anchor_uid: String,
    pub anchor_type: AnchorKind,
}

/// Raw parameters for a [`Detail`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetailParams {
    #[serde(default, alias = "UID")]
    pub uid: Option<Param>,
    #[serde(default, alias = "NAME")]
    pub name: Option<Param>,
    #[serde(default, rename = "type", alias = "TYPE")]
    pub kind: Option<Param>,
    #[serde(default, alias = "CONTENT")]
    pub content: Option<Param>,
    #[serde(default, alias = "X")]
    pub x: Option<Param>,
    #[serde(default, alias = "Y")]
    pub y: Option<Param>,
    #[serde(default, alias = "ANCHOR_UID")]
    pub anchor_uid: Option<Param>,
    #[serde(default, alias = "ANCHOR_TYPE")]
    pub anchor_type: Option<AnchorKind>,
}

impl DetailParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uid(mut self, value: impl Into<Param>) -> Self {
        self.uid = Some(value.into());
        self
    }

    pub fn name(mut self, value: impl Into<Param>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn kind(mut self, value: impl Into<Param>) -> Self {
        self.kind = Some(value.into());
        self
    }

    pub fn content(mut self, value: impl Into<Param>) -> Self {
        self.content = Some(value.into());
        self
    }

    pub fn x(mut self, value: impl Into<Param>) -> Self {
        self.x = Some(value.into());
        self
    }

    pub fn y(mut self, value: impl Into<Param>) -> Self {
        self.y = Some(value.into());
        self
    }

    pub fn anchor(mut self, kind: AnchorKind, uid: impl Into<Param>) -> Self {
        self.anchor_type = Some(kind);
        self.anchor_uid = Some(uid.into());
        self
    }
}

impl Detail {
    /// Build a detail. Every other field has a default, but the anchor type
    /// must be stated.
    pub fn new(params: DetailParams) -> Result<Self, CoreError> {
        let anchor_type = params
            .anchor_type
            .ok_or_else(|| CoreError::MissingAnchorType {
                anchor_uid: param::text(&params.anchor_uid, ""),
            })?;
        let kind = DetailKind::from(param::text(&params.kind, DEFAULT_DETAIL_KIND).as_str());
        Ok(Self {
            uid: uid_or_generate(&params.uid),
            name: param::text(&params.name, &kind.to_string()),
            content: param::text(&params.content, ""),
            x: param::number(&params.x, 0.0),
            y: param::number(&params.y, 0.0),
            anchor_uid: param::text(&params.anchor_uid, ""),
            anchor_type,
            kind,
        })
    }

    /// The `newdetail`/`updatedetail` payload.
    pub fn to_record(&self) -> DetailRecord {
        DetailRecord {
            anchor_uid: encode(&self.anchor_uid),
            anchor_type: self.anchor_type,
            uid: encode(&self.uid),
            name: encode(&self.name),
            content: encode(&self.content),
            kind: encode(&self.kind.to_string()),
            x: self.x,
            y: self.y,
        }
    }
}

impl From<&DetailRecord> for DetailParams {
    fn from(record: &DetailRecord) -> Self {
        DetailParams::new()
            .uid(&record.uid)
            .name(&record.name)
            .kind(&record.kind)
            .content(&record.content)
            .x(record.x)
            .y(record.y)
            .anchor(record.anchor_type, &record.anchor_uid)
    }
}

/// Either a ready [`Detail`] or the parameters to build one.
#[derive(Debug, Clone)]
pub enum DetailInput {
    Entity(Detail),
    Params(DetailParams),
}

impl DetailInput {
    /// The stated anchor, if any, without building the detail.
    pub fn anchor(&self) -> (Option<AnchorKind>, String) {
        match self {
            DetailInput::Entity(detail) => (Some(detail.anchor_type), detail.anchor_uid.clone()),
            DetailInput::Params(params) => {
                (params.anchor_type, param::text(&params.anchor_uid, ""))
            }
        }
    }

    pub fn into_detail(self) -> Result<Detail, CoreError> {
        match self {
            DetailInput::Entity(detail) => Ok(detail),
            DetailInput::Params(params) => Detail::new(params),
        }
    }
}

impl From<Detail> for DetailInput {
    fn from(detail: Detail) -> Self {
        DetailInput::Entity(detail)
    }
}

impl From<DetailParams> for DetailInput {
    fn from(params: DetailParams) -> Self {
        DetailInput::Params(params)
    }
}

fn uid_or_generate(param: &Option<Param>) -> String {
    provided(param)
        .map(Param::to_text)
        .unwrap_or_else(uid::generate)
}

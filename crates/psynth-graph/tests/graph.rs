//! Graph model behaviour against a scripted transport.
//!
//! Run with: cargo test --package psynth-graph --test graph

mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use common::{config, graph, ScriptedTransport};
use psynth_core::types::DEFAULT_LINK_TYPE_ICON;
use psynth_core::{AnchorKind, DetailParams, LinkParams, LinkTypeParams, NodeParams};
use psynth_graph::{create_graph, load_graph, Anchor, Dispatch, Graph, GraphError, ReferentialError};

fn node(graph: &Graph, uid: &str, x: f64, y: f64) {
    graph.add_node(NodeParams::new().uid(uid).name(uid).x(x).y(y));
}

fn link(graph: &Graph, uid: &str, origin: &str, terminus: &str, link_type: &str) {
    graph
        .add_link(
            LinkParams::new()
                .uid(uid)
                .origin(origin)
                .terminus(terminus)
                .link_type(link_type),
        )
        .unwrap();
}

/// Nodes A and B joined by link L of type Friend.
async fn friends(transport: &Arc<ScriptedTransport>) -> Graph {
    let graph = graph(transport);
    node(&graph, "A", 10.0, 20.0);
    node(&graph, "B", 110.0, 320.0);
    graph.add_link_type(LinkTypeParams::new().name("Friend").max(10));
    link(&graph, "L", "A", "B", "Friend");
    graph.settle().await;
    graph
}

// ── Links ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_link_resolves_endpoints() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    let link = graph.link("L").unwrap();
    assert_eq!(link.name, "Friend");
    assert_eq!(link.value, 1.0);
    assert_eq!(graph.origin(&link).unwrap().uid, "A");
    assert_eq!(graph.terminus(&link).unwrap().uid, "B");
    assert_eq!(
        transport.queries(),
        vec!["newnode", "newnode", "newreltype", "newrel"]
    );
    assert_eq!(transport.requests()[3]["o_uid"], "A");
    assert_eq!(transport.requests()[3]["rel_type"], "Friend");
}

#[tokio::test]
async fn test_add_link_with_unknown_type_changes_nothing() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;
    let before = transport.requests().len();

    let err = graph
        .add_link(LinkParams::new().origin("A").terminus("B").link_type("Nonexistent"))
        .unwrap_err();
    graph.settle().await;

    assert_eq!(err, ReferentialError::LinkTypeNotFound("Nonexistent".into()));
    assert_eq!(graph.link_list().len(), 1);
    assert_eq!(transport.requests().len(), before);
}

#[tokio::test]
async fn test_add_link_reports_origin_before_terminus_before_type() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    let err = graph
        .add_link(LinkParams::new().origin("X").terminus("Y").link_type("Z"))
        .unwrap_err();
    assert_eq!(err, ReferentialError::OriginNotFound("X".into()));

    let err = graph
        .add_link(LinkParams::new().origin("A").terminus("Y").link_type("Z"))
        .unwrap_err();
    assert_eq!(err, ReferentialError::TerminusNotFound("Y".into()));

    let err = graph
        .add_link(LinkParams::new().origin("A").terminus("B").link_type("Z"))
        .unwrap_err();
    assert_eq!(err, ReferentialError::LinkTypeNotFound("Z".into()));
}

#[tokio::test]
async fn test_update_link_rechecks_references() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    let mut link = graph.link("L").unwrap();
    link.value = 4.0;
    graph.update_link(&link, Dispatch::default()).unwrap();
    link.terminus_uid = "ghost".into();
    let err = graph.update_link(&link, Dispatch::default()).unwrap_err();
    graph.settle().await;

    assert_eq!(err, ReferentialError::TerminusNotFound("ghost".into()));
    assert_eq!(graph.link("L").unwrap().terminus_uid, "B");
    assert_eq!(graph.link("L").unwrap().value, 4.0);
    assert_eq!(transport.queries().last().unwrap(), "updaterel");
}

// ── Details ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_detail_checks_anchor() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;
    let before = transport.requests().len();

    let detail = graph
        .add_detail(DetailParams::new().content("note").anchor(AnchorKind::Node, "A"))
        .unwrap();
    assert_eq!(detail.name, "comment");
    assert_eq!(
        graph.anchor(&detail).map(|a| matches!(a, Anchor::Node(n) if n.uid == "A")),
        Some(true)
    );

    let err = graph
        .add_detail(DetailParams::new().anchor(AnchorKind::Node, "L"))
        .unwrap_err();
    assert_eq!(
        err,
        ReferentialError::AnchorNotFound {
            kind: AnchorKind::Node,
            uid: "L".into()
        }
    );

    let mut params = DetailParams::new();
    params.anchor_uid = Some("A".into());
    let err = graph.add_detail(params).unwrap_err();
    assert_eq!(
        err,
        ReferentialError::AnchorTypeMissing {
            anchor_uid: "A".into()
        }
    );
    graph.settle().await;

    assert_eq!(graph.detail_list().len(), 1);
    assert_eq!(transport.requests().len(), before + 1);
    assert_eq!(transport.queries().last().unwrap(), "newdetail");
}

#[tokio::test]
async fn test_attach_detail_stacks_beside_node() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    let first = graph
        .attach_detail(AnchorKind::Node, "A", DetailParams::new(), Dispatch::default())
        .unwrap();
    let second = graph
        .attach_detail(AnchorKind::Node, "A", DetailParams::new(), Dispatch::default())
        .unwrap();

    assert_eq!((first.x, first.y), (38.0, 44.0));
    assert_eq!((second.x, second.y), (38.0, 64.0));
    assert_eq!(graph.detail_list_of(AnchorKind::Node, "A").len(), 2);
    assert_eq!(graph.details_of(AnchorKind::Node, "A").len(), 2);
}

#[tokio::test]
async fn test_attach_detail_on_link_uses_midpoint() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    let detail = graph
        .attach_detail(
            AnchorKind::Link,
            "L",
            DetailParams::new().kind("link"),
            Dispatch::default(),
        )
        .unwrap();
    assert_eq!((detail.x, detail.y), (64.0, 170.0));
    assert_eq!(detail.anchor_type, AnchorKind::Link);

    let err = graph
        .attach_detail(AnchorKind::Link, "A", DetailParams::new(), Dispatch::default())
        .unwrap_err();
    assert!(matches!(err, ReferentialError::AnchorNotFound { .. }));
}

// ── Removal ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_removal_never_cascades() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;
    let detail = graph
        .add_detail(DetailParams::new().anchor(AnchorKind::Node, "A"))
        .unwrap();

    let a = graph.node("A").unwrap();
    assert!(graph.remove_node(&a).is_some());
    assert!(graph.node("A").is_none());
    assert!(graph.node_list().iter().all(|n| n.uid != "A"));
    assert!(!graph.nodes().contains_key("A"));

    let link = graph.link("L").unwrap();
    assert!(graph.origin(&link).is_none());
    assert!(graph.terminus(&link).is_some());
    assert!(graph.detail(&detail.uid).is_some());
    assert!(graph.anchor(&detail).is_none());

    assert!(graph.remove_detail(&detail).is_some());
    assert!(graph.detail(&detail.uid).is_none());
    assert!(graph.remove_detail(&detail).is_none());
    graph.settle().await;

    assert_eq!(
        transport.queries()[4..].to_vec(),
        vec!["newdetail", "delnode", "deldetail", "deldetail"]
    );
}

// ── Dispatch ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_local_dispatch_queues_nothing() {
    let transport = ScriptedTransport::new();
    let graph = graph(&transport);

    graph.add_node_with(NodeParams::new().uid("A"), Dispatch::local());
    graph.add_link_type_with(LinkTypeParams::new(), Dispatch::local());
    graph.settle().await;

    assert!(graph.node("A").is_some());
    assert!(graph.link_type("Links").is_some());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_dispatch_then_receives_response() {
    let transport = ScriptedTransport::new();
    transport.respond(json!({"ok": true}));
    let graph = graph(&transport);
    let received: Arc<Mutex<Option<Value>>> = Arc::default();

    let slot = received.clone();
    graph.add_node_with(
        NodeParams::new(),
        Dispatch::then(move |response| *slot.lock() = Some(response)),
    );
    graph.settle().await;

    assert_eq!(received.lock().clone(), Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_readding_uid_replaces_in_place() {
    let transport = ScriptedTransport::new();
    let graph = graph(&transport);

    graph.add_node(NodeParams::new().uid("A").name("first"));
    graph.add_node(NodeParams::new().uid("B"));
    graph.add_node(NodeParams::new().uid("A").name("second"));

    let names: Vec<String> = graph.node_list().into_iter().map(|n| n.name).collect();
    assert_eq!(names, vec!["second", "Node"]);
}

#[tokio::test]
async fn test_text_is_encoded_on_the_wire() {
    let transport = ScriptedTransport::new();
    let graph = graph(&transport);

    let node = graph.add_node(NodeParams::new().name("Ann%20Lee"));
    graph.settle().await;

    assert_eq!(node.name, "Ann Lee");
    assert_eq!(transport.requests()[0]["name"], "Ann%20Lee");
}

// ── Queries ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_neighbors_and_parallel_links() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;
    node(&graph, "C", 0.0, 0.0);
    link(&graph, "BA", "B", "A", "Friend");
    link(&graph, "CA", "C", "A", "Friend");

    let uids = |nodes: Vec<psynth_core::Node>| -> Vec<String> {
        let mut uids: Vec<String> = nodes.into_iter().map(|n| n.uid).collect();
        uids.sort();
        uids
    };
    assert_eq!(uids(graph.out_neighbors("A")), vec!["B"]);
    assert_eq!(uids(graph.in_neighbors("A")), vec!["B", "C"]);
    assert_eq!(uids(graph.all_neighbors("A")), vec!["B", "B", "C"]);
    assert_eq!(graph.out_links("A").len(), 1);
    assert_eq!(graph.in_links("A").len(), 2);
    assert_eq!(graph.all_links("C").len(), 1);

    let l = graph.link("L").unwrap();
    assert_eq!(graph.parallel(&l).len(), 2);
}

#[tokio::test]
async fn test_extents() {
    let transport = ScriptedTransport::new();
    let graph = graph(&transport);
    assert_eq!(graph.min_x(), None);
    assert_eq!(graph.height(), None);

    node(&graph, "A", 10.0, 20.0);
    node(&graph, "B", 110.0, 320.0);
    node(&graph, "C", -5.0, 100.0);

    assert_eq!(graph.min_x(), Some(-5.0));
    assert_eq!(graph.max_x(), Some(110.0));
    assert_eq!(graph.min_y(), Some(20.0));
    assert_eq!(graph.max_y(), Some(320.0));
    assert_eq!(graph.width(), Some(115.0));
    assert_eq!(graph.height(), Some(300.0));
}

// ── Link types ───────────────────────────────────────────────────

#[tokio::test]
async fn test_update_link_type_renames_links() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;
    graph.add_link_type(LinkTypeParams::new().name("Foe"));
    link(&graph, "L2", "B", "A", "Friend");
    link(&graph, "L3", "A", "B", "Foe");
    graph.settle().await;

    transport.respond(json!({
        "rel_type": {"O_NAME": "Friend", "NAME": "Pal"},
        "rels": {"L": 5, "L2": "7"}
    }));
    let mut friend = graph.link_type("Friend").unwrap();
    friend.name = "Pal".into();
    graph.update_link_type(&friend, Dispatch::default());
    graph.settle().await;

    assert!(graph.link_type("Friend").is_none());
    assert_eq!(graph.link_type("Pal").unwrap().max, 10.0);
    assert_eq!(graph.link("L").unwrap().link_type, "Pal");
    assert_eq!(graph.link("L").unwrap().value, 5.0);
    assert_eq!(graph.link("L2").unwrap().value, 7.0);
    assert_eq!(graph.link("L3").unwrap().link_type, "Foe");
    assert_eq!(transport.requests().last().unwrap()["NAME"], "Pal");
}

// ── Layout and publishing ────────────────────────────────────────

#[tokio::test]
async fn test_draw_moves_only_named_entities() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;
    let detail = graph
        .add_detail(DetailParams::new().uid("D").anchor(AnchorKind::Node, "A"))
        .unwrap();
    graph.settle().await;

    transport.respond(json!({
        "nodes": [{"UID": "A", "X": 100, "Y": "200"}, {"UID": "ghost", "X": 1, "Y": 1}],
        "details": [{"UID": "D", "X": 5, "Y": 6}]
    }));
    graph.draw(None);
    graph.settle().await;

    let a = graph.node("A").unwrap();
    assert_eq!((a.x, a.y), (100.0, 200.0));
    let b = graph.node("B").unwrap();
    assert_eq!((b.x, b.y), (110.0, 320.0));
    let d = graph.detail(&detail.uid).unwrap();
    assert_eq!((d.x, d.y), (5.0, 6.0));
    assert_eq!(graph.node_list().len(), 2);
}

#[tokio::test]
async fn test_draw_skips_malformed_placement() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    transport.respond(json!({
        "nodes": [{"UID": "A", "X": null, "Y": 5}, {"UID": "B", "X": 7, "Y": 8}]
    }));
    graph.draw(None);
    graph.settle().await;

    let a = graph.node("A").unwrap();
    assert_eq!((a.x, a.y), (10.0, 20.0));
    let b = graph.node("B").unwrap();
    assert_eq!((b.x, b.y), (7.0, 8.0));
}

#[tokio::test]
async fn test_publish_sends_corner_and_scale() {
    let transport = ScriptedTransport::new();
    let graph = friends(&transport).await;

    transport.respond(json!("abc%2Fdef"));
    let url: Arc<Mutex<Option<Value>>> = Arc::default();
    let slot = url.clone();
    graph
        .publish(Some(Box::new(move |v| *slot.lock() = Some(v))))
        .unwrap();
    graph.settle().await;

    let request = transport.requests().last().unwrap().clone();
    assert_eq!(request["query"], "publish");
    assert!((request["x"].as_f64().unwrap() - 10.1).abs() < 1e-9);
    assert!((request["y"].as_f64().unwrap() - 20.1).abs() < 1e-9);
    assert!((request["scale"].as_f64().unwrap() - 3.6).abs() < 1e-9);
    assert_eq!(
        url.lock().clone(),
        Some(json!("https://psynth.example.com/p/ublic/abc/def"))
    );
}

#[tokio::test]
async fn test_publish_empty_graph_fails() {
    let transport = ScriptedTransport::new();
    let graph = graph(&transport);

    let err = graph.publish(None).unwrap_err();
    graph.settle().await;

    assert!(matches!(err, GraphError::EmptyGraph));
    assert!(transport.requests().is_empty());
}

// ── Bootstrap ────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_graph() {
    let transport = ScriptedTransport::new();
    transport.respond(json!({"filename": "b8e1241a.gt"}));

    let graph = create_graph(&config(), "My Graph", transport.clone())
        .await
        .unwrap();

    assert_eq!(graph.filename(), "b8e1241a.gt");
    assert_eq!(graph.name(), "My Graph");
    let request = &transport.provisioned()[0];
    assert_eq!(request["query"], "createmap");
    assert_eq!(request["user"], "alice");
    assert_eq!(request["password"], "secret");
    assert_eq!(request["name"], "My Graph");
    assert!(request.get("filename").is_none());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_create_graph_rejected() {
    let transport = ScriptedTransport::new();
    transport.respond(json!("invalid"));

    let result = create_graph(&config(), "My Graph", transport.clone()).await;
    assert!(matches!(result, Err(GraphError::RemoteFailure { ref query }) if query == "createmap"));
}

#[tokio::test]
async fn test_load_graph_restores_locally() {
    let transport = ScriptedTransport::new();
    transport.respond(json!({
        "name": "Team%20Map",
        "rel_types": [
            {"NAME": "Friend", "MAX": 10, "ICON": "default", "TILE": "default", "COLOR": "default"}
        ],
        "nodes": [
            {"NAME": "Ann", "X": "1", "Y": 2, "SHAPE": 6, "RADIUS": 24,
             "COLOR": "default", "PICTURE": "default", "UID": "A"},
            {"NAME": "Bob", "X": 50, "Y": 60, "SHAPE": 0, "RADIUS": 30,
             "COLOR": "#ff0000", "PICTURE": "default", "UID": "B"}
        ],
        "rels": [
            {"NAME": "Friend", "TYPE": "Friend", "VALUE": 3, "ORIGIN": "A", "TERMINUS": "B", "UID": "L1"},
            {"NAME": "Friend", "TYPE": "Friend", "VALUE": 3, "ORIGIN": "A", "TERMINUS": "ghost", "UID": "L2"}
        ],
        "details": [
            {"NAME": "note", "TYPE": "comment", "ANCHOR_UID": "A", "ANCHOR_TYPE": "Node",
             "CONTENT": "hi%20there", "UID": "D1", "X": 0, "Y": 0}
        ]
    }));

    let graph = load_graph(&config(), "team.gt", transport.clone())
        .await
        .unwrap();
    graph.settle().await;

    assert_eq!(graph.name(), "Team Map");
    assert_eq!(graph.filename(), "team.gt");
    assert_eq!(graph.node_list().len(), 2);
    assert_eq!(graph.node("A").unwrap().x, 1.0);
    assert_eq!(graph.node("B").unwrap().color, "#ff0000");
    assert_eq!(graph.link_list().len(), 1);
    assert_eq!(graph.link("L1").unwrap().value, 3.0);
    assert_eq!(graph.link_type("Friend").unwrap().icon, DEFAULT_LINK_TYPE_ICON);
    assert_eq!(graph.detail("D1").unwrap().content, "hi there");

    assert_eq!(transport.queries(), vec!["getwholegraph"]);
    assert_eq!(transport.requests()[0]["filename"], "team.gt");
}

#[tokio::test]
async fn test_load_graph_rejected() {
    let transport = ScriptedTransport::new();
    transport.respond(json!("invalid"));

    let result = load_graph(&config(), "team.gt", transport.clone()).await;
    assert!(matches!(result, Err(GraphError::RemoteFailure { .. })));
}

#[tokio::test]
async fn test_load_graph_transport_error() {
    let transport = ScriptedTransport::new();
    transport.fail_transport("connection refused");

    let result = load_graph(&config(), "team.gt", transport.clone()).await;
    assert!(matches!(result, Err(GraphError::Transport(_))));
}

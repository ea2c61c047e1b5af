//! Tests for the editor session, canvas reducer, and request tracking.
mod common;
use clinic_flow::api::Endpoint;
use clinic_flow::editor::{Interaction, RequestTracker, ZoomConfig};
use clinic_flow::model::TextContent;
use clinic_flow::prelude::*;
use common::*;
use serde_json::json;

fn session() -> EditorSession {
    EditorSession::open(branching_document(), EditorConfig::default())
        .expect("fixture should open")
}

fn down(x: f64, y: f64, target: PointerTarget) -> CanvasEvent {
    CanvasEvent::PointerDown {
        at: Position::new(x, y),
        target,
    }
}

#[test]
fn test_delete_prunes_incoming_connections() {
    let mut session = session();
    session.select(Some("m")).unwrap();

    let removed = session.delete_node("m").unwrap();
    assert_eq!(removed.id, "m");
    assert!(session.workflow().node("m").is_none());
    assert!(
        session
            .workflow()
            .nodes
            .iter()
            .all(|n| n.connections.iter().all(|c| c.target_id != "m")),
        "No connection may still point at the deleted node"
    );
    assert_eq!(session.selected(), None);
    assert!(session.is_dirty());
}

#[test]
fn test_start_and_end_cannot_be_deleted() {
    let mut session = session();
    assert!(matches!(
        session.delete_node("s"),
        Err(EditorError::ProtectedNode { node_type: NodeType::Start, .. })
    ));
    assert!(matches!(
        session.delete_node("e1"),
        Err(EditorError::ProtectedNode { node_type: NodeType::End, .. })
    ));
    assert_eq!(session.workflow().nodes.len(), 5);
    assert!(!session.is_dirty());
}

#[test]
fn test_delete_unknown_node() {
    let mut session = session();
    assert_eq!(
        session.delete_node("nope"),
        Err(EditorError::NodeNotFound("nope".to_string()))
    );
}

#[test]
fn test_add_node_uses_defaults_and_fresh_ids() {
    let mut session = EditorSession::blank("New", EditorConfig::default());
    let first = session.add_node(NodeType::Message, Position::new(10.0, 20.0));
    let second = session.add_node(NodeType::Condition, Position::default());
    assert_eq!(first, "node-1");
    assert_eq!(second, "node-2");

    let message = session.workflow().node(&first).unwrap();
    assert_eq!(message.content.summary(), "New message");
    assert_eq!(message.position, Position::new(10.0, 20.0));
    assert_eq!(output_ids(&session.ports(&second).unwrap()), vec!["continue", "end"]);
}

#[test]
fn test_add_node_skips_taken_ids() {
    let document = WorkflowDocument::from_json_str(
        r#"{ "nodes": [
            { "id": "node-1", "type": "START" },
            { "id": "node-2", "type": "END" }
        ] }"#,
    )
    .unwrap();
    let mut session = EditorSession::open(document, EditorConfig::default()).unwrap();
    assert_eq!(session.add_node(NodeType::Delay, Position::default()), "node-3");
}

#[test]
fn test_editing_condition_rederives_ports() {
    let mut session = session();
    let ports = session
        .set_field("c", "condition", json!("morning|afternoon|evening"))
        .unwrap();
    assert_eq!(output_ids(&ports), vec!["morning", "afternoon", "evening"]);
    assert_eq!(session.ports("c").unwrap(), ports);

    let ports = session
        .set_field("c", "condition", json!("service_selection"))
        .unwrap();
    assert_eq!(output_ids(&ports), vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_set_field_rejects_mistyped_values() {
    let mut session = session();
    let result = session.set_field("c", "condition", json!(42));
    assert!(matches!(result, Err(EditorError::InvalidContent { ref id, .. }) if id == "c"));
    assert_eq!(session.workflow().node("c").unwrap().content.condition(), Some("yes|no"));
}

#[test]
fn test_set_field_keeps_unmodelled_keys() {
    let mut session = session();
    session.set_field("m", "buttons", json!(["A", "B"])).unwrap();
    session.set_field("m", "text", json!("Pick one")).unwrap();

    let node = session.workflow().node("m").unwrap();
    assert_eq!(node.content.summary(), "Pick one");
    assert_eq!(node.extra.get("buttons"), Some(&json!(["A", "B"])));
}

#[test]
fn test_replace_content_checks_type() {
    let mut session = session();
    let wrong = NodeContent::Message(TextContent {
        text: Some("Hi".to_string()),
    });
    assert!(matches!(
        session.replace_content("c", wrong.clone()),
        Err(EditorError::InvalidContent { .. })
    ));
    let ports = session.replace_content("m", wrong).unwrap();
    assert_eq!(output_ids(&ports), vec!["main"]);
}

#[test]
fn test_connect_and_disconnect() {
    let mut session = session();
    let node = session.add_node(NodeType::Message, Position::default());
    let edge = session.connect("c", "yes", &node, Some("confirmed".to_string())).unwrap();

    let graph = session.canvas_graph();
    let created = graph.edges.iter().find(|e| e.id == edge).unwrap();
    assert_eq!(created.source_port, "yes");
    assert_eq!(created.condition.as_deref(), Some("confirmed"));

    let again = session.connect("c", "yes", &node, None).unwrap();
    assert_eq!(again, edge, "Re-adding a link returns the existing edge");

    let removed = session.disconnect(&edge).unwrap();
    assert_eq!(removed.target_id, node);
    assert_eq!(
        session.disconnect(&edge),
        Err(EditorError::EdgeNotFound(edge.clone()))
    );
}

#[test]
fn test_reconnect_replaces_condition() {
    let mut session = session();
    let node = session.add_node(NodeType::Message, Position::default());
    let edge = session.connect("c", "yes", &node, Some("first".to_string())).unwrap();

    let again = session.connect("c", "yes", &node, Some("second".to_string())).unwrap();
    assert_eq!(again, edge);
    let c = session.workflow().node("c").unwrap();
    let links: Vec<_> = c.connections.iter().filter(|l| l.target_id == node).collect();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].condition.as_deref(), Some("second"));

    session.connect("c", "yes", &node, None).unwrap();
    let c = session.workflow().node("c").unwrap();
    assert!(c.connections.iter().all(|l| l.target_id != node || l.condition.is_none()));
}

#[test]
fn test_connect_rejects_invalid_links() {
    let mut session = session();
    assert!(matches!(
        session.connect("m", "main", "m", None),
        Err(EditorError::InvalidConnection { .. })
    ));
    assert!(matches!(
        session.connect("c", "maybe", "e1", None),
        Err(EditorError::InvalidConnection { .. })
    ));
    assert!(matches!(
        session.connect("e1", "main", "m", None),
        Err(EditorError::InvalidConnection { .. })
    ));
    assert_eq!(
        session.connect("m", "main", "ghost", None),
        Err(EditorError::NodeNotFound("ghost".to_string()))
    );
}

#[test]
fn test_starter_links_are_addressable() {
    let mut session = EditorSession::blank("Fresh", EditorConfig::default());
    let edges = session.workflow().edges();
    assert_eq!(edges.len(), 1);
    let id = edges[0].id.clone().unwrap();
    assert!(session.disconnect(&id).is_ok());
}

#[test]
fn test_auto_layout_moves_nodes() {
    let mut session = session();
    session.auto_layout();
    let c = session.workflow().node("c").unwrap();
    assert_eq!(c.position, Position::new(100.0, 460.0));
}

#[test]
fn test_drag_moves_node_by_grab_offset() {
    let state = CanvasState::default();
    let (state, effect) = state.reduce(&down(
        110.0,
        105.0,
        PointerTarget::NodeBody {
            node_id: "m".to_string(),
            origin: Position::new(100.0, 100.0),
        },
    ));
    assert_eq!(effect, None);

    let (state, effect) = state.reduce(&CanvasEvent::PointerMove {
        at: Position::new(210.0, 155.0),
    });
    assert_eq!(
        effect,
        Some(Effect::NodeMoved {
            node_id: "m".to_string(),
            position: Position::new(200.0, 150.0),
        })
    );

    let (state, effect) = state.reduce(&CanvasEvent::PointerUp {
        at: Position::new(210.0, 155.0),
    });
    assert_eq!(
        effect,
        Some(Effect::NodeDropped {
            node_id: "m".to_string()
        })
    );
    assert_eq!(state.interaction, Interaction::Idle);
}

#[test]
fn test_pan_follows_pointer() {
    let state = CanvasState::default();
    let (state, _) = state.reduce(&down(0.0, 0.0, PointerTarget::Canvas));
    let (state, effect) = state.reduce(&CanvasEvent::PointerMove {
        at: Position::new(30.0, -20.0),
    });
    assert_eq!(effect, Some(Effect::Panned(Position::new(30.0, -20.0))));
    assert_eq!(state.viewport.pan, Position::new(30.0, -20.0));

    let (state, _) = state.reduce(&CanvasEvent::PointerUp {
        at: Position::new(30.0, -20.0),
    });
    assert_eq!(state.interaction, Interaction::Idle);
}

#[test]
fn test_connection_completes_on_input_port() {
    let state = CanvasState::default();
    let (state, _) = state.reduce(&down(
        0.0,
        0.0,
        PointerTarget::OutputPort {
            node_id: "c".to_string(),
            port: "yes".to_string(),
        },
    ));
    assert!(matches!(state.interaction, Interaction::DrawingConnection { .. }));

    let (state, effect) = state.reduce(&down(
        50.0,
        50.0,
        PointerTarget::InputPort {
            node_id: "e1".to_string(),
        },
    ));
    assert_eq!(
        effect,
        Some(Effect::ConnectionRequested {
            source_id: "c".to_string(),
            port: "yes".to_string(),
            target_id: "e1".to_string(),
        })
    );
    assert_eq!(state.interaction, Interaction::Idle);
}

#[test]
fn test_connection_cancelled_elsewhere() {
    let state = CanvasState::default();
    let (state, _) = state.reduce(&down(
        0.0,
        0.0,
        PointerTarget::OutputPort {
            node_id: "c".to_string(),
            port: "yes".to_string(),
        },
    ));
    let (state, effect) = state.reduce(&down(80.0, 80.0, PointerTarget::Canvas));
    assert_eq!(effect, Some(Effect::ConnectionCancelled));
    assert_eq!(state.interaction, Interaction::Idle);
}

#[test]
fn test_zoom_is_clamped() {
    let mut state = CanvasState::default();
    for _ in 0..30 {
        state = state.reduce(&CanvasEvent::Wheel { delta_y: -120.0 }).0;
    }
    assert_eq!(state.viewport.zoom, 2.0);
    assert_eq!(state.reduce(&CanvasEvent::ZoomIn).1, None);

    for _ in 0..30 {
        state = state.reduce(&CanvasEvent::ZoomOut).0;
    }
    assert_eq!(state.viewport.zoom, 0.4);
}

#[test]
fn test_wheel_steps_by_configured_amount() {
    let state = CanvasState::default();
    let (state, effect) = state.reduce(&CanvasEvent::Wheel { delta_y: 100.0 });
    assert_eq!(effect, Some(Effect::Zoomed(0.9)));
    let (_, effect) = state.reduce(&CanvasEvent::Wheel { delta_y: 0.0 });
    assert_eq!(effect, None);

    let custom = CanvasState::new(ZoomConfig {
        min: 0.5,
        max: 1.5,
        step: 0.25,
    });
    let (_, effect) = custom.reduce(&CanvasEvent::ZoomIn);
    assert_eq!(effect, Some(Effect::Zoomed(1.25)));
}

#[test]
fn test_session_applies_canvas_effects() {
    let mut session = session();
    session
        .handle(&down(
            5.0,
            5.0,
            PointerTarget::NodeBody {
                node_id: "m".to_string(),
                origin: Position::new(0.0, 0.0),
            },
        ))
        .unwrap();
    session
        .handle(&CanvasEvent::PointerMove {
            at: Position::new(105.0, 55.0),
        })
        .unwrap();
    session
        .handle(&CanvasEvent::PointerUp {
            at: Position::new(105.0, 55.0),
        })
        .unwrap();
    assert_eq!(
        session.workflow().node("m").unwrap().position,
        Position::new(100.0, 50.0)
    );
    assert_eq!(session.selected(), Some("m"));

    let node = session.add_node(NodeType::Message, Position::default());
    session
        .handle(&down(
            0.0,
            0.0,
            PointerTarget::OutputPort {
                node_id: "c".to_string(),
                port: "no".to_string(),
            },
        ))
        .unwrap();
    session
        .handle(&down(0.0, 0.0, PointerTarget::InputPort { node_id: node.clone() }))
        .unwrap();
    let c = session.workflow().node("c").unwrap();
    assert!(c.connections.iter().any(|conn| conn.target_id == node && conn.port == "no"));
}

#[test]
fn test_newer_request_supersedes_older() {
    let mut tracker = RequestTracker::new();
    let first = tracker.begin(RequestKind::Load);
    let second = tracker.begin(RequestKind::Load);
    assert!(!tracker.accept(&first), "Superseded response must be ignored");
    assert!(tracker.accept(&second));
    assert!(!tracker.accept(&second), "A response is applied at most once");
}

#[test]
fn test_kinds_are_tracked_independently() {
    let mut tracker = RequestTracker::new();
    let load = tracker.begin(RequestKind::Load);
    let save = tracker.begin(RequestKind::Save);
    assert!(tracker.pending(RequestKind::Load));
    assert!(tracker.accept(&save));
    assert!(tracker.accept(&load));
    assert!(!tracker.pending(RequestKind::Load));
}

#[test]
fn test_closed_tracker_rejects_everything() {
    let mut tracker = RequestTracker::new();
    let ticket = tracker.begin(RequestKind::TestRun);
    tracker.close();
    assert!(tracker.is_closed());
    assert!(!tracker.accept(&ticket));
}

#[test]
fn test_stale_reload_is_ignored() {
    let mut session = session();
    let stale = session.begin_reload();
    let fresh = session.begin_reload();

    let mut other = branching_document();
    other.name = "Renamed".to_string();
    assert_eq!(session.apply_reload(&stale, other.clone()), Ok(false));
    assert_eq!(session.workflow().name, "Branching");
    assert_eq!(session.apply_reload(&fresh, other), Ok(true));
    assert_eq!(session.workflow().name, "Renamed");
}

#[test]
fn test_responses_after_close_are_ignored() {
    let mut session = session();
    let pending = session.prepare_save().unwrap();
    session.close();
    assert!(!session.complete_save(&pending, Some("wf-1".to_string())));
    assert_eq!(session.workflow().id, None);
}

#[test]
fn test_new_workflow_is_created_inactive() {
    let mut session = EditorSession::blank("Fresh", EditorConfig::default());
    session.set_active(true);

    let pending = session.prepare_save().unwrap();
    assert_eq!(pending.request.endpoint(), Endpoint::Create);
    assert!(!pending.request.payload().is_active);
    assert_eq!(pending.request.payload().kind, "SUPPORT");

    assert!(session.complete_save(&pending, Some("wf-9".to_string())));
    assert_eq!(session.workflow().id.as_deref(), Some("wf-9"));
    assert!(!session.is_dirty());

    let update = session.prepare_save().unwrap();
    assert_eq!(update.request.endpoint(), Endpoint::Update("wf-9".to_string()));
    assert!(update.request.payload().is_active);
}

#[test]
fn test_edit_during_save_keeps_session_dirty() {
    let mut session = session();
    session.set_field("m", "text", json!("Before")).unwrap();
    let pending = session.prepare_save().unwrap();

    session.set_field("m", "text", json!("After")).unwrap();
    assert!(session.complete_save(&pending, Some("wf-1".to_string())));
    assert!(
        session.is_dirty(),
        "An edit made after the request was built is still unsaved"
    );

    let next = session.prepare_save().unwrap();
    assert!(session.complete_save(&next, None));
    assert!(!session.is_dirty());
}

#[test]
fn test_missing_end_blocks_save() {
    let document = WorkflowDocument::from_json_str(
        r#"{ "nodes": [ { "id": "s", "type": "START" } ] }"#,
    )
    .unwrap();
    let mut session = EditorSession::open(document, EditorConfig::default()).unwrap();
    assert_eq!(
        session.prepare_save(),
        Err(EditorError::Validation(vec![ValidationIssue::MissingEnd]))
    );
}

#[test]
fn test_unknown_port_does_not_block_save() {
    let mut session = session();
    // Narrowing the branches orphans the existing `no` link.
    session.set_field("c", "condition", json!("yes|maybe")).unwrap();
    let pending = session.prepare_save().unwrap();
    assert_eq!(pending.request.payload().config.edges.len(), 4);
}

#[test]
fn test_save_payload_carries_edges_and_conditions() {
    let mut session = session();
    session
        .connect("c", "yes", "m", Some("retry".to_string()))
        .unwrap();
    let pending = session.prepare_save().unwrap();
    let payload = serde_json::to_value(pending.request.payload()).unwrap();

    let edges = payload["config"]["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 5);
    assert!(
        edges
            .iter()
            .any(|e| e["data"]["port"] == json!("yes") && e["data"]["condition"] == json!("retry"))
    );
    assert!(
        payload["config"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .all(|n| n["content"].get("ports").is_none())
    );
}

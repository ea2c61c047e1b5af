//! Common test utilities for building workflows and documents.
use clinic_flow::model::ConditionContent;
use clinic_flow::prelude::*;

/// The five-node branching workflow: START -> MESSAGE -> CONDITION(yes|no) -> two ENDs.
///
/// START links with a bare id and MESSAGE with an object lacking a port, so
/// both forms of connection are exercised.
#[allow(dead_code)]
pub const BRANCHING_WORKFLOW_JSON: &str = r#"{
    "name": "Branching",
    "nodes": [
        { "id": "s", "type": "START", "connections": ["m"] },
        { "id": "m", "type": "MESSAGE", "connections": [{ "targetId": "c" }] },
        {
            "id": "c",
            "type": "CONDITION",
            "content": { "condition": "yes|no" },
            "connections": [
                { "targetId": "e1", "port": "yes" },
                { "targetId": "e2", "port": "no" }
            ]
        },
        { "id": "e1", "type": "END" },
        { "id": "e2", "type": "END" }
    ]
}"#;

/// A stored record whose config is a JSON-encoded string with an edge list,
/// including a legacy `output` port and conditions in both edge locations.
#[allow(dead_code)]
pub const STORED_RECORD_JSON: &str = r#"{
    "id": "wf-42",
    "name": "Appointments",
    "description": "Books visits",
    "isActive": true,
    "config": "{\"nodes\":[{\"id\":\"start\",\"type\":\"START\",\"data\":{\"text\":\"Hello\"},\"position\":{\"x\":0,\"y\":0}},{\"id\":\"ask\",\"type\":\"CONDITION\",\"data\":{\"condition\":\"clinic_selection\"},\"position\":{\"x\":0,\"y\":180}},{\"id\":\"a\",\"type\":\"MESSAGE\",\"data\":{\"text\":\"Clinic A\"}},{\"id\":\"end\",\"type\":\"END\"}],\"edges\":[{\"id\":\"e1\",\"source\":\"start\",\"target\":\"ask\",\"data\":{\"port\":\"output\"}},{\"id\":\"e2\",\"source\":\"ask\",\"target\":\"a\",\"data\":{\"port\":\"true\",\"condition\":\"north\"}},{\"id\":\"e3\",\"source\":\"ask\",\"target\":\"end\",\"sourceHandle\":\"false\",\"condition\":\"south\"},{\"id\":\"e4\",\"source\":\"a\",\"target\":\"end\"}]}"
}"#;

#[allow(dead_code)]
pub fn branching_document() -> WorkflowDocument {
    WorkflowDocument::from_json_str(BRANCHING_WORKFLOW_JSON).expect("fixture should parse")
}

#[allow(dead_code)]
pub fn branching_workflow() -> Workflow {
    GraphConverter::default()
        .load(branching_document())
        .expect("fixture should resolve")
}

/// Builds a CONDITION node with the given branch expression.
#[allow(dead_code)]
pub fn condition_node(id: &str, condition: &str) -> WorkflowNode {
    WorkflowNode::new(
        id,
        NodeContent::Condition(ConditionContent {
            condition: Some(condition.to_string()),
        }),
    )
}

/// START -> A -> B, START -> C, plus an unreachable D.
#[allow(dead_code)]
pub fn layered_nodes() -> Vec<WorkflowNode> {
    vec![
        WorkflowNode::with_type("start", NodeType::Start)
            .connect(Connection::to("a"))
            .connect(Connection::to("c")),
        WorkflowNode::with_type("a", NodeType::Message).connect(Connection::to("b")),
        WorkflowNode::with_type("b", NodeType::End),
        WorkflowNode::with_type("c", NodeType::Message).connect(Connection::to("b")),
        WorkflowNode::with_type("d", NodeType::Message),
    ]
}

/// Collects `(source, target, port, condition)` for every canvas edge.
#[allow(dead_code)]
pub fn edge_tuples(edges: &[CanvasEdge]) -> Vec<(String, String, String, Option<String>)> {
    edges
        .iter()
        .map(|e| {
            (
                e.source.clone(),
                e.target.clone(),
                e.source_port.clone(),
                e.condition.clone(),
            )
        })
        .collect()
}

/// Collects `(source, target, port, condition)` for every node connection.
#[allow(dead_code)]
pub fn connection_tuples(nodes: &[WorkflowNode]) -> Vec<(String, String, String, Option<String>)> {
    nodes
        .iter()
        .flat_map(|n| {
            n.connections.iter().map(move |c| {
                (
                    n.id.clone(),
                    c.target_id.clone(),
                    c.port.clone(),
                    c.condition.clone(),
                )
            })
        })
        .collect()
}

/// Output port ids of a port list, in order.
#[allow(dead_code)]
pub fn output_ids(ports: &[Port]) -> Vec<String> {
    ports
        .iter()
        .filter(|p| p.direction == PortDirection::Output)
        .map(|p| p.id.clone())
        .collect()
}

/// Every port id, input included, in order.
#[allow(dead_code)]
pub fn port_ids(ports: &[Port]) -> Vec<String> {
    ports.iter().map(|p| p.id.clone()).collect()
}

/// Shorthand for an expected `(source, target, port, condition)` tuple.
#[allow(dead_code)]
pub fn link(
    source: &str,
    target: &str,
    port: &str,
    condition: Option<&str>,
) -> (String, String, String, Option<String>) {
    (
        source.to_string(),
        target.to_string(),
        port.to_string(),
        condition.map(str::to_string),
    )
}

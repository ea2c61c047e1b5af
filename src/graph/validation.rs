use crate::error::ValidationIssue;
use crate::model::{derive_ports, NodeType, Port, WorkflowNode};
use ahash::AHashSet;

/// Checks the structural rules a workflow must satisfy before it is saved.
///
/// Every problem is collected rather than stopping at the first one.
pub fn validate(nodes: &[WorkflowNode]) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let starts: Vec<String> = nodes
        .iter()
        .filter(|n| n.node_type() == NodeType::Start)
        .map(|n| n.id.clone())
        .collect();
    match starts.len() {
        0 => issues.push(ValidationIssue::MissingStart),
        1 => {}
        _ => issues.push(ValidationIssue::MultipleStarts(starts)),
    }
    if !nodes.iter().any(|n| n.node_type() == NodeType::End) {
        issues.push(ValidationIssue::MissingEnd);
    }

    let mut ids = AHashSet::with_capacity(nodes.len());
    for node in nodes {
        if !ids.insert(node.id.as_str()) {
            issues.push(ValidationIssue::DuplicateNodeId(node.id.clone()));
        }
    }

    for node in nodes {
        let outputs: Vec<Port> = derive_ports(&node.content)
            .into_iter()
            .filter(Port::is_output)
            .collect();
        for conn in &node.connections {
            if !ids.contains(conn.target_id.as_str()) {
                issues.push(ValidationIssue::DanglingLink {
                    source_id: node.id.clone(),
                    target_id: conn.target_id.clone(),
                });
            }
            if !outputs.iter().any(|p| p.id == conn.port) {
                issues.push(ValidationIssue::UnknownSourcePort {
                    source_id: node.id.clone(),
                    port: conn.port.clone(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

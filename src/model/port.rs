//! Port derivation.
//!
//! Ports are never stored. They are recomputed from a node's type and content
//! whenever the content changes, so a CONDITION node whose branch expression is
//! edited immediately exposes the matching set of output ports.

use super::connection::{INPUT_PORT, MAIN_PORT};
use super::content::NodeContent;
use serde::{Deserialize, Serialize};

/// Condition keyword that routes between two clinics.
pub const CLINIC_SELECTION: &str = "clinic_selection";
/// Condition keyword that routes a numbered five-option service menu.
pub const SERVICE_SELECTION: &str = "service_selection";
/// Output port of a CONDITION node with no branch tokens.
pub const CONDITION_FALLBACK_PORT: &str = "output";

const GPT_INTENTS: [(&str, &str); 5] = [
    ("1", "Prices"),
    ("2", "Insurance"),
    ("3", "Location"),
    ("4", "Explanation"),
    ("5", "Schedule"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    Top,
    Bottom,
}

/// A named connection point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub direction: PortDirection,
    pub position: PortSide,
}

impl Port {
    pub fn input() -> Self {
        Self {
            id: INPUT_PORT.to_string(),
            label: "Input".to_string(),
            direction: PortDirection::Input,
            position: PortSide::Top,
        }
    }

    pub fn output(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            direction: PortDirection::Output,
            position: PortSide::Bottom,
        }
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }
}

/// Computes the ports of a node from its content.
///
/// Every node gets exactly one `input` port first, followed by its output ports
/// in a fixed order. Pure: equal content always yields equal ports.
pub fn derive_ports(content: &NodeContent) -> Vec<Port> {
    let mut ports = vec![Port::input()];
    match content {
        NodeContent::End(_) => {}
        NodeContent::Condition(c) => ports.extend(condition_outputs(c.condition.as_deref())),
        NodeContent::GptResponse(_) => ports.extend(
            GPT_INTENTS
                .iter()
                .map(|(id, label)| Port::output(*id, *label)),
        ),
        NodeContent::Start(_)
        | NodeContent::Message(_)
        | NodeContent::Action(_)
        | NodeContent::DataCollection(_)
        | NodeContent::CollectInfo(_)
        | NodeContent::TransferHuman(_)
        | NodeContent::Delay(_)
        | NodeContent::Webhook(_)
        | NodeContent::ApiCall(_)
        | NodeContent::Other { .. } => ports.push(Port::output(MAIN_PORT, "Output")),
    }
    ports
}

/// Output ports of a CONDITION node for a given branch expression.
pub fn condition_outputs(condition: Option<&str>) -> Vec<Port> {
    let condition = condition.unwrap_or_default();
    match condition {
        CLINIC_SELECTION => vec![Port::output("true", "True"), Port::output("false", "False")],
        SERVICE_SELECTION => (1..=5)
            .map(|n| Port::output(n.to_string(), n.to_string()))
            .collect(),
        c if c.contains('|') => branch_tokens(c)
            .map(|token| Port::output(token, token))
            .collect(),
        _ => vec![Port::output(CONDITION_FALLBACK_PORT, "Output")],
    }
}

/// The trimmed, non-empty `|`-separated tokens of a branch expression.
pub fn branch_tokens(condition: &str) -> impl Iterator<Item = &str> {
    condition
        .split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Whether `content` exposes an output port named `port`.
pub fn has_output_port(content: &NodeContent, port: &str) -> bool {
    derive_ports(content)
        .iter()
        .any(|p| p.is_output() && p.id == port)
}

use super::connection::{Connection, MAIN_PORT};
use super::content::{ContentMap, NodeContent, TextContent};
use super::node::{NodeType, Position, WorkflowNode};
use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use std::fs;

/// A node as exchanged with the workflow API.
///
/// The payload may arrive under `content` or under `data`; `position` and
/// `connections` are optional on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, alias = "data")]
    pub content: ContentMap,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl From<PersistedNode> for WorkflowNode {
    fn from(raw: PersistedNode) -> Self {
        let mut node = WorkflowNode::from_raw(raw.id, raw.node_type, &raw.content);
        node.position = raw.position;
        node.connections = raw.connections;
        node
    }
}

impl From<&WorkflowNode> for PersistedNode {
    fn from(node: &WorkflowNode) -> Self {
        PersistedNode {
            id: node.id.clone(),
            node_type: node.node_type(),
            content: node.content_map(),
            position: node.position,
            connections: node.connections.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// An edge as exchanged with the workflow API.
///
/// Older payloads put the port in `sourceHandle` or `port` and the condition
/// at the top level; `data` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: EdgeData,
    #[serde(default, skip_serializing)]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing)]
    pub port: Option<String>,
    #[serde(default, skip_serializing)]
    pub condition: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl PersistedEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            data: EdgeData::default(),
            source_handle: None,
            port: None,
            condition: None,
            edge_type: None,
            animated: None,
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.data.port = Some(port.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.data.condition = Some(condition.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The source port from whichever field carries it, defaulting to `main`.
    pub fn resolved_port(&self) -> String {
        [&self.data.port, &self.source_handle, &self.port]
            .into_iter()
            .flatten()
            .find(|p| !p.is_empty())
            .cloned()
            .unwrap_or_else(|| MAIN_PORT.to_string())
    }

    /// The branch condition from whichever field carries it.
    pub fn resolved_condition(&self) -> Option<String> {
        [&self.data.condition, &self.condition]
            .into_iter()
            .flatten()
            .find(|c| !c.is_empty())
            .cloned()
    }
}

/// The `config` object stored with a workflow: `{ nodes, edges }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    #[serde(default)]
    pub edges: Vec<PersistedEdge>,
}

/// A workflow in its loose file/API form, before links are resolved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<PersistedEdge>>,
    #[serde(default)]
    pub is_active: bool,
}

impl WorkflowDocument {
    pub fn from_json_str(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &str) -> Result<Self, PayloadError> {
        let json = fs::read_to_string(path).map_err(|e| PayloadError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }
}

/// The editor's working copy of a workflow.
///
/// Node connections are the single source of truth for the graph; the flat
/// edge list is always derived from them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workflow {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub nodes: Vec<WorkflowNode>,
    pub is_active: bool,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A new, unsaved workflow holding just a welcome START node wired to an END node.
    pub fn starter(name: impl Into<String>) -> Self {
        let start = WorkflowNode::new(
            "start",
            NodeContent::Start(TextContent {
                text: Some("Welcome!".to_string()),
            }),
        )
        .at(100.0, 100.0)
        .connect(Connection::to("end"));
        let end = WorkflowNode::with_type("end", NodeType::End).at(100.0, 280.0);
        Self {
            nodes: vec![start, end],
            ..Self::new(name)
        }
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn start_node(&self) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.node_type() == NodeType::Start)
    }

    /// The flat edge list derived from node connections, in node then
    /// connection order.
    pub fn edges(&self) -> Vec<PersistedEdge> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.connections
                    .iter()
                    .enumerate()
                    .map(move |(idx, conn)| {
                        let id = conn
                            .edge_id
                            .clone()
                            .unwrap_or_else(|| edge_id(&node.id, &conn.target_id, idx));
                        let mut edge = PersistedEdge::new(&node.id, &conn.target_id)
                            .with_id(id)
                            .with_port(&conn.port);
                        edge.data.condition = conn.condition.clone();
                        edge
                    })
            })
            .collect()
    }

    pub fn config(&self) -> WorkflowConfig {
        WorkflowConfig {
            nodes: self.nodes.iter().map(PersistedNode::from).collect(),
            edges: self.edges(),
        }
    }

    /// The loose document form with both connection and edge views filled in.
    pub fn to_document(&self) -> WorkflowDocument {
        let config = self.config();
        WorkflowDocument {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: config.nodes,
            edges: Some(config.edges),
            is_active: self.is_active,
        }
    }
}

/// Deterministic id for an edge with no stored id.
pub fn edge_id(source: &str, target: &str, index: usize) -> String {
    format!("e_{}_{}_{}", source, target, index)
}

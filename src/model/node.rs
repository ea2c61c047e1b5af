use super::connection::Connection;
use super::content::{ContentMap, NodeContent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The behavioural type of a workflow node.
///
/// Types outside the known set are kept verbatim in `Other` so that a workflow
/// authored by a newer backend still loads and saves without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Start,
    Message,
    Condition,
    Action,
    GptResponse,
    DataCollection,
    CollectInfo,
    TransferHuman,
    Delay,
    End,
    Webhook,
    ApiCall,
    Other(String),
}

impl NodeType {
    /// Every known node type, in palette order.
    pub const KNOWN: [NodeType; 12] = [
        NodeType::Start,
        NodeType::Message,
        NodeType::Condition,
        NodeType::Action,
        NodeType::GptResponse,
        NodeType::DataCollection,
        NodeType::CollectInfo,
        NodeType::TransferHuman,
        NodeType::Delay,
        NodeType::End,
        NodeType::Webhook,
        NodeType::ApiCall,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Start => "START",
            NodeType::Message => "MESSAGE",
            NodeType::Condition => "CONDITION",
            NodeType::Action => "ACTION",
            NodeType::GptResponse => "GPT_RESPONSE",
            NodeType::DataCollection => "DATA_COLLECTION",
            NodeType::CollectInfo => "COLLECT_INFO",
            NodeType::TransferHuman => "TRANSFER_HUMAN",
            NodeType::Delay => "DELAY",
            NodeType::End => "END",
            NodeType::Webhook => "WEBHOOK",
            NodeType::ApiCall => "API_CALL",
            NodeType::Other(name) => name,
        }
    }

    /// START and END anchor the workflow and may never be deleted.
    pub fn is_protected(&self) -> bool {
        matches!(self, NodeType::Start | NodeType::End)
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        match value {
            "START" => NodeType::Start,
            "MESSAGE" => NodeType::Message,
            "CONDITION" => NodeType::Condition,
            "ACTION" => NodeType::Action,
            "GPT_RESPONSE" => NodeType::GptResponse,
            "DATA_COLLECTION" => NodeType::DataCollection,
            "COLLECT_INFO" => NodeType::CollectInfo,
            "TRANSFER_HUMAN" => NodeType::TransferHuman,
            "DELAY" => NodeType::Delay,
            "END" => NodeType::End,
            "WEBHOOK" => NodeType::Webhook,
            "API_CALL" => NodeType::ApiCall,
            other => NodeType::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        NodeType::from(value.as_str())
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node in its persisted form: typed content, position, and the outgoing
/// connections that make up the canonical adjacency of the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    pub id: String,
    pub content: NodeContent,
    /// Content keys the typed payload does not model, kept for round-tripping.
    pub extra: ContentMap,
    pub position: Position,
    pub connections: Vec<Connection>,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, content: NodeContent) -> Self {
        Self {
            id: id.into(),
            content,
            extra: ContentMap::new(),
            position: Position::default(),
            connections: Vec::new(),
        }
    }

    /// Creates a node of the given type with its default content.
    pub fn with_type(id: impl Into<String>, node_type: NodeType) -> Self {
        Self::new(id, NodeContent::default_for(&node_type))
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn connect(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.content.node_type()
    }

    /// Builds a node from a wire type name and raw content object.
    pub fn from_raw(id: impl Into<String>, node_type: NodeType, raw: &ContentMap) -> Self {
        let (content, extra) = NodeContent::from_map(&node_type, raw);
        Self {
            id: id.into(),
            content,
            extra,
            position: Position::default(),
            connections: Vec::new(),
        }
    }

    /// The full content object: pass-through keys overlaid with the typed payload.
    pub fn content_map(&self) -> ContentMap {
        let mut map = self.extra.clone();
        map.extend(self.content.to_map());
        map
    }
}

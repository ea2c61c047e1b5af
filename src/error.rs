use crate::model::NodeType;
use thiserror::Error;

/// Errors raised while converting between the persisted and canvas graph forms.
///
/// These only surface when the converter runs in strict mode; the permissive
/// default drops the offending link and logs a warning instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Link '{edge_id}' from '{source_id}' to '{target_id}' references a node that does not exist")]
    DanglingLink {
        edge_id: String,
        source_id: String,
        target_id: String,
    },

    #[error("Node id '{0}' is used by more than one node")]
    DuplicateNodeId(String),
}

/// A single structural problem found by `graph::validate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Workflow has no START node")]
    MissingStart,

    #[error("Workflow has more than one START node: {}", .0.join(", "))]
    MultipleStarts(Vec<String>),

    #[error("Workflow has no END node")]
    MissingEnd,

    #[error("Node id '{0}' is used by more than one node")]
    DuplicateNodeId(String),

    #[error("Connection from '{source_id}' points to missing node '{target_id}'")]
    DanglingLink {
        source_id: String,
        target_id: String,
    },

    #[error("Connection from '{source_id}' leaves through unknown port '{port}'")]
    UnknownSourcePort { source_id: String, port: String },
}

impl ValidationIssue {
    /// Whether the issue prevents a save. An unknown source port only means
    /// the link no longer matches the node's current branches.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ValidationIssue::UnknownSourcePort { .. })
    }
}

/// Errors produced by editor session operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Node '{id}' of type {node_type} is protected and cannot be removed")]
    ProtectedNode { id: String, node_type: NodeType },

    #[error("Node '{0}' not found in the session")]
    NodeNotFound(String),

    #[error("Edge '{0}' not found in the session")]
    EdgeNotFound(String),

    #[error("Cannot connect '{source_id}' to '{target_id}': {reason}")]
    InvalidConnection {
        source_id: String,
        target_id: String,
        reason: String,
    },

    #[error("Invalid content for node '{id}': {message}")]
    InvalidContent { id: String, message: String },

    #[error("Workflow failed validation: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors raised while reading or building API payloads and config files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error("Invalid workflow config: {0}")]
    InvalidConfig(String),

    #[error("Could not read '{path}': {message}")]
    Io { path: String, message: String },
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        PayloadError::Json(err.to_string())
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//! Prelude module for convenient imports
//!
//! Re-exports the types most editor integrations touch.
//!
//! ```rust,no_run
//! use clinic_flow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/workflow.json")?;
//! let document = WorkflowDocument::from_json_str(&json)?;
//! let workflow = GraphConverter::default().load(document)?;
//!
//! let canvas = to_canvas_graph(&workflow.nodes, None);
//! println!("{} nodes, {} edges", canvas.nodes.len(), canvas.edges.len());
//! # Ok(())
//! # }
//! ```

// Workflow model
pub use crate::model::{
    derive_ports, Connection, ContentMap, NodeContent, NodeType, Port, PortDirection, Position,
    Workflow, WorkflowDocument, WorkflowNode,
};

// Graph conversion, layout, and validation
pub use crate::graph::{
    layout_by_bfs, to_canvas_graph, to_persisted_graph, validate, CanvasEdge, CanvasGraph,
    CanvasNode, GraphConverter, LayoutConfig,
};

// Editing
pub use crate::config::EditorConfig;
pub use crate::editor::{
    CanvasEvent, CanvasState, EditorSession, Effect, PointerTarget, RequestKind, RequestTicket,
};

// API payloads
pub use crate::api::{Endpoint, SaveRequest, WorkflowRecord};

// Error types
pub use crate::error::{EditorError, GraphError, PayloadError, ValidationIssue};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

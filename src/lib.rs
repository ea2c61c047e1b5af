//! # Clinic Flow - Conversational Workflow Editor Core
//!
//! **Clinic Flow** is the model and editing engine behind a visual builder for
//! chat-bot workflows. A workflow is a directed graph of typed nodes (START,
//! MESSAGE, CONDITION, GPT_RESPONSE, ...) that drives automated patient
//! conversations. This crate owns everything the editor needs short of
//! drawing pixels and talking HTTP.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse a workflow document from the API or a file into a
//!     `WorkflowDocument`. Node payloads may arrive under `content` or `data`,
//!     and links as node connections, a flat edge list, or both.
//! 2.  **Resolve**: A `GraphConverter` rebuilds the canonical adjacency. Node
//!     connections are the single source of truth; the edge list is derived.
//! 3.  **Edit**: An `EditorSession` applies node and link edits, folds pointer
//!     and wheel events through a pure reducer, and re-derives ports whenever
//!     content changes.
//! 4.  **Save**: `prepare_save` validates the graph and builds the create or
//!     update request. Stale responses are recognised by their ticket and ignored.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clinic_flow::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let document = WorkflowDocument::from_file("workflow.json")?;
//!     let mut session = EditorSession::open(document, EditorConfig::default())?;
//!
//!     // Drop a CONDITION node and wire it after START.
//!     let branch = session.add_node(NodeType::Condition, Position::new(300.0, 200.0));
//!     session.set_field(&branch, "condition", serde_json::json!("yes|no"))?;
//!     session.connect("start", "main", &branch, None)?;
//!
//!     for port in session.ports(&branch)? {
//!         println!("{} ({:?})", port.id, port.direction);
//!     }
//!
//!     session.auto_layout();
//!     let pending = session.prepare_save()?;
//!     println!("{} {}", pending.request.endpoint(), pending.request.to_json()?);
//!
//!     // ...send the request, then report the outcome back.
//!     session.complete_save(&pending, Some("wf-1".to_string()));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod graph;
pub mod model;
pub mod prelude;

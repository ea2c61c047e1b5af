use super::requests::{RequestKind, RequestTicket, RequestTracker};
use super::viewport::{CanvasEvent, CanvasState, Effect};
use crate::api::SaveRequest;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::graph::{layout_by_bfs, project, validate, CanvasGraph};
use crate::model::{
    derive_ports, edge_id, has_output_port, Connection, NodeContent, NodeType, Port, Position,
    Workflow, WorkflowDocument, WorkflowNode,
};
use serde_json::Value;

/// A save that has been handed to the caller for sending.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub ticket: RequestTicket,
    pub request: SaveRequest,
    /// Edit revision the request was built from.
    pub revision: u64,
}

/// The editor's in-memory working copy of one workflow plus its canvas state.
///
/// Nothing is persisted until `prepare_save` produces a request and the caller
/// reports back through `complete_save`.
#[derive(Debug)]
pub struct EditorSession {
    workflow: Workflow,
    config: EditorConfig,
    canvas: CanvasState,
    selected: Option<String>,
    next_node: u64,
    dirty: bool,
    revision: u64,
    requests: RequestTracker,
}

impl EditorSession {
    pub fn new(mut workflow: Workflow, config: EditorConfig) -> Self {
        assign_edge_ids(&mut workflow.nodes);
        Self {
            workflow,
            canvas: CanvasState::new(config.zoom),
            config,
            selected: None,
            next_node: 1,
            dirty: false,
            revision: 0,
            requests: RequestTracker::new(),
        }
    }

    /// Opens a session on a loaded document, resolving its links.
    pub fn open(document: WorkflowDocument, config: EditorConfig) -> Result<Self, EditorError> {
        let workflow = config.converter().load(document)?;
        Ok(Self::new(workflow, config))
    }

    /// A session on a brand-new, unsaved workflow.
    pub fn blank(name: impl Into<String>, config: EditorConfig) -> Self {
        let mut session = Self::new(Workflow::starter(name), config);
        session.touch();
        session
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas_state(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn canvas_graph(&self) -> CanvasGraph {
        project(&self.workflow.nodes)
    }

    pub fn ports(&self, node_id: &str) -> Result<Vec<Port>, EditorError> {
        Ok(derive_ports(&self.node(node_id)?.content))
    }

    /// Drops a new node of `node_type` with its default content at `position`.
    pub fn add_node(&mut self, node_type: NodeType, position: Position) -> String {
        let id = loop {
            let candidate = format!("node-{}", self.next_node);
            self.next_node += 1;
            if self.workflow.node(&candidate).is_none() {
                break candidate;
            }
        };
        let node = WorkflowNode::with_type(&id, node_type).at(position.x, position.y);
        self.workflow.nodes.push(node);
        self.touch();
        id
    }

    /// Replaces a node's content and returns its re-derived ports.
    pub fn replace_content(
        &mut self,
        node_id: &str,
        content: NodeContent,
    ) -> Result<Vec<Port>, EditorError> {
        let node = self.node_mut(node_id)?;
        if content.node_type() != node.node_type() {
            return Err(EditorError::InvalidContent {
                id: node_id.to_string(),
                message: format!(
                    "expected {} content, got {}",
                    node.node_type(),
                    content.node_type()
                ),
            });
        }
        node.content = content;
        let ports = derive_ports(&node.content);
        self.touch();
        Ok(ports)
    }

    /// Sets one content key, as a property panel edit does, and returns the
    /// re-derived ports.
    pub fn set_field(
        &mut self,
        node_id: &str,
        key: &str,
        value: Value,
    ) -> Result<Vec<Port>, EditorError> {
        let node = self.node_mut(node_id)?;
        let mut map = node.content_map();
        map.insert(key.to_string(), value);
        let (content, extra) = NodeContent::try_from_map(&node.node_type(), &map).map_err(|e| {
            EditorError::InvalidContent {
                id: node_id.to_string(),
                message: e.to_string(),
            }
        })?;
        node.content = content;
        node.extra = extra;
        let ports = derive_ports(&node.content);
        self.touch();
        Ok(ports)
    }

    /// Removes a node and every connection that points at it.
    pub fn delete_node(&mut self, node_id: &str) -> Result<WorkflowNode, EditorError> {
        let index = self
            .workflow
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))?;
        let node_type = self.workflow.nodes[index].node_type();
        if node_type.is_protected() {
            return Err(EditorError::ProtectedNode {
                id: node_id.to_string(),
                node_type,
            });
        }

        let removed = self.workflow.nodes.remove(index);
        for node in self.workflow.nodes.iter_mut() {
            node.connections.retain(|c| c.target_id != node_id);
        }
        if self.selected.as_deref() == Some(node_id) {
            self.selected = None;
        }
        self.touch();
        Ok(removed)
    }

    /// Links `source_id`'s output `port` to `target_id`'s input and returns
    /// the edge id.
    ///
    /// Re-adding an existing `(source, port, target)` link returns the existing
    /// edge id. If `condition` differs from the stored one, the link's
    /// condition is replaced with it.
    pub fn connect(
        &mut self,
        source_id: &str,
        port: &str,
        target_id: &str,
        condition: Option<String>,
    ) -> Result<String, EditorError> {
        let invalid = |reason: &str| EditorError::InvalidConnection {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            reason: reason.to_string(),
        };
        if source_id == target_id {
            return Err(invalid("a node cannot connect to itself"));
        }
        self.node(target_id)?;
        let source = self.node(source_id)?;
        if !has_output_port(&source.content, port) {
            return Err(invalid(&format!("source has no output port '{}'", port)));
        }
        let condition = condition.filter(|c| !c.is_empty());
        let existing = source
            .connections
            .iter()
            .position(|c| c.target_id == target_id && c.port == port && c.edge_id.is_some());
        if let Some(index) = existing {
            let link = &mut self.node_mut(source_id)?.connections[index];
            let id = link.edge_id.clone().unwrap_or_default();
            if link.condition != condition {
                link.condition = condition;
                self.touch();
            }
            return Ok(id);
        }

        let id = self.unused_edge_id(source_id, target_id);
        let mut connection = Connection::to(target_id).via(port).with_edge_id(&id);
        connection.condition = condition;
        self.node_mut(source_id)?.connections.push(connection);
        self.touch();
        Ok(id)
    }

    /// Removes the link with the given edge id.
    pub fn disconnect(&mut self, edge_id: &str) -> Result<Connection, EditorError> {
        let removed = self.workflow.nodes.iter_mut().find_map(|node| {
            node.connections
                .iter()
                .position(|c| c.edge_id.as_deref() == Some(edge_id))
                .map(|pos| node.connections.remove(pos))
        });
        match removed {
            Some(connection) => {
                self.touch();
                Ok(connection)
            }
            None => Err(EditorError::EdgeNotFound(edge_id.to_string())),
        }
    }

    pub fn move_node(&mut self, node_id: &str, position: Position) -> Result<(), EditorError> {
        self.node_mut(node_id)?.position = position;
        self.touch();
        Ok(())
    }

    pub fn auto_layout(&mut self) {
        layout_by_bfs(&mut self.workflow.nodes, &self.config.layout);
        self.touch();
    }

    pub fn select(&mut self, node_id: Option<&str>) -> Result<(), EditorError> {
        if let Some(id) = node_id {
            self.node(id)?;
        }
        self.selected = node_id.map(str::to_string);
        Ok(())
    }

    pub fn set_active(&mut self, active: bool) {
        if self.workflow.is_active != active {
            self.workflow.is_active = active;
            self.touch();
        }
    }

    /// Feeds a canvas event through the interaction reducer and applies
    /// whatever it produced to the workflow.
    pub fn handle(&mut self, event: &CanvasEvent) -> Result<Option<Effect>, EditorError> {
        let (next, effect) = self.canvas.reduce(event);
        self.canvas = next;
        match &effect {
            Some(Effect::NodeMoved { node_id, position }) => self.move_node(node_id, *position)?,
            Some(Effect::NodeDropped { node_id }) => self.select(Some(node_id.as_str()))?,
            Some(Effect::ConnectionRequested {
                source_id,
                port,
                target_id,
            }) => {
                self.connect(source_id, port, target_id, None)?;
            }
            Some(Effect::ConnectionCancelled | Effect::Panned(_) | Effect::Zoomed(_)) | None => {}
        }
        Ok(effect)
    }

    /// Validates the workflow and builds the create-or-update request.
    ///
    /// A workflow missing its START or END node is never sent.
    pub fn prepare_save(&mut self) -> Result<PendingSave, EditorError> {
        if let Err(issues) = validate(&self.workflow.nodes) {
            let (blocking, advisory): (Vec<_>, Vec<_>) =
                issues.into_iter().partition(|i| i.is_blocking());
            for issue in &advisory {
                tracing::warn!(issue = %issue, "saving workflow with advisory issue");
            }
            if !blocking.is_empty() {
                return Err(EditorError::Validation(blocking));
            }
        }

        let request = SaveRequest::for_workflow(&self.workflow);
        let ticket = self.requests.begin(RequestKind::Save);
        tracing::info!(
            endpoint = %request.endpoint(),
            nodes = self.workflow.nodes.len(),
            "prepared workflow save"
        );
        Ok(PendingSave {
            ticket,
            request,
            revision: self.revision,
        })
    }

    /// Records the outcome of a save. Returns `false` when the response is
    /// stale and was ignored.
    ///
    /// The session stays dirty if it was edited after the request was built.
    pub fn complete_save(&mut self, pending: &PendingSave, persisted_id: Option<String>) -> bool {
        if !self.requests.accept(&pending.ticket) {
            return false;
        }
        if self.workflow.id.is_none() {
            self.workflow.id = persisted_id;
        }
        if pending.revision == self.revision {
            self.dirty = false;
        }
        true
    }

    pub fn begin_reload(&mut self) -> RequestTicket {
        self.requests.begin(RequestKind::Load)
    }

    /// Replaces the working copy with a freshly fetched document, unless the
    /// response is stale. Returns whether it was applied.
    pub fn apply_reload(
        &mut self,
        ticket: &RequestTicket,
        document: WorkflowDocument,
    ) -> Result<bool, EditorError> {
        if !self.requests.accept(ticket) {
            return Ok(false);
        }
        self.workflow = self.config.converter().load(document)?;
        if self
            .selected
            .as_deref()
            .is_some_and(|id| self.workflow.node(id).is_none())
        {
            self.selected = None;
        }
        self.dirty = false;
        self.revision += 1;
        Ok(true)
    }

    pub fn begin_request(&mut self, kind: RequestKind) -> RequestTicket {
        self.requests.begin(kind)
    }

    pub fn accept_response(&mut self, ticket: &RequestTicket) -> bool {
        self.requests.accept(ticket)
    }

    /// Ends the session; responses still in flight will be ignored.
    pub fn close(&mut self) {
        self.requests.close();
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    fn node(&self, node_id: &str) -> Result<&WorkflowNode, EditorError> {
        self.workflow
            .node(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))
    }

    fn node_mut(&mut self, node_id: &str) -> Result<&mut WorkflowNode, EditorError> {
        self.workflow
            .node_mut(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))
    }

    fn unused_edge_id(&self, source_id: &str, target_id: &str) -> String {
        let taken: Vec<&str> = self
            .workflow
            .nodes
            .iter()
            .flat_map(|n| n.connections.iter())
            .filter_map(|c| c.edge_id.as_deref())
            .collect();
        let mut index = self
            .workflow
            .node(source_id)
            .map_or(0, |n| n.connections.len());
        loop {
            let id = edge_id(source_id, target_id, index);
            if !taken.contains(&id.as_str()) {
                return id;
            }
            index += 1;
        }
    }
}

/// Gives every connection without one the deterministic edge id, so that each
/// link in a session can be addressed by id.
fn assign_edge_ids(nodes: &mut [WorkflowNode]) {
    for node in nodes.iter_mut() {
        for (idx, conn) in node.connections.iter_mut().enumerate() {
            if conn.edge_id.is_none() {
                conn.edge_id = Some(edge_id(&node.id, &conn.target_id, idx));
            }
        }
    }
}

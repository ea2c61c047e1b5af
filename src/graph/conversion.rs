use crate::error::GraphError;
use crate::model::{
    derive_ports, edge_id, CANVAS_KEYS, Connection, ContentMap, NodeType, PersistedEdge, Port,
    Position, Workflow, WorkflowDocument, WorkflowNode, INPUT_PORT, MAIN_PORT,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Renderer-side payload of a node: its full content plus type and derived ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNodeData {
    #[serde(flatten)]
    pub content: ContentMap,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub position: Position,
    pub data: CanvasNodeData,
}

/// A renderer edge. The target port is always the node's single `input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    #[serde(rename = "sourceHandle")]
    pub source_port: String,
    pub target: String,
    #[serde(rename = "targetHandle")]
    pub target_port: String,
    #[serde(rename = "label", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasGraph {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

/// Converts between persisted workflows and the canvas graph.
///
/// In the default permissive mode links to unknown nodes are dropped with a
/// warning. A strict converter reports the first such problem as an error.
#[derive(Debug, Clone)]
pub struct GraphConverter {
    strict: bool,
    port_aliases: AHashMap<String, String>,
}

pub struct GraphConverterBuilder {
    strict: bool,
    port_aliases: AHashMap<String, String>,
}

impl GraphConverterBuilder {
    pub fn new() -> Self {
        let mut port_aliases = AHashMap::new();
        port_aliases.insert("output".to_string(), MAIN_PORT.to_string());
        Self {
            strict: false,
            port_aliases,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Renames a legacy source port on edges leaving non-CONDITION nodes.
    pub fn with_port_alias(mut self, legacy: &str, port: &str) -> Self {
        self.port_aliases
            .insert(legacy.to_string(), port.to_string());
        self
    }

    pub fn build(self) -> GraphConverter {
        GraphConverter {
            strict: self.strict,
            port_aliases: self.port_aliases,
        }
    }
}

impl Default for GraphConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for GraphConverter {
    fn default() -> Self {
        GraphConverterBuilder::new().build()
    }
}

/// Result of resolving links: the surviving nodes and everything dropped.
struct Resolved {
    nodes: Vec<WorkflowNode>,
    dropped: Vec<GraphError>,
}

impl GraphConverter {
    pub fn builder() -> GraphConverterBuilder {
        GraphConverterBuilder::new()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Rebuilds every node's connections into the canonical adjacency.
    ///
    /// A non-empty `edges` list is authoritative and replaces node
    /// connections; otherwise the nodes' own connections are kept.
    pub fn resolve(
        &self,
        nodes: Vec<WorkflowNode>,
        edges: Option<&[PersistedEdge]>,
    ) -> Result<Vec<WorkflowNode>, GraphError> {
        let resolved = self.resolve_links(nodes, edges);
        self.finish(resolved.dropped)?;
        Ok(resolved.nodes)
    }

    /// Turns a loose document into the editor's working copy.
    pub fn load(&self, document: WorkflowDocument) -> Result<Workflow, GraphError> {
        let nodes = document
            .nodes
            .into_iter()
            .map(WorkflowNode::from)
            .collect();
        let nodes = self.resolve(nodes, document.edges.as_deref())?;
        Ok(Workflow {
            id: document.id,
            name: document.name,
            description: document.description,
            nodes,
            is_active: document.is_active,
        })
    }

    pub fn to_canvas_graph(
        &self,
        nodes: &[WorkflowNode],
        edges: Option<&[PersistedEdge]>,
    ) -> Result<CanvasGraph, GraphError> {
        let nodes = self.resolve(nodes.to_vec(), edges)?;
        Ok(project(&nodes))
    }

    pub fn to_persisted_graph(
        &self,
        canvas_nodes: &[CanvasNode],
        canvas_edges: &[CanvasEdge],
    ) -> Result<Vec<WorkflowNode>, GraphError> {
        let resolved = self.collect_from_canvas(canvas_nodes, canvas_edges);
        self.finish(resolved.dropped)?;
        Ok(resolved.nodes)
    }

    fn finish(&self, dropped: Vec<GraphError>) -> Result<(), GraphError> {
        match dropped.into_iter().next() {
            Some(err) if self.strict => Err(err),
            _ => Ok(()),
        }
    }

    fn resolve_links(
        &self,
        mut nodes: Vec<WorkflowNode>,
        edges: Option<&[PersistedEdge]>,
    ) -> Resolved {
        let (index, mut dropped) = index_nodes(&nodes);

        match edges.filter(|e| !e.is_empty()) {
            Some(edges) => {
                for node in nodes.iter_mut() {
                    node.connections.clear();
                }
                for (idx, edge) in edges.iter().enumerate() {
                    let id = edge
                        .id
                        .clone()
                        .unwrap_or_else(|| edge_id(&edge.source, &edge.target, idx));
                    let (Some(&src), true) = (
                        index.get(edge.source.as_str()),
                        index.contains_key(edge.target.as_str()),
                    ) else {
                        dropped.push(dangling(&id, &edge.source, &edge.target));
                        continue;
                    };
                    let port = self.normalize_port(&nodes[src].node_type(), edge.resolved_port());
                    let mut connection = Connection::to(&edge.target).via(port).with_edge_id(id);
                    connection.condition = edge.resolved_condition();
                    nodes[src].connections.push(connection);
                }
            }
            None => {
                for node in nodes.iter_mut() {
                    let source_id = node.id.clone();
                    let connections = std::mem::take(&mut node.connections);
                    for (idx, mut conn) in connections.into_iter().enumerate() {
                        let id = conn
                            .edge_id
                            .clone()
                            .unwrap_or_else(|| edge_id(&source_id, &conn.target_id, idx));
                        if !index.contains_key(conn.target_id.as_str()) {
                            dropped.push(dangling(&id, &source_id, &conn.target_id));
                            continue;
                        }
                        conn.edge_id = Some(id);
                        node.connections.push(conn);
                    }
                }
            }
        }

        for err in &dropped {
            tracing::warn!(error = %err, "dropping link while resolving workflow graph");
        }
        tracing::debug!(
            nodes = nodes.len(),
            links = nodes.iter().map(|n| n.connections.len()).sum::<usize>(),
            dropped = dropped.len(),
            "resolved workflow links"
        );
        Resolved { nodes, dropped }
    }

    fn collect_from_canvas(
        &self,
        canvas_nodes: &[CanvasNode],
        canvas_edges: &[CanvasEdge],
    ) -> Resolved {
        let mut nodes: Vec<WorkflowNode> = canvas_nodes
            .iter()
            .map(|cn| {
                let mut node =
                    WorkflowNode::from_raw(&cn.id, cn.data.node_type.clone(), &cn.data.content);
                node.position = cn.position;
                node
            })
            .collect();
        let (index, mut dropped) = index_nodes(&nodes);

        // Iterating in canvas order groups edges under their source node while
        // keeping each node's outgoing order stable.
        for edge in canvas_edges {
            let (Some(&src), true) = (
                index.get(edge.source.as_str()),
                index.contains_key(edge.target.as_str()),
            ) else {
                dropped.push(dangling(&edge.id, &edge.source, &edge.target));
                continue;
            };
            let port = if edge.source_port.is_empty() {
                MAIN_PORT.to_string()
            } else {
                edge.source_port.clone()
            };
            let mut connection = Connection::to(&edge.target)
                .via(port)
                .with_edge_id(&edge.id);
            connection.condition = edge.condition.clone().filter(|c| !c.is_empty());
            nodes[src].connections.push(connection);
        }

        for err in &dropped {
            tracing::warn!(error = %err, "dropping canvas edge while rebuilding connections");
        }
        Resolved { nodes, dropped }
    }

    fn normalize_port(&self, source_type: &NodeType, port: String) -> String {
        if *source_type == NodeType::Condition {
            return port;
        }
        self.port_aliases.get(&port).cloned().unwrap_or(port)
    }
}

/// Projects canonical nodes onto the renderer graph.
pub fn project(nodes: &[WorkflowNode]) -> CanvasGraph {
    let canvas_nodes = nodes
        .iter()
        .map(|node| {
            let node_type = node.node_type();
            let mut content = node.content_map();
            content.retain(|key, _| !CANVAS_KEYS.contains(&key.as_str()));
            CanvasNode {
                id: node.id.clone(),
                position: node.position,
                data: CanvasNodeData {
                    content,
                    label: node_type.to_string(),
                    node_type,
                    ports: derive_ports(&node.content),
                },
            }
        })
        .collect();
    let canvas_edges = edges_from_connections(nodes);
    tracing::debug!(
        nodes = nodes.len(),
        edges = canvas_edges.len(),
        "projected workflow onto canvas"
    );
    CanvasGraph {
        nodes: canvas_nodes,
        edges: canvas_edges,
    }
}

/// Walks every node's connections in order and emits one canvas edge each.
pub fn edges_from_connections(nodes: &[WorkflowNode]) -> Vec<CanvasEdge> {
    nodes
        .iter()
        .flat_map(|node| {
            node.connections.iter().enumerate().map(move |(idx, conn)| CanvasEdge {
                id: conn
                    .edge_id
                    .clone()
                    .unwrap_or_else(|| edge_id(&node.id, &conn.target_id, idx)),
                source: node.id.clone(),
                source_port: conn.port.clone(),
                target: conn.target_id.clone(),
                target_port: INPUT_PORT.to_string(),
                condition: conn.condition.clone(),
            })
        })
        .collect()
}

/// Persisted → canvas with the permissive default converter.
pub fn to_canvas_graph(nodes: &[WorkflowNode], edges: Option<&[PersistedEdge]>) -> CanvasGraph {
    let resolved = GraphConverter::default().resolve_links(nodes.to_vec(), edges);
    project(&resolved.nodes)
}

/// Canvas → persisted with the permissive default converter.
pub fn to_persisted_graph(
    canvas_nodes: &[CanvasNode],
    canvas_edges: &[CanvasEdge],
) -> Vec<WorkflowNode> {
    GraphConverter::default()
        .collect_from_canvas(canvas_nodes, canvas_edges)
        .nodes
}

/// Maps node ids to their position. Later duplicates of an id are reported
/// and never resolved as link endpoints.
fn index_nodes(nodes: &[WorkflowNode]) -> (AHashMap<String, usize>, Vec<GraphError>) {
    let mut index = AHashMap::with_capacity(nodes.len());
    let mut errors = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if index.contains_key(node.id.as_str()) {
            errors.push(GraphError::DuplicateNodeId(node.id.clone()));
            continue;
        }
        index.insert(node.id.clone(), i);
    }
    (index, errors)
}

fn dangling(edge_id: &str, source: &str, target: &str) -> GraphError {
    GraphError::DanglingLink {
        edge_id: edge_id.to_string(),
        source_id: source.to_string(),
        target_id: target.to_string(),
    }
}

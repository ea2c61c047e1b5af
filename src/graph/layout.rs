use crate::model::{NodeType, WorkflowNode};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Grid spacing for the auto-layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub base_x: f64,
    pub base_y: f64,
    pub col_width: f64,
    pub row_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_x: 100.0,
            base_y: 100.0,
            col_width: 240.0,
            row_height: 180.0,
        }
    }
}

/// Assigns each node its level: hop distance from the START node.
///
/// Levels are returned in node order. Nodes START cannot reach share the
/// level below the deepest reached one; with no START every node is level 0.
pub fn assign_levels(nodes: &[WorkflowNode]) -> Vec<usize> {
    let mut index: AHashMap<&str, usize> = AHashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }

    let mut levels: Vec<Option<usize>> = vec![None; nodes.len()];
    let Some(start) = nodes.iter().position(|n| n.node_type() == NodeType::Start) else {
        tracing::debug!("no START node, placing every node on level 0");
        return vec![0; nodes.len()];
    };

    let mut queue = VecDeque::from([start]);
    levels[start] = Some(0);
    while let Some(current) = queue.pop_front() {
        let next_level = levels[current].unwrap_or_default() + 1;
        for conn in &nodes[current].connections {
            let Some(&target) = index.get(conn.target_id.as_str()) else {
                continue;
            };
            if levels[target].is_none() {
                levels[target] = Some(next_level);
                queue.push_back(target);
            }
        }
    }

    let orphan_level = levels.iter().flatten().max().map_or(0, |max| max + 1);
    let orphans = levels.iter().filter(|l| l.is_none()).count();
    if orphans > 0 {
        tracing::warn!(orphans, orphan_level, "nodes unreachable from START");
    }
    levels
        .into_iter()
        .map(|level| level.unwrap_or(orphan_level))
        .collect()
}

/// Positions every node on a grid by BFS level.
///
/// Rows are levels; within a row nodes keep their order in `nodes`.
pub fn layout_by_bfs(nodes: &mut [WorkflowNode], config: &LayoutConfig) {
    let levels = assign_levels(nodes);
    let mut columns: AHashMap<usize, usize> = AHashMap::new();
    for (node, level) in nodes.iter_mut().zip(levels) {
        let column = columns.entry(level).or_insert(0);
        node.position.x = config.base_x + *column as f64 * config.col_width;
        node.position.y = config.base_y + level as f64 * config.row_height;
        *column += 1;
    }
    tracing::debug!(
        nodes = nodes.len(),
        rows = columns.len(),
        "applied BFS layout"
    );
}

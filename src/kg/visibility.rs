use std::collections::{BTreeSet, HashSet};

use super::graph::{GraphSnapshot, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Hierarchical,
    Flat,
}

/// Entity types switched off in the legend. Types not listed are active, so
/// categories first seen in a refreshed snapshot start visible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    hidden: BTreeSet<String>,
}

impl CategoryFilter {
    pub fn is_active(&self, entity_type: &str) -> bool {
        !self.hidden.contains(entity_type)
    }

    pub fn set_active(&mut self, entity_type: &str, active: bool) {
        if active {
            self.hidden.remove(entity_type);
        } else {
            self.hidden.insert(entity_type.to_owned());
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }
}

/// Rendered subset of a snapshot, in snapshot order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleGraph {
    nodes: Vec<usize>,
    edges: Vec<usize>,
    node_mask: Vec<bool>,
    edge_mask: Vec<bool>,
}

impl VisibleGraph {
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    pub fn contains_node(&self, node: usize) -> bool {
        self.node_mask.get(node).copied().unwrap_or(false)
    }

    pub fn contains_edge(&self, edge: usize) -> bool {
        self.edge_mask.get(edge).copied().unwrap_or(false)
    }
}

pub fn visible(
    snapshot: &GraphSnapshot,
    expanded: &HashSet<String>,
    categories: &CategoryFilter,
    mode: ViewMode,
) -> VisibleGraph {
    let mut node_mask = vec![false; snapshot.node_count()];
    let mut nodes = Vec::new();

    for (index, node) in snapshot.nodes().iter().enumerate() {
        let candidate = match mode {
            ViewMode::Flat => true,
            ViewMode::Hierarchical => match node.effective_kind() {
                NodeKind::Collection => true,
                NodeKind::Document | NodeKind::Entity => {
                    snapshot.owners(index).iter().any(|&owner| {
                        snapshot
                            .node(owner)
                            .is_some_and(|owner| expanded.contains(&owner.id))
                    })
                }
            },
        };

        let passes_category = node
            .entity_type
            .as_deref()
            .is_none_or(|entity_type| categories.is_active(entity_type));

        if candidate && passes_category {
            node_mask[index] = true;
            nodes.push(index);
        }
    }

    let mut edge_mask = vec![false; snapshot.edge_count()];
    let mut edges = Vec::new();
    for edge in 0..snapshot.edge_count() {
        let Some((source, target)) = snapshot.endpoints(edge) else {
            continue;
        };
        if node_mask[source] && node_mask[target] {
            edge_mask[edge] = true;
            edges.push(edge);
        }
    }

    VisibleGraph {
        nodes,
        edges,
        node_mask,
        edge_mask,
    }
}

/// Expansion applied after a fresh hierarchical load.
pub fn default_expanded(snapshot: &GraphSnapshot, auto_expand: bool) -> HashSet<String> {
    if !auto_expand {
        return HashSet::new();
    }
    snapshot.collection_ids().map(str::to_owned).collect()
}

use crate::kg::{GraphSnapshot, VisibleGraph};

use super::HighlightSet;

/// The node, every visible edge touching it, and the far end of each.
pub(super) fn collect_neighborhood(
    snapshot: &GraphSnapshot,
    visible: &VisibleGraph,
    node: usize,
) -> HighlightSet {
    let mut set = HighlightSet::default();
    if !visible.contains_node(node) {
        return set;
    }

    set.nodes.insert(node);
    for &edge in snapshot.incident_edges(node) {
        if !visible.contains_edge(edge) {
            continue;
        }
        let Some((source, target)) = snapshot.endpoints(edge) else {
            continue;
        };

        set.links.insert(edge);
        set.nodes.insert(if source == node { target } else { source });
    }

    set
}

pub(super) fn collect_link(
    snapshot: &GraphSnapshot,
    visible: &VisibleGraph,
    edge: usize,
) -> HighlightSet {
    let mut set = HighlightSet::default();
    if !visible.contains_edge(edge) {
        return set;
    }

    if let Some((source, target)) = snapshot.endpoints(edge) {
        set.links.insert(edge);
        set.nodes.insert(source);
        set.nodes.insert(target);
    }
    set
}

use std::collections::HashSet;

use crate::kg::{GraphSnapshot, VisibleGraph};

mod collect;

use self::collect::{collect_link, collect_neighborhood};

/// Derived highlight; recomputed whole on every pointer or selection event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct HighlightSet {
    pub(crate) nodes: HashSet<usize>,
    pub(crate) links: HashSet<usize>,
}

impl HighlightSet {
    pub(crate) fn is_active(&self) -> bool {
        !self.nodes.is_empty() || !self.links.is_empty()
    }

    pub(crate) fn contains_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    pub(crate) fn contains_link(&self, edge: usize) -> bool {
        self.links.contains(&edge)
    }
}

/// Pointer and selection inputs the highlight is derived from. Indices refer
/// to the current snapshot.
#[derive(Clone, Debug, Default)]
pub(crate) struct HighlightEngine {
    hovered_node: Option<usize>,
    hovered_link: Option<usize>,
    selected: Option<usize>,
}

impl HighlightEngine {
    pub(crate) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(crate) fn hovered_node(&self) -> Option<usize> {
        self.hovered_node
    }

    pub(crate) fn hovered_link(&self) -> Option<usize> {
        self.hovered_link
    }

    pub(crate) fn on_hover(
        &mut self,
        node: Option<usize>,
        snapshot: &GraphSnapshot,
        visible: &VisibleGraph,
    ) -> HighlightSet {
        self.hovered_node = node;
        if node.is_some() {
            self.hovered_link = None;
        }
        self.recompute(snapshot, visible)
    }

    pub(crate) fn on_link_hover(
        &mut self,
        edge: Option<usize>,
        snapshot: &GraphSnapshot,
        visible: &VisibleGraph,
    ) -> HighlightSet {
        self.hovered_link = edge;
        self.recompute(snapshot, visible)
    }

    pub(crate) fn on_node_select(
        &mut self,
        node: Option<usize>,
        snapshot: &GraphSnapshot,
        visible: &VisibleGraph,
    ) -> HighlightSet {
        self.selected = node;
        self.recompute(snapshot, visible)
    }

    /// Selection wins over hover; node hover wins over link hover.
    pub(crate) fn recompute(&self, snapshot: &GraphSnapshot, visible: &VisibleGraph) -> HighlightSet {
        if let Some(selected) = self.selected {
            return collect_neighborhood(snapshot, visible, selected);
        }
        if let Some(hovered) = self.hovered_node {
            return collect_neighborhood(snapshot, visible, hovered);
        }
        if let Some(edge) = self.hovered_link {
            return collect_link(snapshot, visible, edge);
        }
        HighlightSet::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::kg::{
        CategoryFilter, GraphEdge, GraphNode, NodeKind, RelationKind, ViewMode, visible,
    };

    fn star() -> (GraphSnapshot, VisibleGraph) {
        let nodes = ["X", "Y", "Z", "W"]
            .into_iter()
            .map(|id| GraphNode::new(id, Some(NodeKind::Entity), id))
            .collect();
        let edges = vec![
            GraphEdge::new("X", "Y", RelationKind::Generic),
            GraphEdge::new("Z", "X", RelationKind::Generic),
            GraphEdge::new("Y", "W", RelationKind::Generic),
        ];
        let snapshot = GraphSnapshot::load(nodes, edges);
        let view = visible(&snapshot, &HashSet::new(), &CategoryFilter::default(), ViewMode::Flat);
        (snapshot, view)
    }

    fn index(snapshot: &GraphSnapshot, id: &str) -> usize {
        snapshot.index_of(id).unwrap()
    }

    #[test]
    fn hovering_highlights_direct_neighborhood_and_clears_on_leave() {
        let (snapshot, view) = star();
        let mut engine = HighlightEngine::default();

        let set = engine.on_hover(Some(index(&snapshot, "X")), &snapshot, &view);

        let expected_nodes = ["X", "Y", "Z"]
            .into_iter()
            .map(|id| index(&snapshot, id))
            .collect::<HashSet<_>>();
        assert_eq!(set.nodes, expected_nodes);
        assert_eq!(set.links, HashSet::from([0, 1]));

        let cleared = engine.on_hover(None, &snapshot, &view);
        assert!(!cleared.is_active());
    }

    #[test]
    fn selection_suppresses_hover_until_deselected() {
        let (snapshot, view) = star();
        let mut engine = HighlightEngine::default();
        let w = index(&snapshot, "W");

        let selected = engine.on_node_select(Some(w), &snapshot, &view);
        assert!(selected.contains_node(w));
        assert!(selected.contains_node(index(&snapshot, "Y")));
        assert_eq!(selected.links, HashSet::from([2]));

        let while_hovering = engine.on_hover(Some(index(&snapshot, "X")), &snapshot, &view);
        assert_eq!(while_hovering, selected);

        let deselected = engine.on_node_select(None, &snapshot, &view);
        assert_eq!(deselected.nodes.len(), 3, "hover on X applies again");

        engine.on_hover(None, &snapshot, &view);
        assert!(!engine.recompute(&snapshot, &view).is_active());
    }

    #[test]
    fn selection_covers_every_node_one_edge_away() {
        let (snapshot, view) = star();
        let mut engine = HighlightEngine::default();
        let x = index(&snapshot, "X");

        let set = engine.on_node_select(Some(x), &snapshot, &view);

        assert!(set.contains_node(x));
        for &edge in snapshot.incident_edges(x) {
            let (source, target) = snapshot.endpoints(edge).unwrap();
            assert!(set.contains_node(source) && set.contains_node(target));
            assert!(set.contains_link(edge));
        }
        assert!(!set.contains_node(index(&snapshot, "W")));
    }

    #[test]
    fn link_hover_highlights_both_endpoints() {
        let (snapshot, view) = star();
        let mut engine = HighlightEngine::default();

        let set = engine.on_link_hover(Some(2), &snapshot, &view);

        assert_eq!(set.links, HashSet::from([2]));
        assert_eq!(
            set.nodes,
            HashSet::from([index(&snapshot, "Y"), index(&snapshot, "W")])
        );
    }

    #[test]
    fn hidden_neighbors_are_not_highlighted() {
        let nodes = vec![
            GraphNode::new("X", Some(NodeKind::Entity), "X").with_entity_type("device"),
            GraphNode::new("Y", Some(NodeKind::Entity), "Y").with_entity_type("person"),
        ];
        let snapshot = GraphSnapshot::load(nodes, vec![GraphEdge::new("X", "Y", RelationKind::Generic)]);
        let mut filter = CategoryFilter::default();
        filter.set_active("person", false);
        let view = visible(&snapshot, &HashSet::new(), &filter, ViewMode::Flat);
        let mut engine = HighlightEngine::default();

        let set = engine.on_node_select(Some(0), &snapshot, &view);

        assert_eq!(set.nodes, HashSet::from([0]));
        assert!(set.links.is_empty());
    }
}

use eframe::egui::Pos2;

use crate::kg::{GraphSnapshot, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeAction {
    Focus,
    AskAgent,
    SearchSimilar,
    ViewSource,
    Expand,
}

impl NodeAction {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::AskAgent => "Ask agent",
            Self::SearchSimilar => "Search similar",
            Self::ViewSource => "View source",
            Self::Expand => "Expand / collapse",
        }
    }
}

/// Menu entries offered for a node of `kind`, in display order.
pub(crate) fn actions_for(kind: NodeKind) -> &'static [NodeAction] {
    match kind {
        NodeKind::Collection => &[NodeAction::Focus, NodeAction::Expand],
        NodeKind::Document => &[NodeAction::Focus, NodeAction::AskAgent, NodeAction::ViewSource],
        NodeKind::Entity => &[
            NodeAction::Focus,
            NodeAction::AskAgent,
            NodeAction::SearchSimilar,
            NodeAction::ViewSource,
        ],
    }
}

/// Where a node's text came from, as far as the loaded graph can tell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SourceRef {
    pub(crate) collection_id: String,
    pub(crate) document_id: String,
    pub(crate) snippet: Option<String>,
}

/// What a menu action asks the view model to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ActionOutcome {
    Focus(usize),
    HandoffToAgent { node_id: String, label: String },
    Search { query: String },
    OpenSource(SourceRef),
    ToggleExpand(String),
}

/// Maps a menu pick on `node` to its outcome. `None` when the action does not
/// apply to the node or its source cannot be located.
pub(crate) fn resolve_action(
    action: NodeAction,
    snapshot: &GraphSnapshot,
    node: usize,
    contextual_collection: Option<&str>,
) -> Option<ActionOutcome> {
    let graph_node = snapshot.node(node)?;
    let kind = graph_node.effective_kind();
    if !actions_for(kind).contains(&action) {
        return None;
    }

    let outcome = match action {
        NodeAction::Focus => ActionOutcome::Focus(node),
        NodeAction::AskAgent => ActionOutcome::HandoffToAgent {
            node_id: graph_node.id.clone(),
            label: graph_node.label.clone(),
        },
        NodeAction::SearchSimilar => ActionOutcome::Search {
            query: graph_node.label.clone(),
        },
        NodeAction::ViewSource => {
            ActionOutcome::OpenSource(source_ref(snapshot, node, contextual_collection)?)
        }
        NodeAction::Expand => ActionOutcome::ToggleExpand(graph_node.id.clone()),
    };
    Some(outcome)
}

fn owner_of_kind(snapshot: &GraphSnapshot, node: usize, kind: NodeKind) -> Option<usize> {
    snapshot.owners(node).iter().copied().find(|&owner| {
        snapshot
            .node(owner)
            .is_some_and(|candidate| candidate.effective_kind() == kind)
    })
}

pub(crate) fn source_ref(
    snapshot: &GraphSnapshot,
    node: usize,
    contextual_collection: Option<&str>,
) -> Option<SourceRef> {
    let graph_node = snapshot.node(node)?;

    let (document, snippet) = match graph_node.effective_kind() {
        NodeKind::Collection => return None,
        NodeKind::Document => (Some(node), None),
        NodeKind::Entity => (
            owner_of_kind(snapshot, node, NodeKind::Document),
            Some(graph_node.label.clone()).filter(|label| !label.trim().is_empty()),
        ),
    };

    let document_node = document.and_then(|index| snapshot.node(index));
    let document_id = match (graph_node.effective_kind(), document_node) {
        (NodeKind::Document, _) => graph_node
            .document_id
            .clone()
            .unwrap_or_else(|| graph_node.id.clone()),
        (_, Some(document_node)) => document_node
            .document_id
            .clone()
            .unwrap_or_else(|| document_node.id.clone()),
        (_, None) => graph_node.document_id.clone()?,
    };

    let collection_id = document
        .and_then(|index| owner_of_kind(snapshot, index, NodeKind::Collection))
        .and_then(|index| snapshot.node(index))
        .map(|collection| collection.id.clone())
        .or_else(|| document_node.and_then(|document| document.collection_id.clone()))
        .or_else(|| graph_node.collection_id.clone())
        .or_else(|| contextual_collection.map(str::to_owned))?;

    Some(SourceRef {
        collection_id,
        document_id,
        snippet,
    })
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ContextMenuTarget {
    pub(crate) node: usize,
    pub(crate) node_id: String,
    pub(crate) kind: NodeKind,
    pub(crate) anchor: Pos2,
}

/// Open node menu. A new right-click replaces the target; clicks outside the
/// menu close it.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContextMenu {
    target: Option<ContextMenuTarget>,
}

impl ContextMenu {
    pub(crate) fn open(&mut self, snapshot: &GraphSnapshot, node: usize, anchor: Pos2) {
        self.target = snapshot.node(node).map(|graph_node| ContextMenuTarget {
            node,
            node_id: graph_node.id.clone(),
            kind: graph_node.effective_kind(),
            anchor,
        });
    }

    pub(crate) fn close(&mut self) {
        self.target = None;
    }

    pub(crate) fn target(&self) -> Option<&ContextMenuTarget> {
        self.target.as_ref()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::kg::{GraphEdge, GraphNode, RelationKind};

    fn corpus() -> GraphSnapshot {
        let mut orphan = GraphNode::new("e2", Some(NodeKind::Entity), "Orphan");
        orphan.document_id = Some("doc-hint".into());
        let nodes = vec![
            GraphNode::new("c1", Some(NodeKind::Collection), "Manuals"),
            GraphNode::new("d1", Some(NodeKind::Document), "Breaker guide"),
            GraphNode::new("e1", Some(NodeKind::Entity), "Relay R-12").with_entity_type("device"),
            orphan,
            GraphNode::new("k", None, "Untyped"),
        ];
        let edges = vec![
            GraphEdge::new("c1", "d1", RelationKind::Contains),
            GraphEdge::new("d1", "e1", RelationKind::ExtractedFrom),
        ];
        GraphSnapshot::load(nodes, edges)
    }

    #[test]
    fn menu_entries_follow_node_kind() {
        assert_eq!(
            actions_for(NodeKind::Collection),
            &[NodeAction::Focus, NodeAction::Expand]
        );
        assert!(!actions_for(NodeKind::Collection).contains(&NodeAction::AskAgent));
        assert!(actions_for(NodeKind::Document).contains(&NodeAction::ViewSource));
        assert!(!actions_for(NodeKind::Document).contains(&NodeAction::SearchSimilar));
        assert_eq!(actions_for(NodeKind::Entity).len(), 4);
    }

    #[test]
    fn kindless_nodes_get_entity_actions() {
        let snapshot = corpus();
        let untyped = snapshot.index_of("k").unwrap();

        let outcome = resolve_action(NodeAction::SearchSimilar, &snapshot, untyped, None);

        assert_eq!(
            outcome,
            Some(ActionOutcome::Search {
                query: "Untyped".into()
            })
        );
    }

    #[test]
    fn inapplicable_actions_resolve_to_nothing() {
        let snapshot = corpus();
        let collection = snapshot.index_of("c1").unwrap();

        assert!(resolve_action(NodeAction::AskAgent, &snapshot, collection, None).is_none());
        assert_eq!(
            resolve_action(NodeAction::Expand, &snapshot, collection, None),
            Some(ActionOutcome::ToggleExpand("c1".into()))
        );
    }

    #[test]
    fn entity_source_follows_owner_chain() {
        let snapshot = corpus();
        let entity = snapshot.index_of("e1").unwrap();

        let source = source_ref(&snapshot, entity, Some("ctx")).expect("source");

        assert_eq!(source.collection_id, "c1");
        assert_eq!(source.document_id, "d1");
        assert_eq!(source.snippet.as_deref(), Some("Relay R-12"));
    }

    #[test]
    fn source_falls_back_to_hints_and_contextual_collection() {
        let snapshot = corpus();
        let orphan = snapshot.index_of("e2").unwrap();

        assert_eq!(
            source_ref(&snapshot, orphan, Some("ctx")),
            Some(SourceRef {
                collection_id: "ctx".into(),
                document_id: "doc-hint".into(),
                snippet: Some("Orphan".into()),
            })
        );
        assert!(source_ref(&snapshot, orphan, None).is_none());
    }

    #[test]
    fn document_source_uses_own_id() {
        let snapshot = corpus();
        let document = snapshot.index_of("d1").unwrap();

        let outcome = resolve_action(NodeAction::ViewSource, &snapshot, document, None);

        assert_eq!(
            outcome,
            Some(ActionOutcome::OpenSource(SourceRef {
                collection_id: "c1".into(),
                document_id: "d1".into(),
                snippet: None,
            }))
        );
    }

    #[test]
    fn new_right_click_replaces_open_menu() {
        let snapshot = corpus();
        let mut menu = ContextMenu::default();

        menu.open(&snapshot, 0, pos2(10.0, 10.0));
        menu.open(&snapshot, 2, pos2(50.0, 20.0));

        let target = menu.target().expect("open");
        assert_eq!(target.node_id, "e1");
        assert_eq!(target.kind, NodeKind::Entity);

        menu.close();
        assert!(!menu.is_open());
    }
}

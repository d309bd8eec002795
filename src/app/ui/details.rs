use eframe::egui::{self, RichText, Ui};

use crate::kg::{GraphSnapshot, RelationKind, VisibleGraph};
use crate::util::truncate_label;

use super::super::actions::actions_for;
use super::super::{SidePanel, ViewModel};

const NEIGHBOR_ROW_HEIGHT: f32 = 22.0;

struct NeighborEntry {
    node: usize,
    label: String,
    relation: RelationKind,
    outgoing: bool,
    in_view: bool,
}

fn neighbors(snapshot: &GraphSnapshot, visible: &VisibleGraph, node: usize) -> Vec<NeighborEntry> {
    let mut entries = snapshot
        .incident_edges(node)
        .iter()
        .filter_map(|&edge| {
            let (source, target) = snapshot.endpoints(edge)?;
            let (other, outgoing) = if source == node {
                (target, true)
            } else {
                (source, false)
            };
            if other == node {
                return None;
            }
            Some(NeighborEntry {
                node: other,
                label: snapshot.node(other)?.label.clone(),
                relation: snapshot.edge(edge)?.relation,
                outgoing,
                in_view: visible.contains_node(other),
            })
        })
        .collect::<Vec<_>>();

    entries.sort_by(|a, b| b.in_view.cmp(&a.in_view).then_with(|| a.label.cmp(&b.label)));
    entries
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Selection Details");
            if ui.small_button("Close").clicked() {
                self.select_node(None);
                self.side_panel = SidePanel::Closed;
            }
        });
        ui.add_space(6.0);

        let Some(selected) = self.selected() else {
            ui.label("Select a node in the graph or with the finder.");
            return;
        };
        let Some(node) = self.snapshot.node(selected).cloned() else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(&node.label).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        let kind = node.effective_kind();
        ui.label(format!("Kind: {}", kind.label()));
        if let Some(entity_type) = &node.entity_type {
            ui.label(format!("Type: {entity_type}"));
        }
        if let Some(workspace) = &node.workspace {
            ui.label(format!("Workspace: {workspace}"));
        }
        ui.label(format!("Connections: {}", node.degree));
        if let Some(description) = &node.description {
            ui.add_space(4.0);
            ui.label(description.as_str());
        }

        ui.separator();
        ui.horizontal_wrapped(|ui| {
            for &action in actions_for(kind) {
                if ui.button(action.label()).clicked() {
                    self.perform_action(action, selected);
                }
            }
        });

        ui.separator();
        let related = neighbors(&self.snapshot, &self.visible, selected);
        ui.label(RichText::new(format!("Connected nodes ({})", related.len())).strong());
        if related.is_empty() {
            ui.label("No connections in the loaded graph.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("neighbor_scroll")
            .max_height(360.0)
            .auto_shrink([false, false])
            .show_rows(ui, NEIGHBOR_ROW_HEIGHT, related.len(), |ui, rows| {
                for entry in &related[rows] {
                    let arrow = if entry.outgoing { "→" } else { "←" };
                    let hidden = if entry.in_view { "" } else { "  [hidden]" };
                    let text = format!(
                        "{arrow} {}  ({}){hidden}",
                        truncate_label(&entry.label, 36),
                        entry.relation.label()
                    );
                    if ui.link(text).clicked() {
                        picked = Some(entry.node);
                    }
                }
            });

        if let Some(node) = picked {
            self.select_node(Some(node));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::kg::{CategoryFilter, GraphEdge, GraphNode, NodeKind, ViewMode, visible};

    #[test]
    fn neighbors_list_visible_first_with_direction() {
        let nodes = vec![
            GraphNode::new("d1", Some(NodeKind::Document), "Guide"),
            GraphNode::new("e1", Some(NodeKind::Entity), "Relay"),
            GraphNode::new("e2", Some(NodeKind::Entity), "Breaker").with_entity_type("device"),
        ];
        let edges = vec![
            GraphEdge::new("d1", "e1", RelationKind::ExtractedFrom),
            GraphEdge::new("e2", "e1", RelationKind::Generic),
        ];
        let snapshot = GraphSnapshot::load(nodes, edges);
        let mut categories = CategoryFilter::default();
        categories.set_active("device", false);
        let view = visible(&snapshot, &HashSet::new(), &categories, ViewMode::Flat);

        let entries = neighbors(&snapshot, &view, 1);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "Guide");
        assert!(!entries[0].outgoing);
        assert!(entries[0].in_view);
        assert_eq!(entries[1].label, "Breaker");
        assert!(!entries[1].in_view);
    }
}

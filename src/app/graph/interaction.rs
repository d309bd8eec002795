use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::distance_to_segment;
use super::RenderEdge;

pub(super) const LINK_HOVER_TOLERANCE: f32 = 4.0;

/// Pointer outcome of one canvas frame, applied once the render graph is no
/// longer borrowed. Node indices refer to the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum CanvasEvent {
    ClickNode(usize),
    ClickEmpty,
    OpenMenu { node: usize, anchor: Pos2 },
    CloseMenu,
    Hover(Option<usize>),
    HoverLink(Option<usize>),
    Unpin(usize),
}

/// Closest on-screen node whose disc contains `pointer`, as a render index.
pub(in crate::app) fn node_at(
    positions: &[Pos2],
    radii: &[f32],
    on_screen: &[bool],
    pointer: Pos2,
) -> Option<usize> {
    positions
        .iter()
        .zip(radii)
        .enumerate()
        .filter(|(index, _)| on_screen.get(*index).copied().unwrap_or(false))
        .filter_map(|(index, (position, radius))| {
            let distance = position.distance(pointer);
            (distance <= *radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Snapshot edge index of the closest rendered edge within `tolerance`
/// pixels of `pointer`.
pub(in crate::app) fn link_at(
    edges: &[RenderEdge],
    positions: &[Pos2],
    pointer: Pos2,
    tolerance: f32,
) -> Option<usize> {
    edges
        .iter()
        .filter_map(|edge| {
            let start = *positions.get(edge.source)?;
            let end = *positions.get(edge.target)?;
            let distance = distance_to_segment(pointer, start, end);
            (distance <= tolerance).then_some((edge.edge, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(edge, _)| edge)
}

impl ViewModel {
    pub(in crate::app) fn handle_canvas_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.camera.zoom_at(rect, pointer, factor);
        self.pending_fit_at = None;
    }

    /// Primary drag on a node moves and pins it; any other drag pans.
    pub(in crate::app) fn handle_canvas_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = hovered;
        }

        let Some(graph) = self.render_graph.as_mut() else {
            return;
        };

        match self.dragging {
            Some(index) if response.dragged_by(egui::PointerButton::Primary) => {
                if let (Some(node), Some(pointer)) =
                    (graph.nodes.get_mut(index), response.interact_pointer_pos())
                {
                    node.world_pos = self.camera.screen_to_world(rect, pointer);
                    node.velocity = egui::Vec2::ZERO;
                    node.pinned = true;
                }
            }
            Some(_) => {}
            None if response.dragged() => {
                self.camera.pan_by(response.drag_delta());
                self.pending_fit_at = None;
            }
            None => {}
        }

        if response.drag_stopped() {
            self.dragging = None;
        }
    }

    pub(in crate::app) fn apply_canvas_event(&mut self, event: CanvasEvent) {
        match event {
            CanvasEvent::ClickNode(node) => self.click_node(node),
            CanvasEvent::ClickEmpty => self.click_empty(),
            CanvasEvent::OpenMenu { node, anchor } => {
                self.context_menu.open(&self.snapshot, node, anchor);
            }
            CanvasEvent::CloseMenu => self.context_menu.close(),
            CanvasEvent::Hover(node) => self.hover_node(node),
            CanvasEvent::HoverLink(edge) => self.hover_link(edge),
            CanvasEvent::Unpin(node) => {
                if let Some(graph) = self.render_graph.as_mut()
                    && let Some(index) = graph.render_index(node)
                {
                    graph.nodes[index].pinned = false;
                }
            }
        }
    }
}

use eframe::egui::{self, Align2, Color32, FontId, Rect, RichText, Sense, Shape, Stroke, Ui, Vec2, vec2};

use crate::util::truncate_label;

use super::super::ViewModel;
use super::super::actions::actions_for;
use super::super::camera::{Camera, FIT_DURATION_MS, FIT_PADDING_PX};
use super::super::physics::{PhysicsConfig, step_physics};
use super::super::render_utils::{
    HOVER_SIZE_DELTA, LABEL_MAX_FONT, NodeShape, blend_color, circle_visible, dim_color,
    draw_background, edge_style, edge_visible, fit_label_font_size, paint_node,
    particle_position, world_bounds,
};
use super::RenderGraph;
use super::interaction::{CanvasEvent, LINK_HOVER_TOLERANCE, link_at, node_at};

const LABEL_MAX_CHARS: usize = 32;
const MIN_LABEL_SCREEN_FONT: f32 = 5.0;
const PARTICLE_SPEED: f32 = 0.45;
const DIM_FACTOR: f32 = 0.3;

fn update_screen_space(graph: &mut RenderGraph, camera: &Camera, rect: Rect, hovered: Option<usize>) {
    let zoom = camera.zoom();
    let scratch = &mut graph.view_scratch;
    scratch.screen_positions.clear();
    scratch.screen_radii.clear();
    scratch.on_screen.clear();

    for (index, node) in graph.nodes.iter().enumerate() {
        let position = camera.world_to_screen(rect, node.world_pos);
        let grow = if hovered == Some(index) { HOVER_SIZE_DELTA } else { 0.0 };
        let radius = ((node.radius + grow) * zoom).max(1.5);
        scratch.screen_positions.push(position);
        scratch.screen_radii.push(radius);
        scratch.on_screen.push(circle_visible(rect, position, radius));
    }
}

impl ViewModel {
    fn fit_to_view(&mut self, viewport: Vec2) {
        let Some(graph) = self.render_graph.as_ref() else {
            return;
        };
        let Some(bounds) = world_bounds(graph.nodes.iter().map(|node| node.world_pos)) else {
            return;
        };
        let margin = graph.nodes.iter().map(|node| node.radius).fold(0.0, f32::max);
        self.camera
            .zoom_to_fit(viewport, bounds.expand(margin), FIT_PADDING_PX, FIT_DURATION_MS);
    }

    fn hovered_render_index(&self) -> Option<usize> {
        let graph = self.render_graph.as_ref()?;
        self.highlight_engine
            .hovered_node()
            .and_then(|node| graph.render_index(node))
    }

    /// Physics, hit testing and pointer input; returns the events to apply
    /// and whether the layout is still moving.
    fn collect_canvas_events(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> (Vec<CanvasEvent>, Option<usize>, bool) {
        let physics = PhysicsConfig {
            delta_seconds: ui
                .input(|input| input.stable_dt)
                .clamp(1.0 / 240.0, 1.0 / 20.0),
            ..self.physics
        };
        let hovered = self.hovered_render_index();
        let pointer = response.hover_pos();
        let live_physics = self.live_physics;

        let Some(graph) = self.render_graph.as_mut() else {
            return (Vec::new(), None, false);
        };

        let moving = live_physics && step_physics(graph, physics);
        update_screen_space(graph, &self.camera, rect, hovered);

        let scratch = &graph.view_scratch;
        let hit_node = pointer.and_then(|pointer| {
            node_at(
                &scratch.screen_positions,
                &scratch.screen_radii,
                &scratch.on_screen,
                pointer,
            )
        });
        let hit_link = match (hit_node, pointer) {
            (None, Some(pointer)) => link_at(
                &graph.edges,
                &scratch.screen_positions,
                pointer,
                LINK_HOVER_TOLERANCE,
            ),
            _ => None,
        };
        let hit_snapshot = hit_node.map(|index| graph.nodes[index].snapshot_index);

        let mut events = Vec::new();
        if self.dragging.is_none() {
            events.push(CanvasEvent::Hover(hit_snapshot));
            events.push(CanvasEvent::HoverLink(hit_link));
        }
        if response.clicked_by(egui::PointerButton::Primary) {
            events.push(hit_snapshot.map_or(CanvasEvent::ClickEmpty, CanvasEvent::ClickNode));
        }
        if response.secondary_clicked() {
            events.push(match (hit_snapshot, pointer) {
                (Some(node), Some(anchor)) => CanvasEvent::OpenMenu { node, anchor },
                _ => CanvasEvent::CloseMenu,
            });
        }
        if response.clicked_by(egui::PointerButton::Middle)
            && let Some(node) = hit_snapshot
        {
            events.push(CanvasEvent::Unpin(node));
        }

        if hit_node.is_some() || hit_link.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        (events, hit_node, moving)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = self.now;

        self.handle_canvas_zoom(ui, rect, &response);
        if let Some(fit_at) = self.pending_fit_at
            && now >= fit_at
        {
            self.pending_fit_at = None;
            self.fit_to_view(rect.size());
        }
        let camera_moving = self.camera.step(now);

        draw_background(
            &painter,
            rect,
            self.camera.world_to_screen(rect, Vec2::ZERO),
            self.camera.zoom(),
        );

        let (events, hit_node, physics_moving) = self.collect_canvas_events(ui, rect, &response);
        self.handle_canvas_drag(rect, &response, hit_node);
        for event in events {
            self.apply_canvas_event(event);
        }

        let animating = self.paint_graph(ui, &painter, rect);

        if physics_moving || camera_moving || animating || response.dragged() {
            ui.ctx().request_repaint();
        } else if self.pending_fit_at.is_some() {
            ui.ctx()
                .request_repaint_after(std::time::Duration::from_millis(50));
        }
    }

    /// Paints edges, particles, nodes and labels. Returns true while
    /// something on screen is animating.
    fn paint_graph(&mut self, ui: &Ui, painter: &egui::Painter, rect: Rect) -> bool {
        let hovered = self.hovered_render_index();
        let hovered_link = self.highlight_engine.hovered_link();
        let selected = self.highlight_engine.selected();
        let Self {
            render_graph,
            snapshot,
            highlight,
            palette,
            camera,
            now,
            ..
        } = self;
        let Some(graph) = render_graph.as_mut() else {
            return false;
        };

        update_screen_space(graph, camera, rect, hovered);
        let zoom = camera.zoom();
        let highlight_active = highlight.is_active();
        let flow_time = *now as f32 * PARTICLE_SPEED;
        let width_scale = zoom.sqrt().clamp(0.5, 2.5);
        let mut animating = false;

        let positions = &graph.view_scratch.screen_positions;
        let radii = &graph.view_scratch.screen_radii;
        let on_screen = &graph.view_scratch.on_screen;

        for edge in &graph.edges {
            let start = positions[edge.source];
            let end = positions[edge.target];
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let style = edge_style(edge.relation);
            let highlighted = highlight.contains_link(edge.edge);
            let (color, width) = if highlighted {
                (blend_color(style.color, Color32::WHITE, 0.35), style.width * 2.0)
            } else if highlight_active {
                (dim_color(style.color, DIM_FACTOR), style.width)
            } else {
                (style.color, style.width)
            };
            let stroke = Stroke::new(width * width_scale, color);

            match style.dash {
                Some((dash, gap)) => painter.extend(Shape::dashed_line(&[start, end], stroke, dash, gap)),
                None => {
                    painter.line_segment([start, end], stroke);
                }
            }

            if highlighted && style.particles > 0 {
                let count = style.particles as f32;
                for particle in 0..style.particles {
                    let t = flow_time + particle as f32 / count;
                    painter.circle_filled(
                        particle_position(start, end, t),
                        1.5 + stroke.width * 0.6,
                        Color32::WHITE,
                    );
                }
                animating = true;
            }
        }

        for (index, node) in graph.nodes.iter().enumerate() {
            if !on_screen[index] {
                continue;
            }
            let Some(graph_node) = snapshot.node(node.snapshot_index) else {
                continue;
            };

            let position = positions[index];
            let radius = radii[index];
            let is_selected = selected == Some(node.snapshot_index);
            let is_highlighted = highlight.contains_node(node.snapshot_index);
            let is_hovered = hovered == Some(index);

            let base = palette.color(&graph_node.group());
            let fill = if highlight_active && !is_highlighted {
                dim_color(base, DIM_FACTOR)
            } else {
                base
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                animating = true;
            }
            if selection_mix > 0.0 {
                let halo_strength = (selection_mix * (1.0 - selection_mix) * 4.0).clamp(0.0, 1.0);
                let halo_alpha = (60.0 + (halo_strength * 140.0)) as u8;
                painter.circle_stroke(
                    position,
                    radius + 4.0 + ((1.0 - selection_mix) * 6.0),
                    Stroke::new(
                        1.2 + (halo_strength * 1.6),
                        Color32::from_rgba_unmultiplied(245, 206, 93, halo_alpha),
                    ),
                );
            }

            let outline = if node.pinned {
                Color32::from_gray(235)
            } else if is_hovered {
                Color32::from_rgb(255, 164, 101)
            } else {
                Color32::from_rgba_unmultiplied(15, 15, 15, 190)
            };
            paint_node(
                painter,
                NodeShape::for_kind(node.kind),
                position,
                radius,
                fill,
                Stroke::new(1.0 + selection_mix * 1.2, outline),
            );

            let text = truncate_label(&graph_node.label, LABEL_MAX_CHARS);
            let label_color = if highlight_active && !is_highlighted {
                Color32::from_gray(110)
            } else {
                Color32::from_gray(238)
            };
            let width_at_max = painter
                .layout_no_wrap(text.clone(), FontId::proportional(LABEL_MAX_FONT), label_color)
                .size()
                .x;
            let world_font = fit_label_font_size(&text, node.radius * 2.0, |_, size| {
                width_at_max * size / LABEL_MAX_FONT
            });
            let mut screen_font = world_font * zoom;
            if is_selected || is_hovered {
                screen_font = screen_font.max(11.0);
            }
            if screen_font < MIN_LABEL_SCREEN_FONT {
                continue;
            }
            painter.text(
                position + vec2(0.0, radius + 2.0),
                Align2::CENTER_TOP,
                text,
                FontId::proportional(screen_font),
                label_color,
            );
        }

        if let Some(index) = hovered
            && let Some(node) = graph
                .nodes
                .get(index)
                .and_then(|node| snapshot.node(node.snapshot_index))
        {
            let kind = node
                .entity_type
                .as_deref()
                .unwrap_or_else(|| node.effective_kind().label());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {kind}  |  degree {}", node.label, node.degree),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        } else if let Some(edge) = hovered_link.and_then(|edge| snapshot.edge(edge)) {
            let text = edge
                .label
                .clone()
                .unwrap_or_else(|| edge.relation.label().to_owned());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        animating
    }

    pub(in crate::app) fn show_context_menu(&mut self, ctx: &egui::Context) {
        let Some(target) = self.context_menu.target().cloned() else {
            return;
        };
        let title = self
            .snapshot
            .node(target.node)
            .map(|node| truncate_label(&node.label, LABEL_MAX_CHARS));

        let mut chosen = None;
        let area = egui::Area::new(egui::Id::new("node-context-menu"))
            .order(egui::Order::Foreground)
            .fixed_pos(target.anchor)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(150.0);
                    if let Some(title) = &title {
                        ui.label(RichText::new(title).strong());
                        ui.separator();
                    }
                    for &action in actions_for(target.kind) {
                        if ui.button(action.label()).clicked() {
                            chosen = Some(action);
                        }
                    }
                });
            });

        if let Some(action) = chosen {
            self.perform_action(action, target.node);
            return;
        }

        let clicked_outside = ctx.input(|input| {
            input.pointer.primary_clicked()
                && input
                    .pointer
                    .interact_pos()
                    .is_some_and(|pointer| !area.response.rect.contains(pointer))
        });
        if clicked_outside {
            self.context_menu.close();
        }
    }
}

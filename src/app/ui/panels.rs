use std::time::Duration;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui};

use super::super::load::LoadReason;
use super::super::{RetrievalMode, SidePanel, ViewModel};

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.now = ctx.input(|input| input.time);
        self.poll_tasks();
        if self.is_busy() || self.source.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui));
            });

        if self.side_panel != SidePanel::Closed {
            egui::SidePanel::right("inspector")
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| match self.side_panel {
                    SidePanel::Details => self.draw_details(ui),
                    SidePanel::Triage => self.draw_triage(ui),
                    SidePanel::Closed => {}
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas_or_state(ui));

        self.show_context_menu(ctx);
        self.draw_source_window(ctx);
        let now = self.now;
        self.toasts.show(ctx, now);
    }

    fn draw_top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Knowledge Graph");
            ui.separator();
            ui.label(self.mode.to_string());
            ui.label(format!(
                "nodes: {}/{}",
                self.visible.nodes().len(),
                self.snapshot.node_count()
            ));
            ui.label(format!(
                "edges: {}/{}",
                self.visible.edges().len(),
                self.snapshot.edge_count()
            ));
            if self.loader.is_loading() {
                ui.spinner();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if let Some(badge) = self.triage.badge() {
                    let button = egui::Button::new(
                        RichText::new(format!("Merge suggestions  {badge}"))
                            .color(Color32::from_rgb(245, 166, 35)),
                    );
                    if ui
                        .add(button)
                        .on_hover_text("Review possible duplicate entities in this collection.")
                        .clicked()
                    {
                        self.open_triage();
                    }
                }
                if let Some((_, label)) = &self.last_agent_handoff {
                    ui.small(format!("agent: {label}"));
                }
            });
        });
    }

    fn draw_canvas_or_state(&mut self, ui: &mut Ui) {
        if self.snapshot.is_empty() {
            self.draw_empty_state(ui);
            return;
        }

        if let Some(error) = self.load_error.clone() {
            ui.horizontal(|ui| {
                ui.add_space(8.0);
                ui.colored_label(
                    Color32::from_rgb(255, 128, 112),
                    format!("Refresh failed: {error}"),
                );
                if ui.small_button("Retry").clicked() {
                    self.refresh();
                }
            });
        }

        if self.visible.nodes().is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.label("Every node is hidden by the category filter.");
                if ui.button("Show all categories").clicked() {
                    self.show_all_categories();
                }
            });
            return;
        }

        self.draw_graph(ui);
    }

    fn draw_empty_state(&mut self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);

            if self.loader.is_loading() {
                ui.heading("Loading graph...");
                ui.add_space(8.0);
                ui.spinner();
                return;
            }

            if let Some(error) = self.load_error.clone() {
                ui.heading("The graph could not be loaded");
                ui.colored_label(Color32::from_rgb(255, 128, 112), error);
                ui.add_space(8.0);
                if ui.button("Retry").clicked() {
                    self.request_load(LoadReason::Refresh);
                }
                return;
            }

            if !self.loader.has_searched() {
                match self.mode {
                    RetrievalMode::GlobalFlat => {
                        ui.heading("Search the knowledge graph");
                        ui.label("Enter a query in the controls panel to find entities.");
                    }
                    _ => {
                        ui.heading("Nothing loaded yet");
                    }
                }
                return;
            }

            ui.heading("No results");
            ui.label(match self.mode {
                RetrievalMode::Contextual { .. } => {
                    "This collection has no graph yet, or it could not be fetched."
                }
                RetrievalMode::GlobalHierarchical | RetrievalMode::GlobalFlat => {
                    "Try a broader query or a larger top-k."
                }
            });
        });
    }
}

use eframe::egui::{self, Color32, RichText, Ui};

use super::super::{SidePanel, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_triage(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Merge Suggestions");
            if ui.small_button("Close").clicked() {
                self.triage.clear_inspection();
                self.side_panel = SidePanel::Closed;
            }
        });
        ui.add_space(4.0);

        let Some(collection_id) = self.triage.collection_id().map(str::to_owned) else {
            ui.label("Merge suggestions are available when a single collection is open.");
            return;
        };
        ui.small(format!("collection: {collection_id}"));
        ui.label(format!("Pending: {}", self.triage.pending_count()));
        ui.separator();

        if self.triage.suggestions().is_empty() {
            ui.label("No duplicate candidates right now.");
            return;
        }

        let inspected = self.triage.inspected();
        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("triage_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (suggestion_index, suggestion) in self.triage.suggestions().iter().enumerate() {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(format!("{:.0}%", suggestion.confidence * 100.0))
                                    .color(Color32::from_rgb(245, 166, 35))
                                    .strong(),
                            );
                            if let Some(target) = &suggestion.target_name {
                                ui.label(format!("→ {target}"));
                            }
                        });
                        if let Some(reason) = &suggestion.reason {
                            ui.small(reason.as_str());
                        }

                        for (entity_index, entity) in suggestion.entities.iter().enumerate() {
                            let is_inspected = inspected == Some((suggestion_index, entity_index));
                            let text = match &entity.entity_type {
                                Some(entity_type) => format!("{} ({entity_type})", entity.name),
                                None => entity.name.clone(),
                            };
                            if ui.selectable_label(is_inspected, text).clicked() {
                                picked = Some((suggestion_index, entity_index));
                            }
                        }
                    });
                    ui.add_space(4.0);
                }
            });

        if let Some((suggestion, entity)) = picked {
            self.select_suggested_entity(suggestion, entity);
        }
    }
}

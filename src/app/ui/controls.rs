use eframe::egui::{self, Key, Response, RichText, Sense, Ui, vec2};

use crate::kg::{NodeGroup, ViewMode};
use crate::util::truncate_label;

use super::super::locate::locate_nodes;
use super::super::{RetrievalMode, ViewModel};
use super::ToastLevel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;
const MAX_TOP_K: usize = 500;
const LOCATOR_RESULTS: usize = 8;

#[derive(Clone, Copy, Default)]
struct SliderKeyHold {
    held_secs: f32,
    direction: i8,
    integer_carry: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Signed slider movement for this frame from held arrow keys, in units of
/// `step`. Holding a key accelerates; focus loss or a direction change
/// restarts the ramp.
fn held_arrow_delta(ui: &Ui, response: &Response, step: f32) -> (f32, SliderKeyHold) {
    let state_id = response.id.with("arrow_key_hold");
    let mut hold = ui
        .ctx()
        .data(|data| data.get_temp::<SliderKeyHold>(state_id).unwrap_or_default());

    let (delta_time, up, down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    let direction = (up as i8) - (down as i8);

    if !response.has_focus() || direction == 0 {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHold::default()));
        return (0.0, SliderKeyHold::default());
    }

    if direction != hold.direction {
        hold = SliderKeyHold {
            direction,
            ..SliderKeyHold::default()
        };
    }
    hold.held_secs += delta_time;
    ui.ctx().request_repaint();

    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold.held_secs);
    (direction as f32 * step * speed * delta_time, hold)
}

fn accelerate_f32(ui: &Ui, response: &Response, value: &mut f32, min: f32, max: f32) -> bool {
    let step = ((max - min) / 200.0).max(0.0005);
    let (delta, hold) = held_arrow_delta(ui, response, step);
    ui.ctx()
        .data_mut(|data| data.insert_temp(response.id.with("arrow_key_hold"), hold));
    if delta == 0.0 {
        return false;
    }

    let old = *value;
    *value = (*value + delta).clamp(min, max);
    (*value - old).abs() > f32::EPSILON
}

fn accelerate_usize(ui: &Ui, response: &Response, value: &mut usize, min: usize, max: usize) -> bool {
    let (delta, mut hold) = held_arrow_delta(ui, response, 1.0);
    hold.integer_carry += delta;
    let whole = hold.integer_carry.trunc() as isize;
    hold.integer_carry -= whole as f32;
    ui.ctx()
        .data_mut(|data| data.insert_temp(response.id.with("arrow_key_hold"), hold));

    let old = *value;
    if whole != 0 {
        *value = (*value as isize + whole).clamp(min as isize, max as isize) as usize;
    }
    *value != old
}

fn tuning_slider(ui: &mut Ui, value: &mut f32, min: f32, max: f32, text: &str, hint: &str) -> bool {
    let slider = ui
        .add(
            egui::Slider::new(value, min..=max)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if slider.hovered() {
        slider.request_focus();
    }
    slider.changed() | accelerate_f32(ui, &slider, value, min, max)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ModeChoice {
    Contextual,
    Hierarchy,
    Flat,
}

impl ModeChoice {
    fn of(mode: &RetrievalMode) -> Self {
        match mode {
            RetrievalMode::Contextual { .. } => Self::Contextual,
            RetrievalMode::GlobalHierarchical => Self::Hierarchy,
            RetrievalMode::GlobalFlat => Self::Flat,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Contextual => "Collection",
            Self::Hierarchy => "Global hierarchy",
            Self::Flat => "Global search",
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_retrieval_controls(ui);
        ui.separator();
        self.draw_category_legend(ui);
        ui.separator();
        self.draw_locator(ui);
        ui.separator();
        self.draw_layout_controls(ui);
    }

    fn draw_retrieval_controls(&mut self, ui: &mut Ui) {
        let current = ModeChoice::of(&self.mode);
        let mut choice = current;
        egui::ComboBox::from_id_salt("retrieval_mode")
            .selected_text(choice.label())
            .show_ui(ui, |ui| {
                for option in [ModeChoice::Contextual, ModeChoice::Hierarchy, ModeChoice::Flat] {
                    ui.selectable_value(&mut choice, option, option.label());
                }
            });

        if choice != current {
            let mode = match choice {
                ModeChoice::Contextual => RetrievalMode::Contextual {
                    collection_id: self.collection_input.trim().to_owned(),
                },
                ModeChoice::Hierarchy => RetrievalMode::GlobalHierarchical,
                ModeChoice::Flat => RetrievalMode::GlobalFlat,
            };
            self.set_mode(mode);
        }

        ui.add_space(4.0);
        if let RetrievalMode::Contextual { collection_id } = &self.mode {
            let collection_id = collection_id.clone();
            let known = self
                .snapshot
                .collection_ids()
                .map(str::to_owned)
                .collect::<Vec<_>>();

            ui.label("Collection id").on_hover_text("Use \"all\" for every collection.");
            let mut open = false;
            ui.horizontal(|ui| {
                let response = ui.text_edit_singleline(&mut self.collection_input);
                open |= response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
                open |= ui.button("Open").clicked();
            });
            if !known.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for id in known {
                        if ui.small_button(truncate_label(&id, 18)).on_hover_text(id.as_str()).clicked() {
                            self.collection_input = id;
                            open = true;
                        }
                    }
                });
            }

            let requested = self.collection_input.trim().to_owned();
            if open && !requested.is_empty() {
                if requested == collection_id {
                    self.refresh();
                } else {
                    self.set_mode(RetrievalMode::Contextual {
                        collection_id: requested,
                    });
                }
            }
        } else {
            ui.label("Query");
            let mut submit = false;
            ui.horizontal(|ui| {
                let response = ui.text_edit_singleline(&mut self.query);
                submit |= response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
                submit |= ui.button("Search").clicked();
            });

            let top_k_slider = ui
                .add(egui::Slider::new(&mut self.top_k, 1..=MAX_TOP_K).text("Top-k"))
                .on_hover_text("Maximum number of seed results requested from the backend.");
            if top_k_slider.hovered() {
                top_k_slider.request_focus();
            }
            accelerate_usize(ui, &top_k_slider, &mut self.top_k, 1, MAX_TOP_K);

            if submit && !self.search() {
                self.notify(ToastLevel::Info, "Enter a query to search.");
            }
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let refresh = ui.add_enabled(!self.loader.is_loading(), egui::Button::new("Refresh"));
            if refresh.clicked() {
                self.refresh();
            }
            if self.loader.is_loading() {
                ui.spinner();
            }
        });

        if self.mode.view_mode() == ViewMode::Hierarchical {
            ui.horizontal(|ui| {
                if ui.button("Expand all").clicked() {
                    self.expand_all();
                }
                if ui.button("Collapse all").clicked() {
                    self.collapse_all();
                }
            });
            ui.checkbox(&mut self.settings.auto_expand, "Auto-expand collections")
                .on_hover_text("Open every collection after a new search or mode change.");
        }
    }

    fn draw_category_legend(&mut self, ui: &mut Ui) {
        let groups = self
            .snapshot
            .groups()
            .iter()
            .map(|(group, members)| (group.clone(), members.len()))
            .collect::<Vec<(NodeGroup, usize)>>();

        egui::CollapsingHeader::new("Categories")
            .default_open(true)
            .show(ui, |ui| {
                if groups.is_empty() {
                    ui.label("No graph loaded.");
                    return;
                }

                for (group, count) in &groups {
                    ui.horizontal(|ui| {
                        let color = self.palette.color(group);
                        let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                        ui.painter().rect_filled(swatch, 2.0, color);

                        match group.entity_type() {
                            Some(entity_type) => {
                                let mut active = self.categories.is_active(entity_type);
                                if ui.checkbox(&mut active, format!("{group} ({count})")).changed() {
                                    let entity_type = entity_type.to_owned();
                                    self.set_category_active(&entity_type, active);
                                }
                            }
                            None => {
                                ui.label(format!("{group} ({count})"));
                            }
                        }
                    });
                }

                if self.categories.hidden_count() > 0 && ui.button("Show all").clicked() {
                    self.show_all_categories();
                }
            });
    }

    fn draw_locator(&mut self, ui: &mut Ui) {
        ui.label("Find node")
            .on_hover_text("Fuzzy search over the labels of the loaded graph.");
        ui.text_edit_singleline(&mut self.locator_query);

        let found = locate_nodes(&self.snapshot, &self.locator_query, LOCATOR_RESULTS);
        let mut picked = None;
        for index in found {
            let Some(node) = self.snapshot.node(index) else {
                continue;
            };
            let shown = if self.visible.contains_node(index) { "" } else { "  (hidden)" };
            let text = format!("{}{shown}", truncate_label(&node.label, 40));
            if ui.link(text).on_hover_text(node.id.as_str()).clicked() {
                picked = Some(index);
            }
        }
        if let Some(index) = picked {
            self.locate(index);
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Pause to freeze the current layout.");
        if ui.button("Fit to view").clicked() {
            self.pending_fit_at = Some(self.now);
        }

        ui.collapsing("Node size", |ui| {
            let mut changed = false;
            changed |= tuning_slider(
                ui,
                &mut self.settings.min_node_size,
                2.0,
                20.0,
                "Minimum",
                "Radius of nodes with few connections.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.settings.max_node_size,
                6.0,
                48.0,
                "Maximum",
                "Radius cap for highly connected nodes.",
            );
            if changed {
                self.settings.max_node_size = self.settings.max_node_size.max(self.settings.min_node_size);
                self.rebuild_visible();
            }
        });

        ui.collapsing("Physics tuning", |ui| {
            let physics = &mut self.physics;
            tuning_slider(
                ui,
                &mut physics.intensity,
                0.2,
                2.5,
                "Intensity",
                "Overall strength applied to all physics forces.",
            );
            tuning_slider(
                ui,
                &mut physics.repulsion_scale,
                0.25,
                3.0,
                "Repulsion",
                "How strongly nodes push away from each other.",
            );
            tuning_slider(
                ui,
                &mut physics.link_scale,
                0.2,
                2.2,
                "Link spring",
                "How strongly linked nodes pull toward their rest length.",
            );
            tuning_slider(
                ui,
                &mut physics.collision_scale,
                0.2,
                2.0,
                "Collision",
                "Extra separation force to prevent overlap between nearby nodes.",
            );
            tuning_slider(
                ui,
                &mut physics.velocity_damping,
                0.78,
                0.97,
                "Velocity damping",
                "How quickly node movement slows each frame.",
            );
            if ui.small_button("Reset").clicked() {
                *physics = Default::default();
            }
        });

        ui.add_space(6.0);
        ui.label(
            RichText::new("Drag a node to pin it; middle-click releases it. Right-click for actions.")
                .small()
                .weak(),
        );
    }
}

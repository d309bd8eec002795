use eframe::egui::{self, Color32, Context, FontId, RichText, TextFormat};
use eframe::egui::text::LayoutJob;

use super::super::ViewModel;
use super::super::source::{SourceState, snippet_spans};

fn highlighted_job(content: &str, snippet: Option<&str>) -> LayoutJob {
    let plain = TextFormat {
        font_id: FontId::proportional(14.0),
        color: Color32::from_gray(225),
        ..Default::default()
    };
    let marked = TextFormat {
        background: Color32::from_rgb(120, 92, 20),
        color: Color32::WHITE,
        ..plain.clone()
    };

    let mut job = LayoutJob::default();
    for (range, hit) in snippet_spans(content, snippet.unwrap_or_default()) {
        let format = if hit { marked.clone() } else { plain.clone() };
        job.append(&content[range], 0.0, format);
    }
    job.wrap.max_width = f32::INFINITY;
    job
}

impl ViewModel {
    pub(in crate::app) fn draw_source_window(&mut self, ctx: &Context) {
        if !self.source.open {
            return;
        }

        let title = match self.source.state() {
            SourceState::Loaded(detail) if !detail.title.is_empty() => detail.title.clone(),
            _ => "Source document".to_owned(),
        };
        let snippet = self
            .source
            .target()
            .and_then(|target| target.snippet.clone());

        let mut open = true;
        egui::Window::new(title)
            .id(egui::Id::new("source_window"))
            .open(&mut open)
            .default_size([560.0, 420.0])
            .resizable(true)
            .show(ctx, |ui| {
                if let Some(target) = self.source.target() {
                    ui.small(format!(
                        "collection {}  |  document {}",
                        target.collection_id, target.document_id
                    ));
                    ui.separator();
                }

                match self.source.state() {
                    SourceState::Idle => {}
                    SourceState::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Fetching document...");
                        });
                    }
                    SourceState::Failed(message) => {
                        ui.colored_label(Color32::from_rgb(255, 128, 112), message.as_str());
                    }
                    SourceState::Loaded(detail) if detail.content.trim().is_empty() => {
                        ui.label(RichText::new("This document has no text content.").weak());
                    }
                    SourceState::Loaded(detail) => {
                        let mut job = highlighted_job(&detail.content, snippet.as_deref());
                        job.wrap.max_width = ui.available_width();
                        egui::ScrollArea::vertical()
                            .id_salt("source_scroll")
                            .auto_shrink([false, false])
                            .show(ui, |ui| {
                                ui.label(job);
                            });
                    }
                }
            });

        if !open {
            self.source.close();
        }
    }
}

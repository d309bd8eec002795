use eframe::egui::{self, Align2, Color32, Context, RichText, vec2};

const TOAST_SECONDS: f64 = 5.0;
const MAX_TOASTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum ToastLevel {
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct Toast {
    pub(in crate::app) level: ToastLevel,
    pub(in crate::app) message: String,
    expires_at: f64,
}

/// Transient notices stacked in the bottom-right corner.
#[derive(Default)]
pub(in crate::app) struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub(in crate::app) fn push(&mut self, level: ToastLevel, message: impl Into<String>, now: f64) {
        self.items.push(Toast {
            level,
            message: message.into(),
            expires_at: now + TOAST_SECONDS,
        });
        if self.items.len() > MAX_TOASTS {
            self.items.remove(0);
        }
    }

    pub(in crate::app) fn items(&self) -> &[Toast] {
        &self.items
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, now: f64) {
        self.items.retain(|toast| toast.expires_at > now);
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .order(egui::Order::Foreground)
            .anchor(Align2::RIGHT_BOTTOM, vec2(-16.0, -16.0))
            .show(ctx, |ui| {
                for toast in &self.items {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        let color = match toast.level {
                            ToastLevel::Info => Color32::from_gray(230),
                            ToastLevel::Error => Color32::from_rgb(255, 128, 112),
                        };
                        ui.label(RichText::new(&toast.message).color(color));
                    });
                    ui.add_space(4.0);
                }
            });
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}

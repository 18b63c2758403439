//! Top bar UI: app title, status and view summary.

use super::PanelState;
use country_globe::{DrawSurface, Globe};
use eframe::egui::{self, Color32, RichText};

pub fn render_top_bar<S: DrawSurface>(ctx: &egui::Context, globe: &Globe<S>, panel: &PanelState) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("Country Globe")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                ui.label(
                    RichText::new(format!(
                        "zoom {:.2} | {} highlighted{}",
                        globe.zoom_factor(),
                        globe.highlights().len(),
                        if globe.is_animating() { " | moving" } else { "" }
                    ))
                    .size(12.0)
                    .monospace()
                    .color(Color32::GRAY),
                );

                ui.separator();

                ui.label(
                    RichText::new(&panel.status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );
            });
        });
}

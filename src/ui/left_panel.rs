//! Left panel UI: navigation and highlight controls.

use super::PanelState;
use country_globe::{DrawSurface, Globe, GlobeResult, MacroRegion, Outcome, ZoomLevel};
use eframe::egui::{self, RichText};

pub fn render_left_panel<S: DrawSurface>(
    ctx: &egui::Context,
    globe: &mut Globe<S>,
    panel: &mut PanelState,
) {
    egui::SidePanel::left("left_panel")
        .resizable(true)
        .default_width(250.0)
        .min_width(200.0)
        .max_width(400.0)
        .show(ctx, |ui| {
            ui.heading("Country");
            ui.separator();

            ui.text_edit_singleline(&mut panel.name_input);
            ui.horizontal(|ui| {
                ui.label("Color");
                ui.color_edit_button_srgba(&mut panel.highlight_color);
            });

            let name = panel.name_input.trim().to_string();
            ui.add_enabled_ui(!name.is_empty(), |ui| {
                ui.horizontal_wrapped(|ui| {
                    if ui.button("Zoom").clicked() {
                        panel.status_message = match globe.zoom_on(&name, None, None, None) {
                            Ok(_) => format!("Zooming on {}", name),
                            Err(e) => e.to_string(),
                        };
                    }
                    if ui.button("Zoom x4").clicked() {
                        let zoom = Some(ZoomLevel::Factor(4.0));
                        panel.status_message = match globe.zoom_on(&name, zoom, None, None) {
                            Ok(_) => format!("Zooming on {}", name),
                            Err(e) => e.to_string(),
                        };
                        panel.zoom = 4.0;
                    }
                    if ui.button("Center").clicked() {
                        panel.status_message = match globe.center_on_country(&name) {
                            Ok(_) => format!("Centering on {}", name),
                            Err(e) => e.to_string(),
                        };
                    }
                    if ui.button("Highlight").clicked() {
                        let result = globe.highlight(&name, Some(panel.highlight_color));
                        panel.status_message = describe(&name, "highlighted", result);
                    }
                    if ui.button("Unhighlight").clicked() {
                        let result = globe.unhighlight(&name);
                        panel.status_message = describe(&name, "unhighlighted", result);
                    }
                });
            });

            ui.add_space(10.0);
            ui.heading("Zoom");
            ui.separator();

            let slider = ui.add(egui::Slider::new(&mut panel.zoom, 1.0..=20.0).logarithmic(true));
            if slider.drag_stopped() || (slider.changed() && !slider.dragged()) {
                globe.set_zoom(panel.zoom);
            }
            if ui.button("Reset zoom").clicked() {
                panel.zoom = 1.0;
                globe.reset_zoom();
            }

            ui.add_space(10.0);
            ui.heading("Regions");
            ui.separator();

            ui.horizontal_wrapped(|ui| {
                for region in MacroRegion::all() {
                    if ui.button(region.label()).clicked() {
                        panel.status_message =
                            match globe.zoom_on_region(*region, None, None, None) {
                                Ok(_) => format!("Zooming on {}", region.label()),
                                Err(e) => e.to_string(),
                            };
                        panel.zoom = region.anchor().zoom;
                    }
                }
            });

            let regions: Vec<(String, bool)> = globe
                .dataset()
                .regions()
                .iter()
                .map(|r| {
                    let on = r.countries.iter().any(|c| globe.is_country_highlighted(c));
                    (r.name.clone(), on)
                })
                .collect();

            if !regions.is_empty() {
                ui.add_space(5.0);
                ui.label(RichText::new("Highlight region").small());
                for (name, mut on) in regions {
                    if ui.checkbox(&mut on, &name).changed() {
                        let result = if on {
                            globe.highlight_region(&name, Some(panel.highlight_color))
                        } else {
                            globe.unhighlight_region(&name)
                        };
                        let verb = if on { "highlighted" } else { "unhighlighted" };
                        panel.status_message = describe(&name, verb, result);
                    }
                }
            }
        });
}

fn describe(name: &str, verb: &str, result: GlobeResult<Outcome>) -> String {
    match result {
        Ok(Outcome::Applied) => format!("{} {}", name, verb),
        Ok(Outcome::Unchanged) => format!("{} already {}", name, verb),
        Err(e) => e.to_string(),
    }
}

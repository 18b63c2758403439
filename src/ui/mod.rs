//! UI modules for the Country Globe demo.
//!
//! The UI is split into distinct panels:
//! - Top bar: Title, status and view summary
//! - Left panel: Navigation and highlight controls
//! - Central canvas: The globe texture

mod canvas;
mod left_panel;
mod texture_cache;
mod top_bar;

use eframe::egui::Color32;

pub use canvas::render_canvas;
pub use left_panel::render_left_panel;
pub use texture_cache::GlobeTextureCache;
pub use top_bar::render_top_bar;

/// Widget state that lives outside the globe.
pub struct PanelState {
    /// Country or region typed by the user
    pub name_input: String,
    /// Color used for new highlights
    pub highlight_color: Color32,
    /// Zoom slider value
    pub zoom: f64,
    pub status_message: String,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            name_input: String::new(),
            highlight_color: Color32::from_rgb(232, 84, 63),
            zoom: 1.0,
            status_message: "Ready".to_string(),
        }
    }
}

//! Central canvas UI: the globe texture.

use super::GlobeTextureCache;
use country_globe::{Globe, PixelCanvas, Viewport};
use eframe::egui::{self, Color32, Pos2, Rect, Sense};

/// Draws the latest globe frame and returns the canvas size in pixels.
pub fn render_canvas(
    ctx: &egui::Context,
    globe: &Globe<PixelCanvas>,
    texture_cache: &mut GlobeTextureCache,
) -> Viewport {
    let mut host = Viewport::default();

    egui::CentralPanel::default().show(ctx, |ui| {
        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, Sense::hover());
        let rect = response.rect;

        painter.rect_filled(rect, 0.0, Color32::from_rgb(20, 20, 35));

        let pixels_per_point = ctx.pixels_per_point();
        host = Viewport::new(
            (rect.width() * pixels_per_point).round().max(0.0) as u32,
            (rect.height() * pixels_per_point).round().max(0.0) as u32,
        );

        let frame = globe.frames_rendered();
        if frame > 0 && !texture_cache.is_current(frame) {
            texture_cache.update(ctx, frame, globe.surface());
        }

        if let Some(texture) = texture_cache.texture() {
            // The texture keeps its size until the debounced resize lands
            let size = texture.size_vec2() / pixels_per_point;
            let image_rect = Rect::from_min_size(rect.min, size);
            painter.image(
                texture.id(),
                image_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    });

    host
}

//! Texture cache for the rendered globe.
//!
//! The globe canvas is only uploaded when the globe has drawn a new frame.

use country_globe::PixelCanvas;
use eframe::egui::{self, TextureHandle, TextureOptions};

/// Holds the globe texture and the frame it was uploaded from.
pub struct GlobeTextureCache {
    texture: Option<TextureHandle>,
    /// Frame counter value of the uploaded canvas
    frame: Option<u64>,
}

impl Default for GlobeTextureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobeTextureCache {
    pub fn new() -> Self {
        Self {
            texture: None,
            frame: None,
        }
    }

    /// Whether the cached texture shows `frame`.
    pub fn is_current(&self, frame: u64) -> bool {
        self.frame == Some(frame) && self.texture.is_some()
    }

    /// Uploads the canvas as the texture for `frame`.
    pub fn update(&mut self, ctx: &egui::Context, frame: u64, canvas: &PixelCanvas) {
        let image = canvas.to_color_image();
        log::debug!(
            "Updating globe texture: {}x{} for frame {}",
            image.width(),
            image.height(),
            frame
        );

        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("globe_texture", image, TextureOptions::LINEAR));
            }
        }
        self.frame = Some(frame);
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }
}

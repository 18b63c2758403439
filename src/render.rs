//! Globe rendering.
//!
//! A frame is drawn back to front in four passes: sphere, land, highlighted
//! countries, then the border mesh. Borders are always drawn last so that no
//! highlight fill can cover them.

use crate::config::{GlobeConfig, LayerStyle};
use crate::error::{GlobeError, GlobeResult};
use crate::geo::{GeoDataset, GeoShape, ScreenPath};
use crate::highlight::HighlightStore;
use crate::projection::ProjectionController;
use crate::viewport::Viewport;
use eframe::egui::Color32;

/// A 2D surface the globe can be drawn on.
pub trait DrawSurface {
    /// Current size of the host element the surface lives in.
    fn host_size(&self) -> Viewport;

    /// Size of the drawing buffer.
    fn size(&self) -> Viewport;

    /// Resizes the drawing buffer; contents are discarded.
    fn set_size(&mut self, size: Viewport);

    fn clear(&mut self);

    /// Fills the closed rings of `path` (even-odd).
    fn fill(&mut self, path: &ScreenPath, color: Color32);

    fn stroke(&mut self, path: &ScreenPath, color: Color32, width: f32);
}

/// Draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Fill { color: Color32, path: ScreenPath },
    Stroke { color: Color32, width: f32, path: ScreenPath },
}

/// Surface that records draw calls instead of drawing them.
///
/// Used by headless hosts and to inspect pass ordering.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    host: Viewport,
    size: Viewport,
    commands: Vec<DrawCommand>,
    frames: usize,
}

impl RecordingSurface {
    pub fn new(host: Viewport) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Simulates the host element changing size.
    pub fn set_host_size(&mut self, host: Viewport) {
        self.host = host;
    }

    /// Commands of the most recent frame.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of times the surface has been cleared.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl DrawSurface for RecordingSurface {
    fn host_size(&self) -> Viewport {
        self.host
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn set_size(&mut self, size: Viewport) {
        self.size = size;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.frames += 1;
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill(&mut self, path: &ScreenPath, color: Color32) {
        self.commands.push(DrawCommand::Fill {
            color,
            path: path.clone(),
        });
    }

    fn stroke(&mut self, path: &ScreenPath, color: Color32, width: f32) {
        self.commands.push(DrawCommand::Stroke {
            color,
            width,
            path: path.clone(),
        });
    }
}

/// Draws the globe layers onto a [`DrawSurface`].
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    frames: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Clears `surface` and draws one full frame.
    pub fn render<S: DrawSurface>(
        &mut self,
        surface: &mut S,
        projection: &ProjectionController,
        dataset: &GeoDataset,
        highlights: &HighlightStore,
        config: &GlobeConfig,
    ) -> GlobeResult<()> {
        if !projection.is_renderable() {
            let viewport = projection.viewport();
            log::warn!(
                "Skipping render: viewport is {}x{}",
                viewport.width,
                viewport.height
            );
            return Err(GlobeError::DegenerateViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        surface.clear();

        // Sphere
        let sphere = projection.path_for(GeoShape::Sphere);
        draw_layer(surface, &sphere, &config.globe);

        // Land
        let land = projection.path_for(GeoShape::Polygons(dataset.land()));
        draw_layer(surface, &land, &config.land);

        // Highlights, fill only, in insertion order
        for entry in highlights.entries() {
            let Some(country) = dataset.country(entry.geometry) else {
                continue;
            };
            let path = projection.path_for(GeoShape::Polygons(&country.geometry));
            if !path.is_empty() {
                surface.fill(&path, entry.color);
            }
        }

        // Borders
        let borders = projection.path_for(GeoShape::Lines(dataset.borders()));
        if let Some((color, width)) = config.borders.stroke() {
            if !borders.is_empty() {
                surface.stroke(&borders, color, width);
            }
        }

        self.frames += 1;
        Ok(())
    }
}

fn draw_layer<S: DrawSurface>(surface: &mut S, path: &ScreenPath, style: &LayerStyle) {
    if path.is_empty() {
        return;
    }
    if let Some(fill) = style.fill_style {
        surface.fill(path, fill);
    }
    if let Some((color, width)) = style.stroke() {
        surface.stroke(path, color, width);
    }
}

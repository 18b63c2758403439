//! Projection state owned by one globe.
//!
//! The projection scale is always `base_scale * zoom_factor`, where the base
//! scale fits the whole sphere into the unzoomed viewport.

use crate::error::{GlobeError, GlobeResult};
use crate::geo::{project_shape, GeoShape, Orthographic, Rotation, ScreenPath};
use crate::viewport::Viewport;
use geo_types::MultiPolygon;
use glam::DVec2;

/// Owns the orthographic projection, its base scale and the viewport fit.
#[derive(Debug, Clone)]
pub struct ProjectionController {
    projection: Orthographic,
    viewport: Viewport,
    base_scale: f64,
    zoom_factor: f64,
}

impl Default for ProjectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionController {
    pub fn new() -> Self {
        Self {
            projection: Orthographic::new(),
            viewport: Viewport::default(),
            base_scale: 0.0,
            zoom_factor: 1.0,
        }
    }

    /// Fits the projection to `viewport` at the current zoom factor.
    ///
    /// The sphere is fitted into the viewport grown by the zoom factor around
    /// its centre, so zooming stays centred instead of clamping to the
    /// corners. The base scale is fitted to the unzoomed viewport.
    pub fn configure(&mut self, viewport: Viewport) -> GlobeResult<()> {
        self.viewport = viewport;
        if viewport.is_degenerate() {
            log::warn!(
                "Cannot fit projection to {}x{} viewport",
                viewport.width,
                viewport.height
            );
            return Err(GlobeError::DegenerateViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let size = DVec2::new(viewport.width as f64, viewport.height as f64);

        let mut base = self.projection.clone();
        base.fit_extent(DVec2::ZERO, size, GeoShape::Sphere);
        self.base_scale = base.scale();

        let center = size / 2.0;
        let half = size * self.zoom_factor / 2.0;
        self.projection
            .fit_extent(center - half, center + half, GeoShape::Sphere);

        log::debug!(
            "Configured projection for {}x{}: base scale {:.2}, zoom {:.2}",
            viewport.width,
            viewport.height,
            self.base_scale,
            self.zoom_factor
        );
        Ok(())
    }

    /// Whether the projection has been fitted to a usable viewport.
    pub fn is_renderable(&self) -> bool {
        !self.viewport.is_degenerate() && self.base_scale > 0.0
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> &Orthographic {
        &self.projection
    }

    pub fn rotation(&self) -> Rotation {
        self.projection.rotation()
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        self.projection.set_rotation(rotation);
    }

    pub fn scale(&self) -> f64 {
        self.projection.scale()
    }

    /// Sets the absolute scale; the zoom factor follows.
    pub fn set_scale(&mut self, scale: f64) {
        self.projection.set_scale(scale);
        if self.base_scale > 0.0 {
            self.zoom_factor = scale / self.base_scale;
        }
    }

    pub fn base_scale(&self) -> f64 {
        self.base_scale
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Sets the zoom factor (clamped to at least 1) and refits.
    pub fn set_zoom_factor(&mut self, zoom_factor: f64) -> GlobeResult<()> {
        self.zoom_factor = clamp_zoom(zoom_factor);
        self.configure(self.viewport)
    }

    /// Drawable path for `shape` under the current projection.
    pub fn path_for(&self, shape: GeoShape<'_>) -> ScreenPath {
        project_shape(&self.projection, shape)
    }

    /// Scale at which `geometry`, seen with `rotation`, fills the viewport.
    pub fn fit_scale(&self, geometry: &MultiPolygon<f64>, rotation: Rotation) -> Option<f64> {
        if !self.is_renderable() {
            return None;
        }
        let mut fitted = self.projection.clone();
        fitted.set_rotation(rotation);
        let size = DVec2::new(self.viewport.width as f64, self.viewport.height as f64);
        fitted
            .fit_extent(DVec2::ZERO, size, GeoShape::Polygons(geometry))
            .then(|| fitted.scale())
    }
}

/// Zoom factors below 1 (or not finite) fall back to the full globe view.
pub fn clamp_zoom(zoom_factor: f64) -> f64 {
    if zoom_factor.is_finite() {
        zoom_factor.max(1.0)
    } else {
        1.0
    }
}

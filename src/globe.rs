//! The globe widget: one dataset, one surface, one projection.
//!
//! [`Globe`] owns every per-instance component and exposes the operations a
//! host calls. Highlight changes redraw synchronously before returning;
//! navigation advances through [`Globe::tick`] or
//! [`Globe::on_animation_frame`], which the host drives from its frame loop.

use crate::config::GlobeConfig;
use crate::error::{GlobeResult, Outcome};
use crate::geo::{GeoDataset, Rotation};
use crate::highlight::HighlightStore;
use crate::navigation::{FrameOutcome, FrameTicket, MacroRegion, NavigationEngine, ZoomLevel};
use crate::projection::ProjectionController;
use crate::render::{DrawSurface, Renderer};
use crate::viewport::ViewportController;
use eframe::egui::Color32;
use std::sync::Arc;
use std::time::Duration;
use web_time::Instant;

/// An interactive orthographic globe drawn onto `S`.
pub struct Globe<S: DrawSurface> {
    dataset: Arc<GeoDataset>,
    config: GlobeConfig,
    surface: S,
    projection: ProjectionController,
    highlights: HighlightStore,
    navigation: NavigationEngine,
    viewport: ViewportController,
    renderer: Renderer,
}

impl<S: DrawSurface> Globe<S> {
    pub fn new(dataset: Arc<GeoDataset>, config: GlobeConfig, surface: S) -> Self {
        let highlights = HighlightStore::new(config.highlight_color);
        let navigation = NavigationEngine::new(
            Duration::from_millis(config.zoom_duration_ms),
            config.auto_zoom_correction,
        );
        let viewport = ViewportController::new(Duration::from_millis(config.resize_debounce_ms));

        Self {
            dataset,
            config,
            surface,
            projection: ProjectionController::new(),
            highlights,
            navigation,
            viewport,
            renderer: Renderer::new(),
        }
    }

    /// Sizes the surface, applies the configured highlights and draws the
    /// first frame.
    pub fn init(&mut self) -> GlobeResult<()> {
        log::info!(
            "Initializing globe '{}' with {} countries",
            self.config.container,
            self.dataset.countries().len()
        );

        for item in &self.config.highlighted_countries {
            let result = self
                .highlights
                .highlight_country(&self.dataset, &item.name, item.color);
            if let Err(e) = result {
                log::debug!("Skipping configured country: {}", e);
            }
        }
        for item in &self.config.highlighted_regions {
            let result = self
                .highlights
                .highlight_region(&self.dataset, &item.name, item.color);
            if let Err(e) = result {
                log::debug!("Skipping configured region: {}", e);
            }
        }

        self.resize()
    }

    /// Clears the surface and draws a full frame.
    pub fn render(&mut self) -> GlobeResult<()> {
        self.renderer.render(
            &mut self.surface,
            &self.projection,
            &self.dataset,
            &self.highlights,
            &self.config,
        )
    }

    /// Redraw after a state change; failures are already logged.
    fn redraw(&mut self) {
        if let Err(e) = self.render() {
            log::debug!("Redraw skipped: {}", e);
        }
    }

    fn redraw_if(&mut self, outcome: Outcome) -> Outcome {
        if outcome.is_applied() {
            self.redraw();
        }
        outcome
    }

    /// Highlights a region if `name` is one, otherwise a country. Redraws once.
    pub fn highlight(&mut self, name: &str, color: Option<Color32>) -> GlobeResult<Outcome> {
        let outcome = self.highlights.highlight(&self.dataset, name, color)?;
        Ok(self.redraw_if(outcome))
    }

    pub fn unhighlight(&mut self, name: &str) -> GlobeResult<Outcome> {
        let outcome = self.highlights.unhighlight(&self.dataset, name)?;
        Ok(self.redraw_if(outcome))
    }

    /// Highlights one country, redrawing only when `render` is set.
    pub fn highlight_country(
        &mut self,
        name: &str,
        color: Option<Color32>,
        render: bool,
    ) -> GlobeResult<Outcome> {
        let outcome = self.highlights.highlight_country(&self.dataset, name, color)?;
        Ok(if render { self.redraw_if(outcome) } else { outcome })
    }

    pub fn unhighlight_country(&mut self, name: &str, render: bool) -> GlobeResult<Outcome> {
        let outcome = self.highlights.unhighlight_country(&self.dataset, name)?;
        Ok(if render { self.redraw_if(outcome) } else { outcome })
    }

    pub fn highlight_region(&mut self, name: &str, color: Option<Color32>) -> GlobeResult<Outcome> {
        let outcome = self.highlights.highlight_region(&self.dataset, name, color)?;
        Ok(self.redraw_if(outcome))
    }

    pub fn unhighlight_region(&mut self, name: &str) -> GlobeResult<Outcome> {
        let outcome = self.highlights.unhighlight_region(&self.dataset, name)?;
        Ok(self.redraw_if(outcome))
    }

    pub fn is_country_highlighted(&self, name: &str) -> bool {
        self.highlights.is_highlighted(&self.dataset, name)
    }

    /// Rotates onto a country, keeping the current zoom.
    pub fn center_on_country(&mut self, name: &str) -> GlobeResult<FrameTicket> {
        self.navigation.navigate_to_country(
            &self.dataset,
            &self.projection,
            name,
            None,
            0.0,
            0.0,
            Instant::now(),
        )
    }

    /// Zooms onto a macro-region if `name` is one, otherwise a country.
    ///
    /// Countries default to an automatic zoom; regions to their anchor's
    /// zoom and offsets.
    pub fn zoom_on(
        &mut self,
        name: &str,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        match MacroRegion::from_name(name) {
            Some(region) => self.zoom_on_region(region, zoom, offset_x, offset_y),
            None => self.zoom_on_country(
                name,
                zoom.unwrap_or(ZoomLevel::Auto),
                offset_x.unwrap_or(0.0),
                offset_y.unwrap_or(0.0),
            ),
        }
    }

    pub fn zoom_on_country(
        &mut self,
        name: &str,
        zoom: ZoomLevel,
        offset_x: f64,
        offset_y: f64,
    ) -> GlobeResult<FrameTicket> {
        self.navigation.navigate_to_country(
            &self.dataset,
            &self.projection,
            name,
            Some(zoom),
            offset_x,
            offset_y,
            Instant::now(),
        )
    }

    /// Zooms onto a macro-region's anchor country; given values override the
    /// anchor's defaults.
    pub fn zoom_on_region(
        &mut self,
        region: MacroRegion,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        let anchor = region.anchor();
        self.zoom_on_country(
            anchor.country,
            zoom.unwrap_or(ZoomLevel::Factor(anchor.zoom)),
            offset_x.unwrap_or(anchor.offset_x),
            offset_y.unwrap_or(anchor.offset_y),
        )
    }

    pub fn zoom_on_africa(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::Africa, zoom, offset_x, offset_y)
    }

    pub fn zoom_on_asia(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::Asia, zoom, offset_x, offset_y)
    }

    pub fn zoom_on_europe(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::Europe, zoom, offset_x, offset_y)
    }

    pub fn zoom_on_north_america(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::NorthAmerica, zoom, offset_x, offset_y)
    }

    pub fn zoom_on_south_america(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::SouthAmerica, zoom, offset_x, offset_y)
    }

    pub fn zoom_on_oceania(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::Oceania, zoom, offset_x, offset_y)
    }

    pub fn zoom_on_middle_east(
        &mut self,
        zoom: Option<ZoomLevel>,
        offset_x: Option<f64>,
        offset_y: Option<f64>,
    ) -> GlobeResult<FrameTicket> {
        self.zoom_on_region(MacroRegion::MiddleEast, zoom, offset_x, offset_y)
    }

    /// Animates the zoom factor, holding the rotation.
    ///
    /// Returns `None` when already at that zoom or the factor is not a number.
    pub fn set_zoom(&mut self, factor: f64) -> Option<FrameTicket> {
        self.navigation
            .set_zoom(&self.projection, factor, Instant::now())
    }

    pub fn reset_zoom(&mut self) -> Option<FrameTicket> {
        self.set_zoom(1.0)
    }

    /// Records a host resize event; the resize runs once the burst settles.
    pub fn notify_resize(&mut self, now: Instant) {
        self.viewport.notify_resize(now);
    }

    /// Matches the surface to its host, refits the projection, restores the
    /// current zoom target or requested zoom without animating and draws once.
    pub fn resize(&mut self) -> GlobeResult<()> {
        let host = self.surface.host_size();
        self.surface.set_size(host);
        self.projection.configure(host)?;

        if !self.navigation.recenter(&self.dataset, &mut self.projection)? {
            log::debug!("Resized to {}x{} with nothing to re-centre", host.width, host.height);
        }
        self.render()
    }

    /// Advances the globe to `now`: runs a settled resize, then applies the
    /// current animation frame.
    pub fn tick(&mut self, now: Instant) -> FrameOutcome {
        if self.viewport.poll(now) {
            if let Err(e) = self.resize() {
                log::debug!("Resize skipped: {}", e);
            }
        }

        let outcome = self.navigation.tick(now, &mut self.projection);
        if outcome.needs_render() {
            self.redraw();
        }
        outcome
    }

    /// Applies the animation frame scheduled for `ticket`; stale tickets are
    /// ignored.
    pub fn on_animation_frame(&mut self, ticket: FrameTicket, now: Instant) -> FrameOutcome {
        let outcome = self
            .navigation
            .apply_frame(ticket, now, &mut self.projection);
        if outcome.needs_render() {
            self.redraw();
        }
        outcome
    }

    pub fn current_ticket(&self) -> Option<FrameTicket> {
        self.navigation.current_ticket()
    }

    pub fn is_animating(&self) -> bool {
        self.navigation.is_animating()
    }

    /// Whether a resize event is waiting for its burst to settle.
    pub fn has_pending_resize(&self) -> bool {
        self.viewport.has_pending()
    }

    pub fn rotation(&self) -> Rotation {
        self.projection.rotation()
    }

    pub fn scale(&self) -> f64 {
        self.projection.scale()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.projection.zoom_factor()
    }

    pub fn projection(&self) -> &ProjectionController {
        &self.projection
    }

    pub fn highlights(&self) -> &HighlightStore {
        &self.highlights
    }

    pub fn navigation(&self) -> &NavigationEngine {
        &self.navigation
    }

    pub fn dataset(&self) -> &GeoDataset {
        &self.dataset
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Number of frames drawn so far.
    pub fn frames_rendered(&self) -> u64 {
        self.renderer.frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightSpec;
    use crate::error::GlobeError;
    use crate::geo::sample_dataset;
    use crate::render::RecordingSurface;
    use crate::viewport::Viewport;

    fn globe() -> Globe<RecordingSurface> {
        let mut globe = Globe::new(
            Arc::new(sample_dataset()),
            GlobeConfig::default(),
            RecordingSurface::new(Viewport::new(800, 600)),
        );
        globe.init().unwrap();
        globe
    }

    fn finish(globe: &mut Globe<RecordingSurface>) {
        let outcome = globe.tick(Instant::now() + Duration::from_secs(5));
        assert_eq!(outcome, FrameOutcome::Finished);
    }

    fn target(globe: &Globe<RecordingSurface>, name: &str) -> Rotation {
        let country = globe.dataset().country_by_name(name).unwrap();
        NavigationEngine::target_rotation(country, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_init_applies_configured_highlights() {
        let mut config = GlobeConfig::default();
        config.highlighted_countries = vec![
            HighlightSpec::new("Spain", None),
            HighlightSpec::new("Atlantis", None),
        ];
        config.highlighted_regions = vec![HighlightSpec::new(
            "western europe",
            Some(Color32::from_rgb(0, 0, 255)),
        )];

        let mut globe = Globe::new(
            Arc::new(sample_dataset()),
            config,
            RecordingSurface::new(Viewport::new(640, 480)),
        );
        globe.init().unwrap();

        assert_eq!(globe.highlights().len(), 5);
        assert!(globe.is_country_highlighted("spain"));
        assert!(globe.is_country_highlighted("luxembourg"));
        assert_eq!(globe.frames_rendered(), 1);
        assert_eq!(globe.surface().size(), Viewport::new(640, 480));
    }

    #[test]
    fn test_highlight_renders_synchronously() {
        let mut globe = globe();
        let before = globe.frames_rendered();

        assert_eq!(globe.highlight_country("france", None, true), Ok(Outcome::Applied));
        assert_eq!(globe.frames_rendered(), before + 1);

        // Redundant and deferred calls do not draw
        assert_eq!(globe.highlight_country("France", None, true), Ok(Outcome::Unchanged));
        globe.highlight_country("italy", None, false).unwrap();
        assert_eq!(globe.frames_rendered(), before + 1);
    }

    #[test]
    fn test_region_renders_once() {
        let mut globe = globe();
        let before = globe.frames_rendered();

        globe.highlight("Western Europe", None).unwrap();
        assert_eq!(globe.frames_rendered(), before + 1);

        globe.unhighlight("western europe").unwrap();
        assert_eq!(globe.frames_rendered(), before + 2);
        assert!(globe.highlights().is_empty());
    }

    #[test]
    fn test_unknown_names_are_reported() {
        let mut globe = globe();
        let before = globe.frames_rendered();

        assert!(matches!(
            globe.highlight("atlantis", None),
            Err(GlobeError::UnknownName(_))
        ));
        assert!(globe.zoom_on("atlantis", None, None, None).is_err());
        assert!(!globe.is_country_highlighted("atlantis"));
        assert!(!globe.is_animating());
        assert_eq!(globe.frames_rendered(), before);
    }

    #[test]
    fn test_zoom_on_country() {
        let mut globe = globe();
        globe
            .zoom_on_country("germany", ZoomLevel::Factor(14.0), 0.0, 0.0)
            .unwrap();
        finish(&mut globe);

        assert_eq!(globe.scale(), globe.projection().base_scale() * 14.0);
        assert!(globe.rotation().approx_eq(&target(&globe, "germany"), 1e-9));
    }

    #[test]
    fn test_zoom_on_region_uses_anchor() {
        let mut globe = globe();
        globe.zoom_on("Europe", None, None, None).unwrap();
        finish(&mut globe);

        let anchor = MacroRegion::Europe.anchor();
        let germany = target(&globe, "germany");
        assert!((globe.zoom_factor() - anchor.zoom).abs() < 1e-9);
        assert!((globe.rotation().lambda - (germany.lambda - anchor.offset_x)).abs() < 1e-9);
        assert!((globe.rotation().phi - (germany.phi - anchor.offset_y)).abs() < 1e-9);
    }

    #[test]
    fn test_region_shortcut_overrides() {
        let mut globe = globe();
        globe
            .zoom_on_africa(Some(ZoomLevel::Factor(5.0)), Some(0.0), Some(0.0))
            .unwrap();
        finish(&mut globe);

        assert!((globe.zoom_factor() - 5.0).abs() < 1e-9);
        assert!(globe
            .rotation()
            .approx_eq(&target(&globe, "central african republic"), 1e-9));
    }

    #[test]
    fn test_stale_frames_are_ignored() {
        let mut globe = globe();
        let germany = globe
            .zoom_on_country("germany", ZoomLevel::Factor(14.0), 0.0, 0.0)
            .unwrap();
        let france = globe
            .zoom_on_country("france", ZoomLevel::Factor(2.0), 0.0, 0.0)
            .unwrap();

        let late = Instant::now() + Duration::from_secs(5);
        let before = globe.frames_rendered();
        assert_eq!(globe.on_animation_frame(germany, late), FrameOutcome::Stale);
        assert_eq!(globe.frames_rendered(), before);
        assert_eq!(globe.on_animation_frame(france, late), FrameOutcome::Finished);

        assert!((globe.zoom_factor() - 2.0).abs() < 1e-9);
        assert!(globe.rotation().approx_eq(&target(&globe, "france"), 1e-9));
    }

    #[test]
    fn test_center_on_country_keeps_zoom() {
        let mut globe = globe();
        globe.set_zoom(3.0).unwrap();
        finish(&mut globe);

        globe.center_on_country("brazil").unwrap();
        finish(&mut globe);

        assert!((globe.zoom_factor() - 3.0).abs() < 1e-9);
        assert!(globe.rotation().approx_eq(&target(&globe, "brazil"), 1e-9));
    }

    #[test]
    fn test_reset_zoom() {
        let mut globe = globe();
        globe
            .zoom_on_country("italy", ZoomLevel::Factor(8.0), 0.0, 0.0)
            .unwrap();
        finish(&mut globe);
        let rotation = globe.rotation();

        globe.reset_zoom().unwrap();
        finish(&mut globe);

        assert_eq!(globe.scale(), globe.projection().base_scale());
        assert_eq!(globe.rotation(), rotation);
        assert!(globe.reset_zoom().is_none());
    }

    #[test]
    fn test_resize_recentres_immediately() {
        let mut globe = globe();
        globe
            .zoom_on_country("italy", ZoomLevel::Factor(3.0), 0.0, 0.0)
            .unwrap();
        finish(&mut globe);

        // Drift away, then resize
        globe.center_on_country("china").unwrap();
        globe.surface_mut().set_host_size(Viewport::new(400, 1000));
        let before = globe.frames_rendered();
        globe.resize().unwrap();

        assert_eq!(globe.frames_rendered(), before + 1);
        assert!(!globe.is_animating());
        assert_eq!(globe.rotation(), target(&globe, "china"));
        assert!((globe.scale() - 200.0 * 3.0).abs() < 1e-6);
        assert_eq!(globe.surface().size(), Viewport::new(400, 1000));
    }

    #[test]
    fn test_resize_keeps_requested_zoom() {
        let mut globe = globe();
        let t0 = Instant::now();
        globe.set_zoom(3.0).unwrap();
        globe.tick(t0 + Duration::from_millis(300));
        assert!(globe.is_animating());
        assert!(globe.navigation().zoom_target().is_none());

        globe.surface_mut().set_host_size(Viewport::new(800, 601));
        globe.resize().unwrap();
        assert!(!globe.is_animating());
        assert_eq!(globe.tick(t0 + Duration::from_secs(5)), FrameOutcome::Stale);

        assert!((globe.zoom_factor() - 3.0).abs() < 1e-9);
        assert!((globe.scale() - 300.5 * 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_is_debounced() {
        let mut globe = globe();
        globe.surface_mut().set_host_size(Viewport::new(300, 300));
        let t0 = Instant::now();

        globe.notify_resize(t0);
        globe.notify_resize(t0 + Duration::from_millis(120));
        globe.tick(t0 + Duration::from_millis(250));
        assert_eq!(globe.surface().size(), Viewport::new(800, 600));
        assert!(globe.has_pending_resize());

        let before = globe.frames_rendered();
        globe.tick(t0 + Duration::from_millis(320));
        assert_eq!(globe.surface().size(), Viewport::new(300, 300));
        assert_eq!(globe.frames_rendered(), before + 1);
        assert!(!globe.has_pending_resize());
    }

    #[test]
    fn test_degenerate_host() {
        let mut globe = Globe::new(
            Arc::new(sample_dataset()),
            GlobeConfig::default(),
            RecordingSurface::new(Viewport::new(0, 0)),
        );
        assert!(matches!(
            globe.init(),
            Err(GlobeError::DegenerateViewport { .. })
        ));
        assert_eq!(globe.frames_rendered(), 0);

        // Highlights still apply; drawing waits for a usable size
        assert_eq!(globe.highlight_country("spain", None, true), Ok(Outcome::Applied));
        assert_eq!(globe.frames_rendered(), 0);
    }
}

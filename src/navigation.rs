//! Animated navigation: rotate and zoom the globe onto a country or region.
//!
//! Every navigation request starts a new [`AnimationSession`] stamped with a
//! fresh generation number. Frames carry the generation they were scheduled
//! for through a [`FrameTicket`]; a frame whose generation is no longer
//! current is ignored, so the latest request always wins.

use crate::error::{GlobeError, GlobeResult};
use crate::geo::{
    lerp, normalize_name, spherical_centroid, Country, GeoDataset, Rotation, RotationInterpolator,
};
use crate::projection::{clamp_zoom, ProjectionController};
use std::time::Duration;
use web_time::Instant;

/// Hand-tuned zoom levels for countries whose bounding fit is misleading
/// (very large, far-flung territories or enclaves).
const AUTO_ZOOM_OVERRIDES: &[(&str, f64)] = &[
    ("russia", 1.6),
    ("canada", 2.0),
    ("united states of america", 2.2),
    ("china", 2.4),
    ("brazil", 2.4),
    ("australia", 2.6),
    ("indonesia", 2.8),
    ("chile", 2.6),
    ("norway", 4.0),
    ("france", 5.0),
    ("netherlands", 9.0),
    ("united kingdom", 6.0),
    ("germany", 6.0),
    ("denmark", 9.0),
    ("new zealand", 4.5),
];

/// Zoom level requested for a navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomLevel {
    /// Fit the country to the viewport
    Auto,
    /// Explicit multiplier on the base scale
    Factor(f64),
}

impl From<f64> for ZoomLevel {
    fn from(factor: f64) -> Self {
        ZoomLevel::Factor(factor)
    }
}

/// Anchor used when zooming onto a macro-region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionAnchor {
    /// Country the view is centred on
    pub country: &'static str,
    pub zoom: f64,
    /// Extra rotation in degrees, longitude then latitude
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Named macro-regions with a zoom shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroRegion {
    Africa,
    Asia,
    Europe,
    NorthAmerica,
    SouthAmerica,
    Oceania,
    MiddleEast,
}

impl MacroRegion {
    pub fn label(&self) -> &'static str {
        match self {
            MacroRegion::Africa => "africa",
            MacroRegion::Asia => "asia",
            MacroRegion::Europe => "europe",
            MacroRegion::NorthAmerica => "north america",
            MacroRegion::SouthAmerica => "south america",
            MacroRegion::Oceania => "oceania",
            MacroRegion::MiddleEast => "middle east",
        }
    }

    pub fn all() -> &'static [MacroRegion] {
        &[
            MacroRegion::Africa,
            MacroRegion::Asia,
            MacroRegion::Europe,
            MacroRegion::NorthAmerica,
            MacroRegion::SouthAmerica,
            MacroRegion::Oceania,
            MacroRegion::MiddleEast,
        ]
    }

    /// Case-insensitive lookup by label.
    pub fn from_name(name: &str) -> Option<MacroRegion> {
        let key = normalize_name(name);
        Self::all().iter().copied().find(|r| r.label() == key)
    }

    pub fn anchor(&self) -> RegionAnchor {
        let (country, zoom, offset_x, offset_y) = match self {
            MacroRegion::Africa => ("central african republic", 2.0, 0.0, -5.0),
            MacroRegion::Asia => ("china", 1.6, -12.0, 5.0),
            MacroRegion::Europe => ("germany", 3.2, 5.0, 1.0),
            MacroRegion::NorthAmerica => ("united states of america", 1.8, -2.0, 8.0),
            MacroRegion::SouthAmerica => ("brazil", 2.0, -7.0, -5.0),
            MacroRegion::Oceania => ("australia", 2.2, 11.0, 3.0),
            MacroRegion::MiddleEast => ("iraq", 3.5, 0.0, -3.0),
        };
        RegionAnchor {
            country,
            zoom,
            offset_x,
            offset_y,
        }
    }
}

/// The country the globe was last navigated to, kept for resize recentring.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomTarget {
    pub country: String,
    pub zoom_factor: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Parameters of a navigation in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomSession {
    /// Country being navigated to (None for scale-only changes)
    pub target_country: Option<String>,
    /// Final zoom factor (None when the scale is held)
    pub target_zoom: Option<f64>,
    pub offset_x: f64,
    pub offset_y: f64,
    pub start_rotation: Rotation,
    pub start_scale: f64,
    pub start_time: Instant,
}

/// Identifies the session a scheduled frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

impl FrameTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of applying an animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame belonged to a superseded or finished session
    Stale,
    /// The frame was applied and more frames are needed
    Running,
    /// The final frame was applied
    Finished,
}

impl FrameOutcome {
    /// Whether the projection changed and needs to be redrawn.
    pub fn needs_render(&self) -> bool {
        !matches!(self, FrameOutcome::Stale)
    }
}

/// One tween from the session start state to its target.
#[derive(Debug, Clone)]
pub struct AnimationSession {
    generation: u64,
    session: ZoomSession,
    duration: Duration,
    rotation: Option<RotationInterpolator>,
    scale: Option<(f64, f64)>,
}

impl AnimationSession {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session(&self) -> &ZoomSession {
        &self.session
    }

    /// Linear progress in `[0, 1]` at `now`.
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.session.start_time);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn apply(&self, t: f64, projection: &mut ProjectionController) {
        if let Some(rotation) = &self.rotation {
            projection.rotate(rotation.at(t));
        }
        if let Some((from, to)) = self.scale {
            projection.set_scale(lerp(from, to, t));
        }
    }
}

/// Cubic ease-in-out.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0 * t - 2.0;
        1.0 + u * u * u / 2.0
    }
}

/// Drives rotation and scale animations for one globe.
#[derive(Debug, Clone)]
pub struct NavigationEngine {
    generation: u64,
    active: Option<AnimationSession>,
    zoom_target: Option<ZoomTarget>,
    /// Last scale-only zoom requested while no country was targeted
    requested_zoom: Option<f64>,
    duration: Duration,
    auto_zoom_correction: f64,
}

impl NavigationEngine {
    pub fn new(duration: Duration, auto_zoom_correction: f64) -> Self {
        Self {
            generation: 0,
            active: None,
            zoom_target: None,
            requested_zoom: None,
            duration,
            auto_zoom_correction,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<&AnimationSession> {
        self.active.as_ref()
    }

    /// Ticket for the session currently in flight.
    pub fn current_ticket(&self) -> Option<FrameTicket> {
        self.active.as_ref().map(|s| FrameTicket {
            generation: s.generation,
        })
    }

    pub fn zoom_target(&self) -> Option<&ZoomTarget> {
        self.zoom_target.as_ref()
    }

    /// Drops the session in flight; its pending frames become stale.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            log::debug!("Cancelled navigation session {}", self.generation);
        }
        self.generation += 1;
    }

    /// Rotation that centres `country`, shifted by the offsets.
    pub fn target_rotation(country: &Country, offset_x: f64, offset_y: f64) -> Option<Rotation> {
        let centroid = spherical_centroid(&country.geometry)?;
        Some(Rotation::new(
            -centroid.x - offset_x,
            -centroid.y - offset_y,
        ))
    }

    /// Zoom factor that frames `country` when seen with `rotation`.
    ///
    /// Countries in the override table use their tuned value. Others take
    /// the ratio of a fit to the viewport over the base scale, corrected
    /// for the raw fit's tendency to zoom in too far.
    pub fn auto_zoom(
        &self,
        country: &Country,
        rotation: Rotation,
        projection: &ProjectionController,
    ) -> f64 {
        if let Some(&(_, zoom)) = AUTO_ZOOM_OVERRIDES
            .iter()
            .find(|(name, _)| *name == country.name)
        {
            return zoom;
        }

        match projection.fit_scale(&country.geometry, rotation) {
            Some(fitted) if projection.base_scale() > 0.0 => {
                clamp_zoom(fitted / projection.base_scale() * self.auto_zoom_correction)
            }
            _ => 1.0,
        }
    }

    fn begin(
        &mut self,
        session: ZoomSession,
        rotation: Option<RotationInterpolator>,
        scale: Option<(f64, f64)>,
    ) -> FrameTicket {
        if self.active.is_some() {
            log::debug!("Superseding navigation session {}", self.generation);
        }
        self.generation += 1;
        self.active = Some(AnimationSession {
            generation: self.generation,
            session,
            duration: self.duration,
            rotation,
            scale,
        });
        FrameTicket {
            generation: self.generation,
        }
    }

    /// Starts rotating (and optionally zooming) onto a country.
    ///
    /// `zoom` of `None` keeps the current scale.
    pub fn navigate_to_country(
        &mut self,
        dataset: &GeoDataset,
        projection: &ProjectionController,
        name: &str,
        zoom: Option<ZoomLevel>,
        offset_x: f64,
        offset_y: f64,
        now: Instant,
    ) -> GlobeResult<FrameTicket> {
        let Some(country) = dataset.country_by_name(name) else {
            log::warn!("Cannot navigate to unknown country '{}'", name);
            return Err(GlobeError::UnknownName(name.to_string()));
        };
        let Some(target) = Self::target_rotation(country, offset_x, offset_y) else {
            log::warn!("Country '{}' has no geometry to navigate to", country.name);
            return Err(GlobeError::UnknownName(name.to_string()));
        };

        let target_zoom = zoom.map(|level| match level {
            ZoomLevel::Auto => self.auto_zoom(country, target, projection),
            ZoomLevel::Factor(factor) => clamp_zoom(factor),
        });

        let start_rotation = projection.rotation();
        let start_scale = projection.scale();
        let scale = target_zoom.and_then(|z| {
            let target_scale = projection.base_scale() * z;
            (target_scale != start_scale).then_some((start_scale, target_scale))
        });

        log::info!(
            "Navigating to '{}' (rotation {:.2}, {:.2}, zoom {})",
            country.name,
            target.lambda,
            target.phi,
            target_zoom.map_or("held".to_string(), |z| format!("{:.2}", z))
        );

        self.zoom_target = Some(ZoomTarget {
            country: country.name.clone(),
            zoom_factor: target_zoom.unwrap_or_else(|| projection.zoom_factor()),
            offset_x,
            offset_y,
        });

        let session = ZoomSession {
            target_country: Some(country.name.clone()),
            target_zoom,
            offset_x,
            offset_y,
            start_rotation,
            start_scale,
            start_time: now,
        };
        Ok(self.begin(
            session,
            Some(RotationInterpolator::new(start_rotation, target)),
            scale,
        ))
    }

    /// Starts animating the scale only. Returns `None` when nothing changes.
    pub fn set_zoom(
        &mut self,
        projection: &ProjectionController,
        factor: f64,
        now: Instant,
    ) -> Option<FrameTicket> {
        if !factor.is_finite() {
            log::warn!("Ignoring non-numeric zoom factor {}", factor);
            return None;
        }
        let factor = clamp_zoom(factor);
        let target_scale = projection.base_scale() * factor;
        if target_scale == projection.scale() && !self.is_animating() {
            log::debug!("Already at zoom {:.2}", factor);
            return None;
        }

        match self.zoom_target.as_mut() {
            Some(target) => target.zoom_factor = factor,
            None => self.requested_zoom = Some(factor),
        }

        let session = ZoomSession {
            target_country: None,
            target_zoom: Some(factor),
            offset_x: 0.0,
            offset_y: 0.0,
            start_rotation: projection.rotation(),
            start_scale: projection.scale(),
            start_time: now,
        };
        let scale = Some((projection.scale(), target_scale));
        Some(self.begin(session, None, scale))
    }

    /// Applies the frame for `ticket` at `now`.
    pub fn apply_frame(
        &mut self,
        ticket: FrameTicket,
        now: Instant,
        projection: &mut ProjectionController,
    ) -> FrameOutcome {
        let Some(session) = self.active.as_ref() else {
            return FrameOutcome::Stale;
        };
        if session.generation != ticket.generation {
            log::debug!(
                "Ignoring frame for stale session {} (current {})",
                ticket.generation,
                session.generation
            );
            return FrameOutcome::Stale;
        }

        let t = session.progress(now);
        session.apply(ease_cubic_in_out(t), projection);
        if t >= 1.0 {
            self.active = None;
            FrameOutcome::Finished
        } else {
            FrameOutcome::Running
        }
    }

    /// Applies a frame for whichever session is current.
    pub fn tick(&mut self, now: Instant, projection: &mut ProjectionController) -> FrameOutcome {
        match self.current_ticket() {
            Some(ticket) => self.apply_frame(ticket, now, projection),
            None => FrameOutcome::Stale,
        }
    }

    /// Immediately re-centres on the remembered zoom target, cancelling any
    /// animation. Without a target, a requested scale-only zoom is applied
    /// at once. Returns `false` when there is nothing to restore.
    pub fn recenter(
        &mut self,
        dataset: &GeoDataset,
        projection: &mut ProjectionController,
    ) -> GlobeResult<bool> {
        let Some(target) = self.zoom_target.clone() else {
            let Some(factor) = self.requested_zoom else {
                return Ok(false);
            };
            self.cancel();
            projection.set_zoom_factor(factor)?;
            log::debug!("Restored zoom {:.2}", factor);
            return Ok(true);
        };
        let Some(rotation) = dataset
            .country_by_name(&target.country)
            .and_then(|c| Self::target_rotation(c, target.offset_x, target.offset_y))
        else {
            return Err(GlobeError::UnknownName(target.country));
        };

        self.cancel();
        projection.rotate(rotation);
        projection.set_zoom_factor(target.zoom_factor)?;
        log::debug!(
            "Re-centred on '{}' at zoom {:.2}",
            target.country,
            target.zoom_factor
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::sample_dataset;
    use crate::viewport::Viewport;

    fn engine() -> NavigationEngine {
        NavigationEngine::new(Duration::from_millis(1250), 0.65)
    }

    fn projection() -> ProjectionController {
        let mut projection = ProjectionController::new();
        projection.configure(Viewport::new(800, 600)).unwrap();
        projection
    }

    fn finish(engine: &mut NavigationEngine, projection: &mut ProjectionController, t0: Instant) {
        assert_eq!(
            engine.tick(t0 + Duration::from_secs(2), projection),
            FrameOutcome::Finished
        );
    }

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-12);
        assert!(ease_cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn test_zoom_on_country_reaches_target() {
        let dataset = sample_dataset();
        let mut projection = projection();
        let mut engine = engine();
        let t0 = Instant::now();

        engine
            .navigate_to_country(
                &dataset,
                &projection,
                "germany",
                Some(ZoomLevel::Factor(14.0)),
                0.0,
                0.0,
                t0,
            )
            .unwrap();
        assert!(engine.is_animating());
        finish(&mut engine, &mut projection, t0);

        let germany = dataset.country_by_name("germany").unwrap();
        let centroid = spherical_centroid(&germany.geometry).unwrap();
        assert_eq!(projection.scale(), projection.base_scale() * 14.0);
        assert!(projection
            .rotation()
            .approx_eq(&Rotation::new(-centroid.x, -centroid.y), 1e-9));
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_mid_animation_is_between_endpoints() {
        let dataset = sample_dataset();
        let mut projection = projection();
        let mut engine = engine();
        let t0 = Instant::now();
        let start_scale = projection.scale();

        engine
            .navigate_to_country(
                &dataset,
                &projection,
                "france",
                Some(ZoomLevel::Factor(4.0)),
                0.0,
                0.0,
                t0,
            )
            .unwrap();
        let outcome = engine.tick(t0 + Duration::from_millis(625), &mut projection);

        assert_eq!(outcome, FrameOutcome::Running);
        assert!(projection.scale() > start_scale);
        assert!(projection.scale() < start_scale * 4.0);
    }

    #[test]
    fn test_offsets_shift_rotation() {
        let dataset = sample_dataset();
        let mut projection = projection();
        let mut engine = engine();
        let t0 = Instant::now();

        engine
            .navigate_to_country(
                &dataset,
                &projection,
                "spain",
                Some(ZoomLevel::Factor(2.0)),
                3.0,
                -2.0,
                t0,
            )
            .unwrap();
        finish(&mut engine, &mut projection, t0);

        let spain = dataset.country_by_name("spain").unwrap();
        let plain = NavigationEngine::target_rotation(spain, 0.0, 0.0).unwrap();
        let rotation = projection.rotation();
        assert!((rotation.lambda - (plain.lambda - 3.0)).abs() < 1e-9);
        assert!((rotation.phi - (plain.phi + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_country_starts_nothing() {
        let dataset = sample_dataset();
        let projection = projection();
        let mut engine = engine();

        let result = engine.navigate_to_country(
            &dataset,
            &projection,
            "atlantis",
            Some(ZoomLevel::Auto),
            0.0,
            0.0,
            Instant::now(),
        );

        assert_eq!(result, Err(GlobeError::UnknownName("atlantis".to_string())));
        assert!(!engine.is_animating());
        assert!(engine.zoom_target().is_none());
    }

    #[test]
    fn test_new_session_supersedes_old() {
        let dataset = sample_dataset();
        let mut projection = projection();
        let mut engine = engine();
        let t0 = Instant::now();

        let germany = engine
            .navigate_to_country(
                &dataset,
                &projection,
                "germany",
                Some(ZoomLevel::Factor(14.0)),
                0.0,
                0.0,
                t0,
            )
            .unwrap();
        engine.apply_frame(germany, t0 + Duration::from_millis(300), &mut projection);

        let france = engine
            .navigate_to_country(
                &dataset,
                &projection,
                "france",
                Some(ZoomLevel::Factor(3.0)),
                0.0,
                0.0,
                t0 + Duration::from_millis(300),
            )
            .unwrap();
        assert_ne!(germany, france);

        // A late Germany frame is ignored
        let late = t0 + Duration::from_secs(5);
        assert_eq!(engine.apply_frame(germany, late, &mut projection), FrameOutcome::Stale);
        assert_eq!(engine.apply_frame(france, late, &mut projection), FrameOutcome::Finished);
        assert_eq!(engine.apply_frame(germany, late, &mut projection), FrameOutcome::Stale);

        let france_target =
            NavigationEngine::target_rotation(dataset.country_by_name("france").unwrap(), 0.0, 0.0)
                .unwrap();
        assert_eq!(projection.scale(), projection.base_scale() * 3.0);
        assert!(projection.rotation().approx_eq(&france_target, 1e-9));
        assert_eq!(engine.zoom_target().unwrap().country, "france");
    }

    #[test]
    fn test_auto_zoom_override() {
        let dataset = sample_dataset();
        let projection = projection();
        let engine = engine();
        let germany = dataset.country_by_name("Germany").unwrap();
        let rotation = NavigationEngine::target_rotation(germany, 0.0, 0.0).unwrap();

        assert_eq!(engine.auto_zoom(germany, rotation, &projection), 6.0);
    }

    #[test]
    fn test_auto_zoom_fit() {
        let dataset = sample_dataset();
        let projection = projection();
        let engine = engine();
        let spain = dataset.country_by_name("spain").unwrap();
        let rotation = NavigationEngine::target_rotation(spain, 0.0, 0.0).unwrap();

        let fitted = projection.fit_scale(&spain.geometry, rotation).unwrap();
        let expected = fitted / projection.base_scale() * 0.65;
        let zoom = engine.auto_zoom(spain, rotation, &projection);
        assert!((zoom - expected).abs() < 1e-9);
        assert!(zoom > 1.0);
    }

    #[test]
    fn test_auto_zoom_never_below_one() {
        let dataset = sample_dataset();
        let projection = projection();
        let engine = NavigationEngine::new(Duration::from_millis(1250), 0.01);
        let spain = dataset.country_by_name("spain").unwrap();
        let rotation = NavigationEngine::target_rotation(spain, 0.0, 0.0).unwrap();
        assert_eq!(engine.auto_zoom(spain, rotation, &projection), 1.0);
    }

    #[test]
    fn test_set_zoom_animates_scale_only() {
        let mut projection = projection();
        projection.rotate(Rotation::new(20.0, -10.0));
        let mut engine = engine();
        let t0 = Instant::now();

        let ticket = engine.set_zoom(&projection, 5.0, t0).unwrap();
        let session = engine.active_session().unwrap().session();
        assert_eq!(session.target_country, None);
        assert_eq!(session.target_zoom, Some(5.0));
        engine.apply_frame(ticket, t0 + Duration::from_secs(2), &mut projection);

        assert_eq!(projection.scale(), projection.base_scale() * 5.0);
        assert_eq!(projection.rotation(), Rotation::new(20.0, -10.0));

        let ticket = engine.set_zoom(&projection, 1.0, t0).unwrap();
        engine.apply_frame(ticket, t0 + Duration::from_secs(2), &mut projection);
        assert_eq!(projection.scale(), projection.base_scale());
    }

    #[test]
    fn test_set_zoom_noops() {
        let projection = projection();
        let mut engine = engine();
        assert!(engine.set_zoom(&projection, 1.0, Instant::now()).is_none());
        assert!(engine.set_zoom(&projection, 0.5, Instant::now()).is_none());
        assert!(engine.set_zoom(&projection, f64::NAN, Instant::now()).is_none());
    }

    #[test]
    fn test_recenter_is_immediate() {
        let dataset = sample_dataset();
        let mut projection = projection();
        let mut engine = engine();
        let t0 = Instant::now();

        engine
            .navigate_to_country(
                &dataset,
                &projection,
                "italy",
                Some(ZoomLevel::Factor(3.0)),
                0.0,
                0.0,
                t0,
            )
            .unwrap();
        projection.configure(Viewport::new(300, 900)).unwrap();
        assert!(engine.recenter(&dataset, &mut projection).unwrap());

        let italy =
            NavigationEngine::target_rotation(dataset.country_by_name("italy").unwrap(), 0.0, 0.0)
                .unwrap();
        assert!(!engine.is_animating());
        assert_eq!(projection.rotation(), italy);
        assert!((projection.scale() - 150.0 * 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_macro_region_lookup() {
        assert_eq!(MacroRegion::from_name("North America"), Some(MacroRegion::NorthAmerica));
        assert_eq!(MacroRegion::from_name("atlantis"), None);
        for region in MacroRegion::all() {
            assert_eq!(MacroRegion::from_name(region.label()), Some(*region));
            assert!(region.anchor().zoom >= 1.0);
        }
    }
}

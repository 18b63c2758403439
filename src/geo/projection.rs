//! Orthographic projection and rotation.
//!
//! Converts geographic coordinates (lon, lat in degrees) to screen positions
//! as seen on a sphere viewed from infinite distance. Rotation follows the
//! usual `(λ, φ)` convention: rotating by `(λ, φ)` brings the point
//! `(-λ, -φ)` to the centre of the view.

use super::path::{project_shape, GeoShape};
use geo_types::Coord;
use glam::{DVec2, DVec3};

/// Scale used as the reference when fitting, matching the conventional default.
const REFERENCE_SCALE: f64 = 150.0;

/// View rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Longitude rotation λ
    pub lambda: f64,
    /// Latitude rotation φ
    pub phi: f64,
}

impl Rotation {
    pub fn new(lambda: f64, phi: f64) -> Self {
        Self { lambda, phi }
    }

    /// Rotation that puts `point` at the centre of the view.
    pub fn centering(point: Coord<f64>) -> Self {
        Self {
            lambda: -point.x,
            phi: -point.y,
        }
    }

    /// Geographic point shown at the centre of the view.
    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: -self.lambda,
            y: -self.phi,
        }
    }

    pub fn approx_eq(&self, other: &Rotation, epsilon: f64) -> bool {
        (self.lambda - other.lambda).abs() <= epsilon && (self.phi - other.phi).abs() <= epsilon
    }
}

/// Unit vector for a lon/lat pair in degrees. +X points at (0°, 0°).
pub fn to_unit_vector(coord: Coord<f64>) -> DVec3 {
    let (lon, lat) = (coord.x.to_radians(), coord.y.to_radians());
    let cos_lat = lat.cos();
    DVec3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

/// Lon/lat in degrees for a (not necessarily unit) vector.
pub fn from_vector(v: DVec3) -> Coord<f64> {
    let v = v.normalize_or_zero();
    Coord {
        x: v.y.atan2(v.x).to_degrees(),
        y: v.z.clamp(-1.0, 1.0).asin().to_degrees(),
    }
}

/// Orthographic projection with rotation, scale and translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Orthographic {
    rotation: Rotation,
    scale: f64,
    translate: DVec2,
}

impl Default for Orthographic {
    fn default() -> Self {
        Self {
            rotation: Rotation::default(),
            scale: REFERENCE_SCALE,
            translate: DVec2::new(480.0, 250.0),
        }
    }
}

impl Orthographic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn translate(&self) -> DVec2 {
        self.translate
    }

    pub fn set_translate(&mut self, translate: DVec2) {
        self.translate = translate;
    }

    /// Rotates a geographic point into view space.
    ///
    /// In view space +X points at the viewer, +Y right and +Z up.
    pub fn rotate(&self, coord: Coord<f64>) -> DVec3 {
        let rotated = to_unit_vector(Coord {
            x: coord.x + self.rotation.lambda,
            y: coord.y,
        });
        let (sin_phi, cos_phi) = self.rotation.phi.to_radians().sin_cos();
        DVec3::new(
            rotated.x * cos_phi - rotated.z * sin_phi,
            rotated.y,
            rotated.z * cos_phi + rotated.x * sin_phi,
        )
    }

    /// Screen position of a view-space vector, ignoring visibility.
    pub fn to_screen(&self, v: DVec3) -> DVec2 {
        DVec2::new(
            self.translate.x + self.scale * v.y,
            self.translate.y - self.scale * v.z,
        )
    }

    /// Projects a geographic point; `None` when it lies on the far hemisphere.
    pub fn project(&self, coord: Coord<f64>) -> Option<DVec2> {
        let v = self.rotate(coord);
        (v.x > 0.0).then(|| self.to_screen(v))
    }

    /// Fits the projection so `shape` fills the extent `[min, max]`.
    ///
    /// Keeps the rotation and returns `false` (leaving the projection
    /// untouched) when the shape has no visible extent or the target extent
    /// is empty.
    pub fn fit_extent(&mut self, min: DVec2, max: DVec2, shape: GeoShape<'_>) -> bool {
        let size = max - min;
        if !(size.x > 0.0 && size.y > 0.0) {
            return false;
        }

        let mut reference = self.clone();
        reference.scale = REFERENCE_SCALE;
        reference.translate = DVec2::ZERO;

        let Some((b0, b1)) = project_shape(&reference, shape).bounds() else {
            return false;
        };
        let extent = b1 - b0;
        let k = (size.x / extent.x).min(size.y / extent.y);
        if !k.is_finite() || k <= 0.0 {
            return false;
        }

        self.scale = REFERENCE_SCALE * k;
        self.translate = DVec2::new(
            min.x + (size.x - k * (b1.x + b0.x)) / 2.0,
            min.y + (size.y - k * (b1.y + b0.y)) / 2.0,
        );
        true
    }
}

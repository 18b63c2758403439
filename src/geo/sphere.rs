//! Spherical helpers: polygon centroid and rotation interpolation.

use super::projection::{from_vector, to_unit_vector, Rotation};
use geo_types::{Coord, LineString, MultiPolygon};
use glam::DVec3;

/// Accumulates the area-weighted centroid vector of one ring.
///
/// The ring is fanned from its first vertex; each triangle contributes its
/// centroid weighted by the signed volume it spans with the origin.
fn ring_moment(ring: &LineString<f64>) -> (DVec3, f64) {
    let vs: Vec<DVec3> = ring.0.iter().map(|c| to_unit_vector(*c)).collect();
    let Some((&origin, rest)) = vs.split_first() else {
        return (DVec3::ZERO, 0.0);
    };

    let mut moment = DVec3::ZERO;
    let mut weight = 0.0;
    for pair in rest.windows(2) {
        let (b, c) = (pair[0], pair[1]);
        let det = origin.dot(b.cross(c));
        moment += (origin + b + c) * det;
        weight += det;
    }
    (moment, weight)
}

/// Geographic centroid of a multipolygon, in degrees.
///
/// Works for either ring winding; holes are subtracted. Falls back to the
/// mean vertex direction for degenerate shapes and returns `None` for empty
/// geometry.
pub fn spherical_centroid(geometry: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    let mut total = DVec3::ZERO;
    for polygon in &geometry.0 {
        let (moment, weight) = ring_moment(polygon.exterior());
        let sign = if weight < 0.0 { -1.0 } else { 1.0 };
        total += moment * sign;
        for hole in polygon.interiors() {
            total += ring_moment(hole).0 * sign;
        }
    }

    if total.length() > 1e-12 {
        return Some(from_vector(total));
    }

    let mean = geometry
        .0
        .iter()
        .flat_map(|p| p.exterior().0.iter())
        .fold(DVec3::ZERO, |acc, c| acc + to_unit_vector(*c));
    (mean.length() > 1e-12).then(|| from_vector(mean))
}

/// Interpolates between two view rotations along the great circle joining
/// their view centres.
#[derive(Debug, Clone)]
pub struct RotationInterpolator {
    from: Rotation,
    to: Rotation,
    a: DVec3,
    b: DVec3,
    angle: f64,
}

impl RotationInterpolator {
    pub fn new(from: Rotation, to: Rotation) -> Self {
        let a = to_unit_vector(from.center());
        let b = to_unit_vector(to.center());
        Self {
            from,
            to,
            a,
            b,
            angle: a.angle_between(b),
        }
    }

    /// Rotation at progress `t`; exact at both ends.
    pub fn at(&self, t: f64) -> Rotation {
        if t <= 0.0 {
            return self.from;
        }
        if t >= 1.0 || self.angle < 1e-12 {
            return self.to;
        }

        // Antipodal centres have no unique great circle
        if std::f64::consts::PI - self.angle < 1e-9 {
            return Rotation::new(
                lerp(self.from.lambda, self.to.lambda, t),
                lerp(self.from.phi, self.to.phi, t),
            );
        }

        let sin_angle = self.angle.sin();
        let v = self.a * (((1.0 - t) * self.angle).sin() / sin_angle)
            + self.b * ((t * self.angle).sin() / sin_angle);
        Rotation::centering(from_vector(v))
    }
}

/// Linear interpolation that lands exactly on `b` at `t >= 1`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Polygon};

    fn square(lon: f64, lat: f64, half: f64) -> Polygon<f64> {
        polygon![
            (x: lon - half, y: lat - half),
            (x: lon + half, y: lat - half),
            (x: lon + half, y: lat + half),
            (x: lon - half, y: lat + half),
            (x: lon - half, y: lat - half),
        ]
    }

    #[test]
    fn test_centroid_of_small_square() {
        let c = spherical_centroid(&MultiPolygon(vec![square(10.0, 51.0, 1.0)])).unwrap();
        assert!((c.x - 10.0).abs() < 1e-6);
        assert!((c.y - 51.0).abs() < 0.05);
    }

    #[test]
    fn test_centroid_ignores_winding() {
        let ccw = square(-40.0, -10.0, 5.0);
        let mut cw = ccw.clone();
        cw.exterior_mut(|ring| ring.0.reverse());

        let a = spherical_centroid(&MultiPolygon(vec![ccw])).unwrap();
        let b = spherical_centroid(&MultiPolygon(vec![cw])).unwrap();
        assert!((a.x - b.x).abs() < 1e-9);
        assert!((a.y - b.y).abs() < 1e-9);
        assert!((a.x + 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_centroid_across_antimeridian() {
        let c = spherical_centroid(&MultiPolygon(vec![square(180.0, 0.0, 4.0)])).unwrap();
        assert!((c.x.abs() - 180.0).abs() < 1e-6);
        assert!(c.y.abs() < 1e-6);
    }

    #[test]
    fn test_centroid_weighted_by_area() {
        let big = square(0.0, 0.0, 10.0);
        let small = square(40.0, 0.0, 1.0);
        let c = spherical_centroid(&MultiPolygon(vec![big, small])).unwrap();
        assert!(c.x > 0.0 && c.x < 5.0);
    }

    #[test]
    fn test_centroid_of_empty_geometry() {
        assert!(spherical_centroid(&MultiPolygon(vec![])).is_none());
    }

    #[test]
    fn test_interpolator_endpoints_are_exact() {
        let from = Rotation::new(0.0, 0.0);
        let to = Rotation::new(-10.3, -51.2);
        let interp = RotationInterpolator::new(from, to);
        assert_eq!(interp.at(0.0), from);
        assert_eq!(interp.at(1.0), to);
        assert_eq!(interp.at(1.5), to);
    }

    #[test]
    fn test_interpolator_takes_short_way_round() {
        let interp =
            RotationInterpolator::new(Rotation::new(-170.0, 0.0), Rotation::new(170.0, 0.0));
        let mid = interp.at(0.5);
        // Centres are 170 and -170; the midpoint is the antimeridian
        assert!((mid.lambda.abs() - 180.0).abs() < 1e-6);
        assert!(mid.phi.abs() < 1e-6);
    }

    #[test]
    fn test_lerp_lands_on_target() {
        assert_eq!(lerp(100.0, 1400.0, 1.0), 1400.0);
        assert_eq!(lerp(100.0, 300.0, 0.5), 200.0);
    }
}

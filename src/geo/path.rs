//! Path rasterizer: turns geometry into clipped screen-space rings.
//!
//! Edges are treated as great-circle arcs and densified before projection.
//! Anything behind the horizon is clipped; polygon rings that leave the
//! visible hemisphere are closed along the limb so they still fill correctly.

use super::projection::Orthographic;
use eframe::egui::Pos2;
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon};
use glam::{DVec2, DVec3};
use std::f64::consts::{PI, TAU};

/// Maximum angle between consecutive samples along an edge.
const MAX_EDGE_ANGLE: f64 = 2.0 * PI / 180.0;
/// Angular step used when walking along the limb.
const LIMB_STEP: f64 = 4.0 * PI / 180.0;
/// Number of samples for the sphere outline.
const SPHERE_SEGMENTS: usize = 180;

/// Geometry handle accepted by the path rasterizer.
#[derive(Debug, Clone, Copy)]
pub enum GeoShape<'a> {
    /// The whole globe outline
    Sphere,
    /// Filled areas (land, countries)
    Polygons(&'a MultiPolygon<f64>),
    /// Open lines (border mesh)
    Lines(&'a MultiLineString<f64>),
}

/// Projected geometry ready to be drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenPath {
    /// Screen-space rings or polylines
    pub rings: Vec<Vec<Pos2>>,
    /// Whether rings are closed areas (fillable) or open lines
    pub closed: bool,
}

impl ScreenPath {
    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(|r| r.is_empty())
    }

    /// Bounding box as `(min, max)`, or `None` for an empty path.
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let mut points = self.rings.iter().flatten();
        let first = points.next()?;
        let start = DVec2::new(first.x as f64, first.y as f64);
        Some(points.fold((start, start), |(min, max), p| {
            let p = DVec2::new(p.x as f64, p.y as f64);
            (min.min(p), max.max(p))
        }))
    }
}

/// Projects a shape through `projection`, clipping at the horizon.
pub fn project_shape(projection: &Orthographic, shape: GeoShape<'_>) -> ScreenPath {
    match shape {
        GeoShape::Sphere => ScreenPath {
            rings: vec![sphere_ring(projection)],
            closed: true,
        },
        GeoShape::Polygons(polygons) => ScreenPath {
            rings: polygons
                .0
                .iter()
                .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
                .flat_map(|ring| clip_ring(projection, ring))
                .collect(),
            closed: true,
        },
        GeoShape::Lines(lines) => ScreenPath {
            rings: lines
                .0
                .iter()
                .flat_map(|line| clip_line(projection, line))
                .collect(),
            closed: false,
        },
    }
}

fn to_pos(p: DVec2) -> Pos2 {
    Pos2::new(p.x as f32, p.y as f32)
}

fn limb_point(projection: &Orthographic, theta: f64) -> Pos2 {
    to_pos(projection.to_screen(DVec3::new(0.0, theta.cos(), theta.sin())))
}

fn limb_angle(v: DVec3) -> f64 {
    v.z.atan2(v.y)
}

fn sphere_ring(projection: &Orthographic) -> Vec<Pos2> {
    (0..SPHERE_SEGMENTS)
        .map(|i| limb_point(projection, TAU * i as f64 / SPHERE_SEGMENTS as f64))
        .collect()
}

/// Rotates every vertex into view space and inserts great-circle samples
/// on long edges.
fn densified(projection: &Orthographic, coords: &[Coord<f64>], closed: bool) -> Vec<DVec3> {
    let mut coords = coords;
    if closed && coords.len() > 1 && coords.first() == coords.last() {
        coords = &coords[..coords.len() - 1];
    }

    let rotated: Vec<DVec3> = coords.iter().map(|c| projection.rotate(*c)).collect();
    let edge_count = if closed {
        rotated.len()
    } else {
        rotated.len().saturating_sub(1)
    };

    let mut out = Vec::with_capacity(rotated.len());
    for i in 0..rotated.len() {
        let a = rotated[i];
        out.push(a);
        if i >= edge_count {
            continue;
        }
        let b = rotated[(i + 1) % rotated.len()];
        let angle = a.angle_between(b);
        if angle > MAX_EDGE_ANGLE && angle < PI - 1e-9 {
            let steps = (angle / MAX_EDGE_ANGLE).ceil() as usize;
            let sin_angle = angle.sin();
            for s in 1..steps {
                let t = s as f64 / steps as f64;
                let (wa, wb) = (((1.0 - t) * angle).sin(), (t * angle).sin());
                out.push((a * wa + b * wb) / sin_angle);
            }
        }
    }
    out
}

/// Point where the arc from visible `a` to hidden `b` crosses the horizon.
fn horizon_crossing(a: DVec3, b: DVec3) -> DVec3 {
    let t = a.x / (a.x - b.x);
    let p = a.lerp(b, t);
    let limb = DVec3::new(0.0, p.y, p.z).normalize_or_zero();
    if limb == DVec3::ZERO {
        DVec3::new(0.0, a.y, a.z).normalize_or_zero()
    } else {
        limb
    }
}

/// Samples the limb from angle `from` to angle `to`, walking in
/// `direction` (+1 or -1), excluding both ends.
fn limb_arc(
    projection: &Orthographic,
    from: f64,
    to: f64,
    direction: f64,
    out: &mut Vec<Pos2>,
) {
    let delta = direction * (direction * (to - from)).rem_euclid(TAU);
    let steps = (delta.abs() / LIMB_STEP).ceil() as usize;
    for s in 1..steps {
        out.push(limb_point(projection, from + delta * s as f64 / steps as f64));
    }
}

/// Even-odd containment of `point` in a set of rings.
fn even_odd_contains(rings: &[Vec<Pos2>], point: Pos2) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

/// Whether the view centre lies inside a ring given in view space.
///
/// A ring splits the sphere in two; the smaller part is its inside. The
/// ring is mapped through a Lambert azimuthal equal-area projection about
/// the view centre, so its planar area is the spherical area it encloses
/// around the centre.
fn contains_view_centre(vs: &[DVec3]) -> bool {
    let planar: Vec<DVec2> = vs
        .iter()
        .filter_map(|v| {
            let yz = DVec2::new(v.y, v.z);
            let len = yz.length();
            if len < 1e-12 {
                // The antipode has no direction
                return (v.x > 0.0).then_some(DVec2::ZERO);
            }
            Some(yz * ((2.0 * (1.0 - v.x)).max(0.0).sqrt() / len))
        })
        .collect();
    let n = planar.len();
    if n < 3 {
        return false;
    }

    let (mut area, mut winding) = (0.0, 0.0);
    for i in 0..n {
        let (a, b) = (planar[i], planar[(i + 1) % n]);
        area += a.perp_dot(b) / 2.0;
        winding += a.perp_dot(b).atan2(a.dot(b));
    }
    let enclosed = area.abs();
    let centre_side = if winding.abs() > PI {
        enclosed
    } else {
        4.0 * PI - enclosed
    };
    centre_side < 2.0 * PI
}

/// Visible run of a ring, from where it comes over the horizon to where it
/// leaves again.
struct Fragment {
    points: Vec<Pos2>,
    entry: f64,
    exit: f64,
}

/// Closes fragments into rings along the limb. Each exit is joined to the
/// nearest entry in `direction`.
fn join_fragments(
    projection: &Orthographic,
    fragments: &[Fragment],
    direction: f64,
) -> Vec<Vec<Pos2>> {
    let next_entry = |exit: f64| {
        let distance = |f: &Fragment| (direction * (f.entry - exit)).rem_euclid(TAU);
        fragments
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| distance(a).total_cmp(&distance(b)))
            .map_or(0, |(i, _)| i)
    };

    let mut used = vec![false; fragments.len()];
    let mut rings = Vec::new();
    for first in 0..fragments.len() {
        if used[first] {
            continue;
        }
        let mut ring = Vec::new();
        let mut i = first;
        loop {
            used[i] = true;
            let fragment = &fragments[i];
            ring.extend_from_slice(&fragment.points);
            let next = next_entry(fragment.exit);
            let entry = fragments[next].entry;
            limb_arc(projection, fragment.exit, entry, direction, &mut ring);
            if used[next] {
                break;
            }
            i = next;
        }
        rings.push(ring);
    }
    rings
}

fn clip_ring(projection: &Orthographic, ring: &LineString<f64>) -> Vec<Vec<Pos2>> {
    let vs = densified(projection, &ring.0, true);
    let n = vs.len();
    if n < 3 {
        return Vec::new();
    }
    let covers_centre = contains_view_centre(&vs);
    let centre = to_pos(projection.to_screen(DVec3::X));

    let Some(start) = (0..n).find(|&i| vs[i].x > 0.0 && vs[(i + n - 1) % n].x <= 0.0) else {
        // No horizon crossing: the ring is wholly visible or wholly hidden
        let mut rings = Vec::new();
        if vs[0].x > 0.0 {
            rings.push(vs.iter().map(|v| to_pos(projection.to_screen(*v))).collect());
        }
        if even_odd_contains(&rings, centre) != covers_centre {
            rings.push(sphere_ring(projection));
        }
        return rings;
    };

    let mut fragments = Vec::new();
    let mut current: Option<Fragment> = None;
    for j in 0..n {
        let a = vs[(start + n - 1 + j) % n];
        let b = vs[(start + j) % n];
        match (a.x > 0.0, b.x > 0.0) {
            (false, true) => {
                let crossing = horizon_crossing(b, a);
                current = Some(Fragment {
                    points: vec![
                        to_pos(projection.to_screen(crossing)),
                        to_pos(projection.to_screen(b)),
                    ],
                    entry: limb_angle(crossing),
                    exit: 0.0,
                });
            }
            (true, true) => {
                if let Some(fragment) = current.as_mut() {
                    fragment.points.push(to_pos(projection.to_screen(b)));
                }
            }
            (true, false) => {
                if let Some(mut fragment) = current.take() {
                    let crossing = horizon_crossing(a, b);
                    fragment.points.push(to_pos(projection.to_screen(crossing)));
                    fragment.exit = limb_angle(crossing);
                    fragments.push(fragment);
                }
            }
            (false, false) => {}
        }
    }

    // One way round the limb closes the inside, the other the outside
    let mut rings = join_fragments(projection, &fragments, 1.0);
    if even_odd_contains(&rings, centre) != covers_centre {
        rings = join_fragments(projection, &fragments, -1.0);
    }
    rings.retain(|r| r.len() >= 3);
    rings
}

fn clip_line(projection: &Orthographic, line: &LineString<f64>) -> Vec<Vec<Pos2>> {
    let vs = densified(projection, &line.0, false);
    let mut runs = Vec::new();
    let mut current: Vec<Pos2> = Vec::new();

    for (i, &a) in vs.iter().enumerate() {
        let a_visible = a.x > 0.0;
        if a_visible {
            current.push(to_pos(projection.to_screen(a)));
        }
        let Some(&b) = vs.get(i + 1) else {
            break;
        };
        let b_visible = b.x > 0.0;
        if a_visible && !b_visible {
            current.push(to_pos(projection.to_screen(horizon_crossing(a, b))));
            runs.push(std::mem::take(&mut current));
        } else if !a_visible && b_visible {
            current.push(to_pos(projection.to_screen(horizon_crossing(b, a))));
        }
    }
    runs.push(current);

    runs.retain(|run| run.len() >= 2);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::projection::Rotation;
    use geo_types::{line_string, polygon};

    fn centered_projection() -> Orthographic {
        let mut projection = Orthographic::new();
        projection.set_scale(100.0);
        projection.set_translate(DVec2::new(200.0, 200.0));
        projection
    }

    #[test]
    fn test_sphere_outline_is_circle() {
        let projection = centered_projection();
        let path = project_shape(&projection, GeoShape::Sphere);
        assert!(path.closed);
        assert_eq!(path.rings.len(), 1);
        for p in &path.rings[0] {
            let r = ((p.x - 200.0).powi(2) + (p.y - 200.0).powi(2)).sqrt();
            assert!((r - 100.0).abs() < 1e-3);
        }
        let (min, max) = path.bounds().unwrap();
        assert!((min.x - 100.0).abs() < 1e-3);
        assert!((max.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_visible_polygon_projects_fully() {
        let projection = centered_projection();
        let polygons = MultiPolygon(vec![polygon![
            (x: -10.0, y: -10.0),
            (x: 10.0, y: -10.0),
            (x: 10.0, y: 10.0),
            (x: -10.0, y: 10.0),
            (x: -10.0, y: -10.0),
        ]]);
        let path = project_shape(&projection, GeoShape::Polygons(&polygons));

        assert_eq!(path.rings.len(), 1);
        // Densified 20 degree edges, closing duplicate dropped
        assert!(path.rings[0].len() > 4);
        let (min, max) = path.bounds().unwrap();
        assert!(min.x > 170.0 && max.x < 230.0);
        assert!(min.y > 170.0 && max.y < 230.0);
    }

    #[test]
    fn test_hidden_polygon_is_dropped() {
        let mut projection = centered_projection();
        projection.set_rotation(Rotation::new(180.0, 0.0));
        let polygons = MultiPolygon(vec![polygon![
            (x: -5.0, y: -5.0),
            (x: 5.0, y: -5.0),
            (x: 5.0, y: 5.0),
            (x: -5.0, y: 5.0),
            (x: -5.0, y: -5.0),
        ]]);
        let path = project_shape(&projection, GeoShape::Polygons(&polygons));
        assert!(path.is_empty());
        assert!(path.bounds().is_none());
    }

    #[test]
    fn test_polygon_straddling_horizon_stays_inside_disc() {
        let projection = centered_projection();
        let polygons = MultiPolygon(vec![polygon![
            (x: 60.0, y: -20.0),
            (x: 120.0, y: -20.0),
            (x: 120.0, y: 20.0),
            (x: 60.0, y: 20.0),
            (x: 60.0, y: -20.0),
        ]]);
        let path = project_shape(&projection, GeoShape::Polygons(&polygons));

        assert_eq!(path.rings.len(), 1);
        for p in &path.rings[0] {
            let r = ((p.x - 200.0).powi(2) + (p.y - 200.0).powi(2)).sqrt();
            assert!(r <= 100.0 + 1e-3);
        }
        // The limb is reached on the right-hand edge
        let (_, max) = path.bounds().unwrap();
        assert!((max.x - 300.0).abs() < 0.5);
    }

    /// Band from 60E round the back of the globe to 300E, between 30S and 30N.
    fn back_band() -> MultiPolygon<f64> {
        let south = (0..=8).map(|i| (60.0 + 30.0 * i as f64, -30.0));
        let north = (0..=8).rev().map(|i| (60.0 + 30.0 * i as f64, 30.0));
        let ring: Vec<(f64, f64)> = south.chain(north).chain([(60.0, -30.0)]).collect();
        MultiPolygon(vec![geo_types::Polygon::new(ring.into(), vec![])])
    }

    #[test]
    fn test_band_behind_globe_leaves_centre_empty() {
        let projection = centered_projection();
        let band = back_band();
        let path = project_shape(&projection, GeoShape::Polygons(&band));

        // Two slivers on the left and right edges of the disc
        assert_eq!(path.rings.len(), 2);
        assert!(!even_odd_contains(&path.rings, Pos2::new(200.0, 200.0)));
        // 75E on the equator is inside the band
        let sliver = projection.project(Coord { x: 75.0, y: 0.0 }).unwrap();
        assert!(even_odd_contains(&path.rings, to_pos(sliver)));
        let sliver = projection.project(Coord { x: -75.0, y: 0.0 }).unwrap();
        assert!(even_odd_contains(&path.rings, to_pos(sliver)));
    }

    #[test]
    fn test_band_in_front_covers_centre() {
        let mut projection = centered_projection();
        projection.set_rotation(Rotation::new(180.0, 0.0));
        let band = back_band();
        let path = project_shape(&projection, GeoShape::Polygons(&band));

        assert!(even_odd_contains(&path.rings, Pos2::new(200.0, 200.0)));
        for ring in &path.rings {
            for p in ring {
                let r = ((p.x - 200.0).powi(2) + (p.y - 200.0).powi(2)).sqrt();
                assert!(r <= 100.0 + 1e-3);
            }
        }
    }

    #[test]
    fn test_line_split_at_horizon() {
        let projection = centered_projection();
        let lines = MultiLineString(vec![line_string![
            (x: -60.0, y: 0.0),
            (x: 0.0, y: 0.0),
            (x: 60.0, y: 0.0),
            (x: 120.0, y: 0.0),
            (x: 180.0, y: 0.0),
            (x: 240.0, y: 0.0),
            (x: 300.0, y: 0.0),
        ]]);
        let path = project_shape(&projection, GeoShape::Lines(&lines));

        assert!(!path.closed);
        // Visible from -90 to 90, then again from 270 (= -90) to 300
        assert_eq!(path.rings.len(), 2);
    }
}

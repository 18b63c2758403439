//! Geographic data and projection math.
//!
//! This module holds the boundary dataset, the orthographic projection, the
//! path rasterizer that clips geometry at the horizon, and the spherical
//! helpers used for centring and animation.

mod dataset;
mod path;
mod projection;
mod sphere;

pub use dataset::{normalize_name, Country, GeoDataset, Region, RegionTable};
pub use path::{project_shape, GeoShape, ScreenPath};
pub use projection::{from_vector, to_unit_vector, Orthographic, Rotation};
pub use sphere::{lerp, spherical_centroid, RotationInterpolator};

#[cfg(test)]
pub(crate) use dataset::tests::{sample_dataset, square_country};

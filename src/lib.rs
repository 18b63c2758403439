#![warn(clippy::all)]

//! Country Globe - an interactive orthographic world globe.
//!
//! The globe draws country boundaries onto a [`render::DrawSurface`],
//! highlights countries and regions, and animates rotation and zoom onto a
//! named country or macro-region. Hosts drive animation and resize handling
//! from their own frame loop through [`Globe::tick`].

pub mod config;
pub mod error;
pub mod geo;
pub mod globe;
pub mod highlight;
pub mod navigation;
pub mod projection;
pub mod raster;
pub mod render;
pub mod viewport;

pub use config::{GlobeConfig, HighlightSpec, LayerStyle};
pub use error::{GlobeError, GlobeResult, Outcome};
pub use geo::{Country, GeoDataset, Region, RegionTable, Rotation};
pub use globe::Globe;
pub use highlight::{HighlightEntry, HighlightStore};
pub use navigation::{FrameOutcome, FrameTicket, MacroRegion, NavigationEngine, ZoomLevel};
pub use projection::ProjectionController;
pub use raster::PixelCanvas;
pub use render::{DrawCommand, DrawSurface, RecordingSurface, Renderer};
pub use viewport::{Viewport, ViewportController};

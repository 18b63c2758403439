#![warn(clippy::all)]

//! Country Globe demo - a native viewer for the globe library.
//!
//! Usage: `country-globe <countries.geojson|countries.shp> [regions.json] [config.json]`
//!
//! The globe is drawn into a software canvas that is uploaded as a texture
//! every time a new frame has been rendered.

mod ui;

use country_globe::{
    DrawSurface, GeoDataset, Globe, GlobeConfig, GlobeError, GlobeResult, PixelCanvas, RegionTable,
    Viewport,
};
use eframe::egui;
use std::path::Path;
use std::sync::Arc;
use ui::{GlobeTextureCache, PanelState};

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (dataset, config) = match load_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => {
            log::error!("{}", e);
            eprintln!(
                "usage: country-globe <countries.geojson|countries.shp> [regions.json] [config.json]"
            );
            std::process::exit(1);
        }
    };

    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "Country Globe",
        native_options,
        Box::new(move |_cc| Ok(Box::new(GlobeApp::new(dataset, config)))),
    )
}

fn read_text(path: &Path) -> GlobeResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| GlobeError::Dataset(format!("Failed to read {}: {}", path.display(), e)))
}

fn read_bytes(path: &Path) -> GlobeResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| GlobeError::Dataset(format!("Failed to read {}: {}", path.display(), e)))
}

/// Loads the dataset, region table and configuration named on the command line.
fn load_inputs(args: &[String]) -> GlobeResult<(GeoDataset, GlobeConfig)> {
    let countries = args
        .first()
        .map(Path::new)
        .ok_or_else(|| GlobeError::Dataset("No countries file given".to_string()))?;

    let regions = match args.get(1) {
        Some(path) => RegionTable::from_json(&read_text(Path::new(path))?)?,
        None => RegionTable::new(),
    };

    let config = match args.get(2) {
        Some(path) => GlobeConfig::from_json(&read_text(Path::new(path))?)?,
        None => GlobeConfig::default(),
    };

    let is_shapefile = countries
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));
    let dataset = if is_shapefile {
        let shp = read_bytes(countries)?;
        let dbf = read_bytes(&countries.with_extension("dbf"))?;
        let countries = GeoDataset::countries_from_shapefile(&shp, &dbf)?;
        GeoDataset::new(countries, None, None, regions)
    } else {
        GeoDataset::from_geojson(&read_text(countries)?, None, None, regions)?
    };

    log::info!(
        "Loaded {} countries and {} regions from {}",
        dataset.countries().len(),
        dataset.regions().len(),
        countries.display()
    );
    Ok((dataset, config))
}

/// Main application state.
pub struct GlobeApp {
    globe: Globe<PixelCanvas>,
    /// Widget state for the side panels
    panel: PanelState,
    /// Texture of the last rendered frame
    texture_cache: GlobeTextureCache,
    initialized: bool,
}

impl GlobeApp {
    pub fn new(dataset: GeoDataset, config: GlobeConfig) -> Self {
        let globe = Globe::new(
            Arc::new(dataset),
            config,
            PixelCanvas::new(Viewport::default()),
        );
        Self {
            globe,
            panel: PanelState::default(),
            texture_cache: GlobeTextureCache::new(),
            initialized: false,
        }
    }
}

impl eframe::App for GlobeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = web_time::Instant::now();

        // Side and top/bottom panels must be rendered before CentralPanel
        ui::render_top_bar(ctx, &self.globe, &self.panel);
        ui::render_left_panel(ctx, &mut self.globe, &mut self.panel);

        let host = ui::render_canvas(ctx, &self.globe, &mut self.texture_cache);

        if host != self.globe.surface().host_size() {
            self.globe.surface_mut().set_host_size(host);
            if self.initialized {
                self.globe.notify_resize(now);
            }
        }

        if !self.initialized && !host.is_degenerate() {
            match self.globe.init() {
                Ok(()) => self.initialized = true,
                Err(e) => self.panel.status_message = e.to_string(),
            }
        }

        self.globe.tick(now);

        // Keep repainting until the latest frame has been uploaded
        if self.globe.is_animating()
            || self.globe.has_pending_resize()
            || !self.texture_cache.is_current(self.globe.frames_rendered())
        {
            ctx.request_repaint();
        }
    }
}

//! Globe configuration.
//!
//! A user document is deep-merged over the defaults: nested objects merge
//! key by key, and any other value the user provides replaces the default.

use crate::error::{GlobeError, GlobeResult};
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fill and stroke settings for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerStyle {
    /// Fill color (None = no fill)
    #[serde(with = "hex_color_opt")]
    pub fill_style: Option<Color32>,
    /// Stroke color (None = no stroke)
    #[serde(with = "hex_color_opt")]
    pub stroke_style: Option<Color32>,
    /// Stroke width in pixels
    pub stroke_width: f32,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            fill_style: None,
            stroke_style: None,
            stroke_width: 0.0,
        }
    }
}

impl LayerStyle {
    /// Returns the stroke to draw, if any.
    pub fn stroke(&self) -> Option<(Color32, f32)> {
        match self.stroke_style {
            Some(color) if self.stroke_width > 0.0 => Some((color, self.stroke_width)),
            _ => None,
        }
    }
}

/// A country or region to highlight at init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSpec {
    pub name: String,
    #[serde(default, with = "hex_color_opt")]
    pub color: Option<Color32>,
}

impl HighlightSpec {
    pub fn new(name: impl Into<String>, color: Option<Color32>) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Complete configuration for one globe instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobeConfig {
    /// Identifier of the host container (opaque to the globe)
    pub container: String,
    pub highlighted_countries: Vec<HighlightSpec>,
    pub highlighted_regions: Vec<HighlightSpec>,
    /// Color used when a highlight call gives none
    #[serde(with = "hex_color")]
    pub highlight_color: Color32,
    pub land: LayerStyle,
    pub borders: LayerStyle,
    pub globe: LayerStyle,
    /// Duration of zoom and rotate animations
    pub zoom_duration_ms: u64,
    /// Quiescence window for coalescing resize events
    pub resize_debounce_ms: u64,
    /// Multiplier applied to the raw fit when auto-zooming
    pub auto_zoom_correction: f64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            container: "#globe".to_string(),
            highlighted_countries: Vec::new(),
            highlighted_regions: Vec::new(),
            highlight_color: Color32::from_rgb(232, 84, 63),
            land: LayerStyle {
                fill_style: Some(Color32::from_rgb(215, 215, 215)),
                stroke_style: None,
                stroke_width: 0.0,
            },
            borders: LayerStyle {
                fill_style: None,
                stroke_style: Some(Color32::WHITE),
                stroke_width: 0.5,
            },
            globe: LayerStyle {
                fill_style: None,
                stroke_style: Some(Color32::from_rgb(60, 60, 60)),
                stroke_width: 1.0,
            },
            zoom_duration_ms: 1250,
            resize_debounce_ms: 200,
            auto_zoom_correction: 0.65,
        }
    }
}

impl GlobeConfig {
    /// Parses a JSON configuration, filling unspecified options with defaults.
    pub fn from_json(json: &str) -> GlobeResult<Self> {
        let user: Value =
            serde_json::from_str(json).map_err(|e| GlobeError::Config(e.to_string()))?;
        let mut merged =
            serde_json::to_value(Self::default()).map_err(|e| GlobeError::Config(e.to_string()))?;
        merge_json(&mut merged, user);

        let config: Self =
            serde_json::from_value(merged).map_err(|e| GlobeError::Config(e.to_string()))?;
        log::info!(
            "Loaded globe config ({} countries, {} regions highlighted)",
            config.highlighted_countries.len(),
            config.highlighted_regions.len()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> GlobeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GlobeError::Config(e.to_string()))
    }
}

fn merge_json(base: &mut Value, user: Value) {
    match (base, user) {
        (Value::Object(base), Value::Object(user)) => {
            for (key, value) in user {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Colors are written as `#rrggbb` or `#rrggbbaa`.
mod hex_color {
    use eframe::egui::Color32;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color32::from_hex(s.trim()).map_err(|e| D::Error::custom(format!("{s}: {e:?}")))
    }
}

mod hex_color_opt {
    use eframe::egui::Color32;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        color: &Option<Color32>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match color {
            Some(c) => serializer.serialize_some(&c.to_hex()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Color32>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| Color32::from_hex(s.trim()).map_err(|e| D::Error::custom(format!("{s}: {e:?}"))))
            .transpose()
    }
}

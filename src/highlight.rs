//! Highlighted country set.
//!
//! Entries are kept in insertion order, which is also the order they are
//! painted in. There is at most one entry per country id.

use crate::error::{GlobeError, GlobeResult, Outcome};
use crate::geo::{normalize_name, GeoDataset};
use eframe::egui::Color32;

/// A highlighted country.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightEntry {
    /// Dataset id of the country
    pub id: String,
    /// Lowercase country name
    pub name: String,
    /// Fill color
    pub color: Color32,
    /// Index of the country geometry in the dataset
    pub geometry: usize,
}

/// Mutable set of highlighted countries for one globe.
#[derive(Debug, Clone)]
pub struct HighlightStore {
    entries: Vec<HighlightEntry>,
    default_color: Color32,
}

impl HighlightStore {
    pub fn new(default_color: Color32) -> Self {
        Self {
            entries: Vec::new(),
            default_color,
        }
    }

    pub fn entries(&self) -> &[HighlightEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_color(&self) -> Color32 {
        self.default_color
    }

    /// Highlights a region if `name` is one, otherwise a country.
    pub fn highlight(
        &mut self,
        dataset: &GeoDataset,
        name: &str,
        color: Option<Color32>,
    ) -> GlobeResult<Outcome> {
        if dataset.region(name).is_some() {
            self.highlight_region(dataset, name, color)
        } else {
            self.highlight_country(dataset, name, color)
        }
    }

    /// Removes a region's countries if `name` is a region, otherwise a country.
    pub fn unhighlight(&mut self, dataset: &GeoDataset, name: &str) -> GlobeResult<Outcome> {
        if dataset.region(name).is_some() {
            self.unhighlight_region(dataset, name)
        } else {
            self.unhighlight_country(dataset, name)
        }
    }

    /// Adds a country to the set. Already highlighted countries keep their color.
    pub fn highlight_country(
        &mut self,
        dataset: &GeoDataset,
        name: &str,
        color: Option<Color32>,
    ) -> GlobeResult<Outcome> {
        let Some(index) = dataset.find_country(name) else {
            log::warn!("Cannot highlight unknown country '{}'", name);
            return Err(GlobeError::UnknownName(name.to_string()));
        };
        let country = &dataset.countries()[index];

        if self.entries.iter().any(|e| e.id == country.id) {
            log::debug!("Country '{}' is already highlighted", country.name);
            return Ok(Outcome::Unchanged);
        }

        self.entries.push(HighlightEntry {
            id: country.id.clone(),
            name: country.name.clone(),
            color: color.unwrap_or(self.default_color),
            geometry: index,
        });
        Ok(Outcome::Applied)
    }

    /// Removes a country from the set by name.
    pub fn unhighlight_country(
        &mut self,
        dataset: &GeoDataset,
        name: &str,
    ) -> GlobeResult<Outcome> {
        let key = normalize_name(name);
        match self.entries.iter().position(|e| e.name == key) {
            Some(pos) => {
                self.entries.remove(pos);
                Ok(Outcome::Applied)
            }
            None if dataset.find_country(&key).is_none() => {
                log::warn!("Cannot unhighlight unknown country '{}'", name);
                Err(GlobeError::UnknownName(name.to_string()))
            }
            None => Ok(Outcome::Unchanged),
        }
    }

    /// Highlights every member of a region. Unknown members are skipped.
    pub fn highlight_region(
        &mut self,
        dataset: &GeoDataset,
        name: &str,
        color: Option<Color32>,
    ) -> GlobeResult<Outcome> {
        let Some(region) = dataset.region(name) else {
            log::warn!("Cannot highlight unknown region '{}'", name);
            return Err(GlobeError::UnknownName(name.to_string()));
        };

        let mut outcome = Outcome::Unchanged;
        for member in &region.countries {
            // Unknown members are already logged
            if let Ok(result) = self.highlight_country(dataset, member, color) {
                outcome = outcome.merge(result);
            }
        }
        Ok(outcome)
    }

    /// Removes every member of a region.
    pub fn unhighlight_region(&mut self, dataset: &GeoDataset, name: &str) -> GlobeResult<Outcome> {
        let Some(region) = dataset.region(name) else {
            log::warn!("Cannot unhighlight unknown region '{}'", name);
            return Err(GlobeError::UnknownName(name.to_string()));
        };

        let mut outcome = Outcome::Unchanged;
        for member in &region.countries {
            if let Ok(result) = self.unhighlight_country(dataset, member) {
                outcome = outcome.merge(result);
            }
        }
        Ok(outcome)
    }

    /// Whether the named country is highlighted. Unknown names are not.
    pub fn is_highlighted(&self, dataset: &GeoDataset, name: &str) -> bool {
        dataset
            .country_by_name(name)
            .is_some_and(|country| self.entries.iter().any(|e| e.id == country.id))
    }
}

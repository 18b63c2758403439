//! World boundary dataset: land, border mesh, countries and regions.
//!
//! The dataset is loaded once and never mutated afterwards. Names are stored
//! lowercase and indexed so every highlight or zoom lookup is a hash probe.

use crate::error::{GlobeError, GlobeResult};
use geo_types::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use geojson::{feature::Id, Feature, GeoJson, Geometry, Value};
use shapefile::dbase::FieldValue;
use std::collections::HashMap;
use std::io::Cursor;

/// Normalizes a user supplied name for lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A country feature from the dataset.
#[derive(Debug, Clone)]
pub struct Country {
    /// Stable identifier from the dataset (numeric ids are kept as text)
    pub id: String,
    /// Canonical lowercase name
    pub name: String,
    /// Boundary polygons
    pub geometry: MultiPolygon<f64>,
}

/// A named group of countries.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Canonical lowercase name
    pub name: String,
    /// Lowercase member country names, in table order
    pub countries: Vec<String>,
}

/// Region name to member countries table.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(region, members)` pairs. Later duplicates are ignored.
    pub fn from_pairs<I, S, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, M)>,
        S: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let mut table = Self::new();
        for (name, members) in pairs {
            table.insert(Region {
                name: normalize_name(name.as_ref()),
                countries: members
                    .into_iter()
                    .map(|m| normalize_name(m.as_ref()))
                    .collect(),
            });
        }
        table
    }

    /// Parses `{"region name": ["country", ...], ...}`.
    ///
    /// Region order follows the JSON document.
    pub fn from_json(json: &str) -> GlobeResult<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| GlobeError::Dataset(format!("Failed to parse region table: {}", e)))?;

        let mut pairs = Vec::with_capacity(raw.len());
        for (name, members) in raw {
            let members: Vec<String> = serde_json::from_value(members).map_err(|e| {
                GlobeError::Dataset(format!("Region '{}' is not a list of names: {}", name, e))
            })?;
            pairs.push((name, members));
        }
        Ok(Self::from_pairs(pairs))
    }

    fn insert(&mut self, region: Region) {
        if self.index.contains_key(&region.name) {
            log::warn!("Duplicate region '{}' ignored", region.name);
            return;
        }
        self.index.insert(region.name.clone(), self.regions.len());
        self.regions.push(region);
    }

    /// Case-insensitive region lookup.
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.index
            .get(&normalize_name(name))
            .map(|&idx| &self.regions[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Immutable world boundary dataset.
#[derive(Debug, Clone)]
pub struct GeoDataset {
    land: MultiPolygon<f64>,
    borders: MultiLineString<f64>,
    countries: Vec<Country>,
    name_index: HashMap<String, usize>,
    regions: RegionTable,
}

impl GeoDataset {
    /// Assembles a dataset from already parsed parts.
    ///
    /// A missing land geometry is replaced by all country polygons, and a
    /// missing border mesh by all country rings.
    pub fn new(
        countries: Vec<Country>,
        land: Option<MultiPolygon<f64>>,
        borders: Option<MultiLineString<f64>>,
        regions: RegionTable,
    ) -> Self {
        let land = land.unwrap_or_else(|| {
            MultiPolygon(
                countries
                    .iter()
                    .flat_map(|c| c.geometry.0.iter().cloned())
                    .collect(),
            )
        });
        let borders = borders.unwrap_or_else(|| {
            MultiLineString(
                countries
                    .iter()
                    .flat_map(|c| c.geometry.0.iter())
                    .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
                    .cloned()
                    .collect(),
            )
        });

        let mut name_index = HashMap::with_capacity(countries.len());
        for (idx, country) in countries.iter().enumerate() {
            // First match in dataset order wins
            name_index.entry(country.name.clone()).or_insert(idx);
        }

        log::info!(
            "Loaded dataset: {} countries, {} regions, {} land polygons, {} border lines",
            countries.len(),
            regions.len(),
            land.0.len(),
            borders.0.len()
        );

        Self {
            land,
            borders,
            countries,
            name_index,
            regions,
        }
    }

    /// Loads a dataset from GeoJSON documents.
    ///
    /// `countries` must be a FeatureCollection whose features carry a `name`
    /// property and an id (feature id, or an `id`/`iso_n3` property).
    pub fn from_geojson(
        countries: &str,
        land: Option<&str>,
        borders: Option<&str>,
        regions: RegionTable,
    ) -> GlobeResult<Self> {
        let countries = parse_countries(&parse_geojson(countries)?)?;
        let land = land
            .map(|s| parse_geojson(s).map(|g| collect_polygons(&g)))
            .transpose()?;
        let borders = borders
            .map(|s| parse_geojson(s).map(|g| collect_lines(&g)))
            .transpose()?;
        Ok(Self::new(countries, land, borders, regions))
    }

    /// Reads country polygons from a shapefile (.shp and .dbf bytes).
    ///
    /// Names come from the usual Natural Earth attribute fields.
    pub fn countries_from_shapefile(
        shp_bytes: &[u8],
        dbf_bytes: &[u8],
    ) -> GlobeResult<Vec<Country>> {
        let mut shape_reader = shapefile::ShapeReader::new(Cursor::new(shp_bytes))
            .map_err(|e| GlobeError::Dataset(format!("Failed to read shapefile: {}", e)))?;
        let records: Vec<shapefile::dbase::Record> =
            shapefile::dbase::Reader::new(Cursor::new(dbf_bytes))
                .and_then(|mut r: shapefile::dbase::Reader<Cursor<&[u8]>>| r.read())
                .map_err(|e| GlobeError::Dataset(format!("Failed to read dbf: {}", e)))?;

        let mut countries = Vec::new();
        for (idx, result) in shape_reader.iter_shapes().enumerate() {
            let shape: shapefile::Shape =
                result.map_err(|e| GlobeError::Dataset(format!("Failed to read shape: {}", e)))?;

            let Some(record) = records.get(idx) else {
                log::warn!("Shape {} has no attribute record, skipping", idx);
                continue;
            };
            let Some(name) = record_text(record, &["NAME", "ADMIN", "NAME_LONG", "name"]) else {
                log::warn!("Shape {} has no name, skipping", idx);
                continue;
            };
            let id = record_text(record, &["ISO_N3", "ADM0_A3", "ISO_A3", "id"])
                .unwrap_or_else(|| idx.to_string());

            if let shapefile::Shape::Polygon(poly) = shape {
                countries.push(Country {
                    id,
                    name: normalize_name(&name),
                    geometry: shapefile_polygon(&poly),
                });
            }
        }

        Ok(countries)
    }

    pub fn land(&self) -> &MultiPolygon<f64> {
        &self.land
    }

    pub fn borders(&self) -> &MultiLineString<f64> {
        &self.borders
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn country(&self, index: usize) -> Option<&Country> {
        self.countries.get(index)
    }

    /// Index of the country with this name (case-insensitive).
    pub fn find_country(&self, name: &str) -> Option<usize> {
        self.name_index.get(&normalize_name(name)).copied()
    }

    pub fn country_by_name(&self, name: &str) -> Option<&Country> {
        self.find_country(name).map(|idx| &self.countries[idx])
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }
}

fn parse_geojson(s: &str) -> GlobeResult<GeoJson> {
    s.parse::<GeoJson>()
        .map_err(|e| GlobeError::Dataset(format!("Failed to parse GeoJSON: {}", e)))
}

fn parse_countries(geojson: &GeoJson) -> GlobeResult<Vec<Country>> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(GlobeError::Dataset(
            "Country data must be a FeatureCollection".to_string(),
        ));
    };

    let mut countries = Vec::with_capacity(fc.features.len());
    for (idx, feature) in fc.features.iter().enumerate() {
        let Some(name) = feature_property(feature, &["name", "NAME", "ADMIN"]) else {
            log::warn!("Country feature {} has no name, skipping", idx);
            continue;
        };
        let id = feature_id(feature).unwrap_or_else(|| idx.to_string());
        let mut polygons = Vec::new();
        if let Some(geometry) = &feature.geometry {
            push_polygons(geometry, &mut polygons);
        }
        countries.push(Country {
            id,
            name: normalize_name(&name),
            geometry: MultiPolygon(polygons),
        });
    }
    Ok(countries)
}

fn feature_id(feature: &Feature) -> Option<String> {
    match &feature.id {
        Some(Id::String(s)) => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => feature_property(feature, &["id", "iso_n3", "ISO_N3"]),
    }
}

fn feature_property(feature: &Feature, keys: &[&str]) -> Option<String> {
    let props = feature.properties.as_ref()?;
    keys.iter().find_map(|key| match props.get(*key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn record_text(record: &shapefile::dbase::Record, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(field)? {
        FieldValue::Character(Some(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format!("{}", n)),
        _ => None,
    })
}

fn shapefile_polygon(poly: &shapefile::Polygon) -> MultiPolygon<f64> {
    use shapefile::PolygonRing;

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for ring in poly.rings() {
        let coords: LineString<f64> = ring
            .points()
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();

        match ring {
            PolygonRing::Outer(_) => polygons.push(Polygon::new(coords, Vec::new())),
            // Holes follow the outer ring they belong to
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some(outer) => outer.interiors_push(coords),
                None => log::warn!("Shapefile hole without an outer ring, skipping"),
            },
        }
    }
    MultiPolygon(polygons)
}

fn to_ring(positions: &[Vec<f64>]) -> LineString<f64> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect()
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(
        to_ring(exterior),
        holes.iter().map(|r| to_ring(r)).collect(),
    ))
}

fn push_polygons(geometry: &Geometry, out: &mut Vec<Polygon<f64>>) {
    match &geometry.value {
        Value::Polygon(rings) => out.extend(to_polygon(rings)),
        Value::MultiPolygon(polygons) => out.extend(polygons.iter().filter_map(|p| to_polygon(p))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                push_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn push_lines(geometry: &Geometry, out: &mut Vec<LineString<f64>>) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_ring(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(|l| to_ring(l))),
        Value::Polygon(rings) => out.extend(rings.iter().map(|r| to_ring(r))),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().flatten().map(|r| to_ring(r)))
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                push_lines(g, out);
            }
        }
        _ => {}
    }
}

fn geometries(geojson: &GeoJson) -> Vec<&Geometry> {
    match geojson {
        GeoJson::Geometry(g) => vec![g],
        GeoJson::Feature(f) => f.geometry.iter().collect(),
        GeoJson::FeatureCollection(fc) => fc
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .collect(),
    }
}

fn collect_polygons(geojson: &GeoJson) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    for g in geometries(geojson) {
        push_polygons(g, &mut polygons);
    }
    MultiPolygon(polygons)
}

fn collect_lines(geojson: &GeoJson) -> MultiLineString<f64> {
    let mut lines = Vec::new();
    for g in geometries(geojson) {
        push_lines(g, &mut lines);
    }
    MultiLineString(lines)
}

//! Lecture des couches GeoJSON d'entrée

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use geo::{Geometry, MultiPolygon};
use geojson::{feature::Id, Feature, GeoJson};
use quartier::geometry::to_multipolygon;
use quartier::{PointRecord, PopulationInput, RecordSource, RouteRecord, ZoneOrigin, ZoneRecord};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use super::{BOUNDARY_FILE, MANUAL_ZONES_FILE, POINTS_FILE, ROUTES_FILE, ZONES_FILE};

/// Couches GeoJSON d'un répertoire d'entrée.
///
/// Les features inexploitables (propriété ou géométrie manquante) sont
/// ignorées et comptées.
pub struct GeoJsonSource {
    dir: PathBuf,
    skipped: AtomicUsize,
}

impl GeoJsonSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            skipped: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Nombre de features ignorées depuis la création
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Lit les features d'un fichier. Un fichier optionnel absent donne une
    /// liste vide.
    fn read_features(&self, file: &str, required: bool) -> Result<Vec<Feature>> {
        let path = self.dir.join(file);
        if !path.exists() {
            if required {
                anyhow::bail!("Missing input file: {}", path.display());
            }
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let geojson: GeoJson = content
            .parse()
            .with_context(|| format!("Failed to parse GeoJSON: {}", path.display()))?;

        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(g) => vec![Feature {
                bbox: None,
                geometry: Some(g),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        info!(file = %path.display(), features = features.len(), "Layer loaded");
        Ok(features)
    }

    /// Convertit les features en parallèle en conservant leur ordre
    fn convert<T, F>(&self, file: &str, features: &[Feature], convert: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Feature) -> Result<T, String> + Sync,
    {
        features
            .par_iter()
            .enumerate()
            .filter_map(|(i, feature)| match convert(feature) {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!(file, feature = i, reason = %reason, "Skipping feature");
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                    None
                }
            })
            .collect()
    }
}

impl RecordSource for GeoJsonSource {
    type Error = anyhow::Error;

    fn load_zones(&self) -> Result<Vec<ZoneRecord>> {
        let extracted = self.read_features(ZONES_FILE, true)?;
        let manual = self.read_features(MANUAL_ZONES_FILE, false)?;

        let mut zones = self.convert(ZONES_FILE, &extracted, |f| zone_record(f, ZoneOrigin::Extracted));
        zones.extend(self.convert(MANUAL_ZONES_FILE, &manual, |f| zone_record(f, ZoneOrigin::Manual)));
        Ok(zones)
    }

    fn load_boundary(&self) -> Result<Option<Geometry>> {
        let features = self.read_features(BOUNDARY_FILE, false)?;

        let polygons: Vec<_> = features
            .iter()
            .filter_map(geometry_of)
            .filter_map(to_multipolygon)
            .flat_map(|mp| mp.0)
            .collect();

        if polygons.is_empty() {
            if !features.is_empty() {
                warn!("Boundary layer has no polygon, zones are not clipped");
            }
            return Ok(None);
        }
        Ok(Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))))
    }

    fn load_routes(&self) -> Result<Vec<RouteRecord>> {
        let features = self.read_features(ROUTES_FILE, true)?;
        Ok(self.convert(ROUTES_FILE, &features, route_record))
    }

    fn load_points(&self) -> Result<Vec<PointRecord>> {
        let features = self.read_features(POINTS_FILE, true)?;
        Ok(self.convert(POINTS_FILE, &features, point_record))
    }
}

fn geometry_of(feature: &Feature) -> Option<Geometry> {
    feature.geometry.clone()?.try_into().ok()
}

fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a Value> {
    feature
        .properties
        .as_ref()?
        .get(key)
        .filter(|v| !v.is_null())
}

/// Identifiant textuel : propriété `id`, sinon identifiant de la feature
fn feature_id(feature: &Feature) -> Option<String> {
    match property(feature, "id") {
        Some(value) => value_to_string(value),
        None => match &feature.id {
            Some(Id::String(s)) => Some(s.clone()),
            Some(Id::Number(n)) => Some(n.to_string()),
            None => None,
        },
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn zone_record(feature: &Feature, origin: ZoneOrigin) -> Result<ZoneRecord, String> {
    let name = property(feature, "name")
        .and_then(value_to_string)
        .ok_or("missing 'name' property")?;
    let boundary = geometry_of(feature).ok_or_else(|| format!("zone '{}' has no geometry", name))?;

    Ok(ZoneRecord {
        name,
        origin,
        boundary,
        population: parse_population(property(feature, "population")),
    })
}

/// Population telle que lue : nombre, texte numérique ou valeur invalide
pub fn parse_population(value: Option<&Value>) -> PopulationInput {
    match value {
        None => PopulationInput::Missing,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(count) => PopulationInput::Count(count),
            None => match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 => PopulationInput::Count(f as u64),
                _ => PopulationInput::Invalid(n.to_string()),
            },
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return PopulationInput::Missing;
            }
            if let Ok(count) = trimmed.parse::<u64>() {
                return PopulationInput::Count(count);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() && f >= 0.0 => PopulationInput::Count(f as u64),
                _ => PopulationInput::Invalid(trimmed.to_string()),
            }
        }
        Some(other) => PopulationInput::Invalid(other.to_string()),
    }
}

fn route_record(feature: &Feature) -> Result<RouteRecord, String> {
    let id = feature_id(feature).ok_or("missing route 'id'")?;
    let geometry = geometry_of(feature).ok_or_else(|| format!("route '{}' has no geometry", id))?;
    Ok(RouteRecord { id, geometry })
}

fn point_record(feature: &Feature) -> Result<PointRecord, String> {
    let id = feature_id(feature).ok_or("missing point 'id'")?;
    let location = match geometry_of(feature) {
        Some(Geometry::Point(p)) => p,
        Some(Geometry::MultiPoint(mp)) if mp.0.len() == 1 => mp.0[0],
        Some(_) => return Err(format!("point '{}' is not a Point", id)),
        None => return Err(format!("point '{}' has no geometry", id)),
    };
    if !location.x().is_finite() || !location.y().is_finite() {
        return Err(format!("point '{}' has non-finite coordinates", id));
    }

    Ok(PointRecord {
        id,
        location,
        amenity: property(feature, "amenity")
            .and_then(value_to_string)
            .unwrap_or_default(),
        route_id: property(feature, "route").and_then(value_to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(value: Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_population() {
        assert_eq!(parse_population(None), PopulationInput::Missing);
        assert_eq!(parse_population(Some(&json!(1200))), PopulationInput::Count(1200));
        assert_eq!(parse_population(Some(&json!(1200.9))), PopulationInput::Count(1200));
        assert_eq!(parse_population(Some(&json!(" 850 "))), PopulationInput::Count(850));
        assert_eq!(parse_population(Some(&json!(""))), PopulationInput::Missing);
        assert_eq!(
            parse_population(Some(&json!("inconnue"))),
            PopulationInput::Invalid("inconnue".to_string())
        );
        assert_eq!(
            parse_population(Some(&json!(-5))),
            PopulationInput::Invalid("-5".to_string())
        );
    }

    #[test]
    fn test_zone_record() {
        let f = feature(json!({
            "type": "Feature",
            "properties": { "name": "Cité 5 Juillet", "population": "4200" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[3.18, 36.71], [3.19, 36.71], [3.19, 36.72], [3.18, 36.71]]]
            }
        }));

        let zone = zone_record(&f, ZoneOrigin::Extracted).unwrap();
        assert_eq!(zone.name, "Cité 5 Juillet");
        assert_eq!(zone.population, PopulationInput::Count(4200));
        assert!(matches!(zone.boundary, Geometry::Polygon(_)));
    }

    #[test]
    fn test_zone_without_name_rejected() {
        let f = feature(json!({
            "type": "Feature",
            "properties": { "population": 10 },
            "geometry": null
        }));
        assert!(zone_record(&f, ZoneOrigin::Extracted).is_err());
    }

    #[test]
    fn test_point_record() {
        let f = feature(json!({
            "type": "Feature",
            "id": 17,
            "properties": { "amenity": "waste_basket", "route": 4 },
            "geometry": { "type": "Point", "coordinates": [3.185, 36.715] }
        }));

        let point = point_record(&f).unwrap();
        assert_eq!(point.id, "17");
        assert_eq!(point.route_id.as_deref(), Some("4"));
        assert_eq!(point.amenity, "waste_basket");

        let line = feature(json!({
            "type": "Feature",
            "properties": { "id": "p1" },
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }
        }));
        assert!(point_record(&line).is_err());
    }
}

//! Écriture des résultats d'analyse

use std::path::{Path, PathBuf};

use anyhow::Result;
use geo::Geometry;
use quartier::geometry::round_coords;
use quartier::types::PopulationSource;
use quartier::{CollectionPoint, RecordSink, Route, ZoneSet};
use serde_json::{json, Value};
use tracing::info;

use super::csv::write_csv;
use super::geojson::write_collection;
use super::{
    OutputFeature, NOT_SATURATED_OUTPUT, QUARTIERS_OUTPUT, ROUTES_OUTPUT, SATURATED_OUTPUT,
    UNSCORED_OUTPUT,
};

const ZONE_COLUMNS: &[&str] = &[
    "name",
    "origin",
    "area_km2",
    "population",
    "population_source",
    "ideal_point_count",
    "ideal_spacing_km",
    "centroid_lon",
    "centroid_lat",
];
const ROUTE_COLUMNS: &[&str] = &["zone"];
const POINT_COLUMNS: &[&str] = &["amenity", "route", "zone", "degree_of_saturation", "state"];

/// Écrit chaque couche dans `<dir>/<couche>.geojson` (et `.csv` si demandé)
pub struct GeoJsonSink {
    dir: PathBuf,
    csv: bool,
    precision: u8,
    written: Vec<PathBuf>,
}

impl GeoJsonSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            csv: false,
            precision: 7,
            written: Vec::new(),
        }
    }

    /// Écrit aussi chaque couche en CSV
    pub fn with_csv(mut self, csv: bool) -> Self {
        self.csv = csv;
        self
    }

    /// Nombre de décimales des coordonnées (7 ≈ 1 cm)
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fichiers écrits, dans l'ordre
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_layer(&mut self, layer: &str, columns: &[&str], features: &[OutputFeature]) -> Result<()> {
        let geojson_path = self.dir.join(format!("{}.geojson", layer));
        write_collection(&geojson_path, columns, features)?;
        info!(path = %geojson_path.display(), features = features.len(), "Layer written");
        self.written.push(geojson_path);

        if self.csv {
            let csv_path = self.dir.join(format!("{}.csv", layer));
            write_csv(&csv_path, columns, features)?;
            self.written.push(csv_path);
        }

        Ok(())
    }

    fn rounded(&self, geometry: &Geometry) -> Geometry {
        round_coords(geometry, self.precision)
    }

    fn point_features(&self, points: &[CollectionPoint], zones: &ZoneSet) -> Vec<OutputFeature> {
        points
            .iter()
            .map(|p| OutputFeature {
                id: p.id.clone(),
                geometry: self.rounded(&Geometry::Point(p.location)),
                properties: vec![
                    json!(p.amenity),
                    opt_str(p.route_id.as_deref()),
                    opt_str(zones.name_of(p.zone)),
                    p.saturation.map_or(Value::Null, |s| json!(s.degree)),
                    p.saturation.map_or(Value::Null, |s| json!(s.state.as_str())),
                ],
            })
            .collect()
    }
}

fn opt_str(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| json!(s))
}

fn population_source_label(source: &PopulationSource) -> &'static str {
    match source {
        PopulationSource::Supplied => "supplied",
        PopulationSource::Estimated => "estimated",
        PopulationSource::Missing => "missing",
        PopulationSource::Invalid(_) => "invalid",
    }
}

impl RecordSink for GeoJsonSink {
    type Error = anyhow::Error;

    fn persist_zones(&mut self, zones: &ZoneSet) -> Result<()> {
        let features: Vec<_> = zones
            .iter()
            .map(|z| OutputFeature {
                id: z.id.0.to_string(),
                geometry: self.rounded(&Geometry::MultiPolygon(z.boundary.clone())),
                properties: vec![
                    json!(z.name),
                    json!(z.origin),
                    json!(z.area_km2),
                    z.population.map_or(Value::Null, |p| json!(p)),
                    json!(population_source_label(&z.population_source)),
                    z.capacity.map_or(Value::Null, |c| json!(c.ideal_point_count)),
                    z.capacity.map_or(Value::Null, |c| json!(c.ideal_spacing_km)),
                    json!(z.centroid.x()),
                    json!(z.centroid.y()),
                ],
            })
            .collect();

        self.write_layer(QUARTIERS_OUTPUT, ZONE_COLUMNS, &features)
    }

    fn persist_routes(&mut self, routes: &[Route], zones: &ZoneSet) -> Result<()> {
        let features: Vec<_> = routes
            .iter()
            .map(|r| OutputFeature {
                id: r.id.clone(),
                geometry: self.rounded(&r.geometry),
                properties: vec![opt_str(zones.name_of(r.zone))],
            })
            .collect();

        self.write_layer(ROUTES_OUTPUT, ROUTE_COLUMNS, &features)
    }

    fn persist_points_by_state(
        &mut self,
        saturated: &[CollectionPoint],
        not_saturated: &[CollectionPoint],
        zones: &ZoneSet,
    ) -> Result<()> {
        let features = self.point_features(saturated, zones);
        self.write_layer(SATURATED_OUTPUT, POINT_COLUMNS, &features)?;

        let features = self.point_features(not_saturated, zones);
        self.write_layer(NOT_SATURATED_OUTPUT, POINT_COLUMNS, &features)
    }

    fn persist_unscored_points(&mut self, points: &[CollectionPoint], zones: &ZoneSet) -> Result<()> {
        let features = self.point_features(points, zones);
        self.write_layer(UNSCORED_OUTPUT, POINT_COLUMNS, &features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use quartier::geometry::polygon_from_ring;
    use quartier::types::{Capacity, Saturation, SaturationState, Zone};
    use quartier::{ZoneId, ZoneOrigin, ZoneRef};

    fn zones() -> ZoneSet {
        ZoneSet::new(vec![Zone {
            id: ZoneId(0),
            name: "Cite 5 Juillet".to_string(),
            origin: ZoneOrigin::Manual,
            boundary: polygon_from_ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            area_km2: 1.5,
            centroid: Point::new(0.66666666666, 0.33333333333),
            population: Some(3000),
            population_source: PopulationSource::Estimated,
            capacity: Some(Capacity {
                ideal_point_count: 6,
                ideal_spacing_km: 0.5,
            }),
        }])
    }

    fn point(id: &str, saturation: Option<Saturation>) -> CollectionPoint {
        CollectionPoint {
            id: id.to_string(),
            location: Point::new(0.123456789, 0.5),
            amenity: "recycling".to_string(),
            route_id: Some("r1".to_string()),
            zone: ZoneRef::Assigned(ZoneId(0)),
            saturation,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_persist_zones() {
        let dir = temp_dir("ecopoint_test_sink_zones");
        let mut sink = GeoJsonSink::new(&dir).with_csv(true);

        sink.persist_zones(&zones()).unwrap();
        assert_eq!(sink.written().len(), 2);

        let content = std::fs::read_to_string(dir.join("quartiers.geojson")).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        let props = &parsed["features"][0]["properties"];
        assert_eq!(props["name"], "Cite 5 Juillet");
        assert_eq!(props["origin"], "manual");
        assert_eq!(props["population_source"], "estimated");
        assert_eq!(props["ideal_point_count"], 6);

        let csv = std::fs::read_to_string(dir.join("quartiers.csv")).unwrap();
        assert!(csv.starts_with("id,name,origin,area_km2"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_persist_points_rounded() {
        let dir = temp_dir("ecopoint_test_sink_points");
        let mut sink = GeoJsonSink::new(&dir).with_precision(3);

        let saturated = vec![point(
            "p1",
            Some(Saturation {
                degree: 80.0,
                state: SaturationState::Saturated,
            }),
        )];
        sink.persist_points_by_state(&saturated, &[], &zones()).unwrap();
        sink.persist_unscored_points(&[point("p2", None)], &zones()).unwrap();

        let content = std::fs::read_to_string(dir.join("points_saturated.geojson")).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        let feature = &parsed["features"][0];
        assert_eq!(feature["geometry"]["coordinates"][0], 0.123);
        assert_eq!(feature["properties"]["zone"], "Cite 5 Juillet");
        assert_eq!(feature["properties"]["state"], "saturated");
        assert_eq!(feature["properties"]["degree_of_saturation"], 80.0);

        let empty = std::fs::read_to_string(dir.join("points_not_saturated.geojson")).unwrap();
        let parsed: Value = serde_json::from_str(&empty).unwrap();
        assert!(parsed["features"].as_array().unwrap().is_empty());

        let unscored = std::fs::read_to_string(dir.join("points_unscored.geojson")).unwrap();
        let parsed: Value = serde_json::from_str(&unscored).unwrap();
        assert!(parsed["features"][0]["properties"]["state"].is_null());

        std::fs::remove_dir_all(dir).ok();
    }
}

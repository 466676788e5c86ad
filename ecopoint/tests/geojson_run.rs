//! Analyse de bout en bout sur des couches GeoJSON écrites dans un
//! répertoire temporaire

use std::path::{Path, PathBuf};

use ecopoint::config;
use ecopoint::report::{RunReport, RunStatus};
use ecopoint::store::{GeoJsonSink, GeoJsonSource};
use quartier::{run, Stage};
use serde_json::{json, Value};

/// Coordonnées en mètres (`identity`) pour des espacements exacts
const CONFIG: &str = r#"{
  "zones": { "metric_crs": { "kind": "identity" } },
  "saturation": { "threshold_percent": 50.0 }
}"#;

fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x0, y0], [x0 + w, y0], [x0 + w, y0 + h], [x0, y0 + h], [x0, y0]]]
    })
}

fn write_json(dir: &Path, file: &str, value: Value) {
    std::fs::write(dir.join(file), serde_json::to_string(&value).unwrap()).unwrap();
}

fn collection(features: Vec<Value>) -> Value {
    json!({ "type": "FeatureCollection", "features": features })
}

fn setup(name: &str) -> (PathBuf, PathBuf) {
    let root = std::env::temp_dir().join(name);
    std::fs::remove_dir_all(&root).ok();
    let input = root.join("input");
    let output = root.join("output");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::create_dir_all(&output).unwrap();

    // 4 km² pour 2000 habitants : 4 points idéaux espacés de 1 km
    write_json(
        &input,
        "zones.geojson",
        collection(vec![
            json!({
                "type": "Feature",
                "properties": { "name": "Cité Rabia", "population": 2000 },
                "geometry": rect(0.0, 0.0, 4000.0, 1000.0)
            }),
            json!({
                "type": "Feature",
                "properties": { "name": "Les Bananiers", "population": "inconnue" },
                "geometry": rect(5000.0, 0.0, 2000.0, 1000.0)
            }),
            json!({
                "type": "Feature",
                "properties": { "population": 300 },
                "geometry": rect(8000.0, 0.0, 500.0, 500.0)
            }),
        ]),
    );
    write_json(
        &input,
        "routes.geojson",
        collection(vec![json!({
            "type": "Feature",
            "properties": { "id": "r1" },
            "geometry": { "type": "LineString", "coordinates": [[500.0, 500.0], [3500.0, 500.0]] }
        })]),
    );
    write_json(
        &input,
        "points.geojson",
        collection(vec![
            json!({
                "type": "Feature",
                "id": "a",
                "properties": { "amenity": "waste_disposal", "route": "r1" },
                "geometry": { "type": "Point", "coordinates": [1000.0, 500.0] }
            }),
            json!({
                "type": "Feature",
                "id": "b",
                "properties": { "amenity": "waste_disposal" },
                "geometry": { "type": "Point", "coordinates": [3000.0, 500.0] }
            }),
            json!({
                "type": "Feature",
                "id": "c",
                "properties": { "amenity": "recycling" },
                "geometry": { "type": "Point", "coordinates": [6000.0, 500.0] }
            }),
            json!({
                "type": "Feature",
                "id": "d",
                "properties": { "amenity": "recycling" },
                "geometry": { "type": "Point", "coordinates": [20000.0, 20000.0] }
            }),
        ]),
    );

    (root, output)
}

fn config(test: &str) -> quartier::AnalysisConfig {
    let path = std::env::temp_dir().join(format!("{}_config.json", test));
    std::fs::write(&path, CONFIG).unwrap();
    let config = config::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(path).ok();
    config
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn features(path: &Path) -> Vec<Value> {
    read(path)["features"].as_array().unwrap().clone()
}

#[test]
fn full_run_writes_every_layer() {
    let (root, output) = setup("ecopoint_test_full_run");
    let source = GeoJsonSource::new(root.join("input"));
    let mut sink = GeoJsonSink::new(&output).with_csv(true);

    let analysis = run(&source, &mut sink, &config("ecopoint_test_full_run"), Stage::Saturation).unwrap();

    assert_eq!(source.dir(), root.join("input").as_path());
    assert_eq!(sink.dir(), output.as_path());
    // zone sans nom ignorée à la lecture
    assert_eq!(source.skipped(), 1);
    assert_eq!(analysis.zones.len(), 2);
    assert_eq!(sink.written().len(), 10);

    let zones = features(&output.join("quartiers.geojson"));
    assert_eq!(zones[0]["properties"]["name"], "Cite Rabia");
    assert_eq!(zones[0]["properties"]["ideal_point_count"], 4);
    assert_eq!(zones[1]["properties"]["population_source"], "invalid");
    assert!(zones[1]["properties"]["ideal_point_count"].is_null());

    let routes = features(&output.join("routes.geojson"));
    assert_eq!(routes[0]["properties"]["zone"], "Cite Rabia");

    // espacement mesuré 2 km pour 1 km idéal
    let saturated = features(&output.join("points_saturated.geojson"));
    assert_eq!(saturated.len(), 2);
    assert_eq!(saturated[0]["id"], "a");
    assert_eq!(saturated[0]["properties"]["route"], "r1");
    assert_eq!(saturated[0]["properties"]["degree_of_saturation"], 100.0);
    assert!(features(&output.join("points_not_saturated.geojson")).is_empty());

    let unscored = features(&output.join("points_unscored.geojson"));
    let ids: Vec<_> = unscored.iter().map(|f| f["id"].as_str().unwrap()).collect();
    // non rattachés d'abord, puis exclus zone par zone
    assert_eq!(ids, vec!["d", "c"]);
    assert!(unscored[0]["properties"]["zone"].is_null());
    assert_eq!(unscored[1]["properties"]["zone"], "Les Bananiers");

    let csv = std::fs::read_to_string(output.join("points_saturated.csv")).unwrap();
    assert!(csv.starts_with("id,amenity,route,zone,degree_of_saturation,state,wkt\n"));

    let mut report = RunReport::new("identity", Stage::Saturation);
    report.record_analysis(&analysis);
    report.record_skipped_features(source.skipped());
    report.finalize();
    assert_eq!(report.status, RunStatus::PartialSuccess);
    assert_eq!(report.zones_scored, 1);
    assert_eq!(report.points_unscored, 2);
    assert!(report
        .issues
        .iter()
        .any(|i| i.message.contains("'inconnue' is not numeric")));

    std::fs::remove_dir_all(root).ok();
}

#[test]
fn zones_stage_writes_only_zones() {
    let (root, output) = setup("ecopoint_test_zones_stage");
    let source = GeoJsonSource::new(root.join("input"));
    let mut sink = GeoJsonSink::new(&output);

    let analysis = run(&source, &mut sink, &config("ecopoint_test_zones_stage"), Stage::Zones).unwrap();

    assert_eq!(analysis.stage, Stage::Zones);
    assert_eq!(sink.written(), &[output.join("quartiers.geojson")]);
    assert!(!output.join("routes.geojson").exists());
    assert!(analysis.unscored.is_empty());

    std::fs::remove_dir_all(root).ok();
}

#[test]
fn missing_input_layer_is_an_error() {
    let root = std::env::temp_dir().join("ecopoint_test_missing_layer");
    std::fs::remove_dir_all(&root).ok();
    std::fs::create_dir_all(&root).unwrap();

    let source = GeoJsonSource::new(&root);
    let mut sink = GeoJsonSink::new(&root);
    let err = run(&source, &mut sink, &config("ecopoint_test_missing_layer"), Stage::Saturation).unwrap_err();
    assert!(err.to_string().contains("zones.geojson"));

    std::fs::remove_dir_all(root).ok();
}

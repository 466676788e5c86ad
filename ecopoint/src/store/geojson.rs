//! Écriture GeoJSON avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use super::OutputFeature;

/// Écrit une FeatureCollection en WGS84
pub fn write_collection(output_path: &Path, columns: &[&str], features: &[OutputFeature]) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::4326"}}}},"features":["#
    )?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, columns, feature)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

fn write_feature<W: Write>(writer: &mut W, columns: &[&str], feature: &OutputFeature) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":"#)?;
    serde_json::to_writer(&mut *writer, &feature.id)?;

    write!(writer, r#","geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature
        .geometry
        .process_geom(&mut geom_writer)
        .with_context(|| format!("Failed to encode geometry of {}", feature.id))?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"#)?;
    for (i, (key, value)) in columns.iter().zip(&feature.properties).enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        serde_json::to_writer(&mut *writer, key)?;
        write!(writer, ":")?;
        serde_json::to_writer(&mut *writer, value)?;
    }
    write!(writer, "}}}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use serde_json::{json, Value};
    use std::io::Cursor;

    fn sample() -> OutputFeature {
        OutputFeature {
            id: "p\"1".to_string(),
            geometry: Geometry::Point(Point::new(3.18, 36.71)),
            properties: vec![json!("Cité Rabia Tahar"), json!(42.5), Value::Null],
        }
    }

    #[test]
    fn test_write_feature() {
        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, &["zone", "degree", "route"], &sample()).unwrap();

        let text = String::from_utf8(buffer.into_inner()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["id"], "p\"1");
        assert_eq!(parsed["type"], "Feature");
        assert_eq!(parsed["properties"]["zone"], "Cité Rabia Tahar");
        assert_eq!(parsed["properties"]["degree"], 42.5);
        assert!(parsed["properties"]["route"].is_null());
        assert_eq!(parsed["geometry"]["type"], "Point");
    }

    #[test]
    fn test_write_collection() {
        let output_path = std::env::temp_dir().join("ecopoint_test_collection.geojson");

        write_collection(&output_path, &["zone", "degree", "route"], &[sample(), sample()]).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("EPSG::4326"));
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(parsed["features"].as_array().unwrap().len(), 2);

        std::fs::remove_file(output_path).ok();
    }
}

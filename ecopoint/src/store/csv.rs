//! Export CSV (géométrie en WKT)

use std::path::Path;

use anyhow::{Context, Result};
use bytes::BytesMut;
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;
use serde_json::Value;

use super::OutputFeature;

/// Écrit une couche en CSV : `id`, les colonnes de la couche, puis `wkt`
pub fn write_csv(output_path: &Path, columns: &[&str], features: &[OutputFeature]) -> Result<()> {
    let mut buf = BytesMut::with_capacity(features.len() * 128);
    let mut wkt_buf = Vec::with_capacity(256);

    buf.extend_from_slice(b"id");
    for column in columns {
        buf.extend_from_slice(b",");
        buf.extend_from_slice(column.as_bytes());
    }
    buf.extend_from_slice(b",wkt\n");

    for feature in features {
        push_row(&mut buf, feature, &mut wkt_buf)?;
    }

    std::fs::write(output_path, &buf[..])
        .with_context(|| format!("Failed to write CSV: {}", output_path.display()))
}

fn push_row(buf: &mut BytesMut, feature: &OutputFeature, wkt_buf: &mut Vec<u8>) -> Result<()> {
    push_csv_text_field(buf, &feature.id);

    for value in &feature.properties {
        buf.extend_from_slice(b",");
        push_csv_value(buf, value);
    }

    wkt_buf.clear();
    {
        let mut writer = WktWriter::new(&mut *wkt_buf);
        feature
            .geometry
            .process_geom(&mut writer)
            .context("Failed to encode geometry to WKT")?;
    }
    buf.extend_from_slice(b",\"");
    buf.extend_from_slice(&wkt_buf[..]);
    buf.extend_from_slice(b"\"\n");

    Ok(())
}

fn push_csv_value(buf: &mut BytesMut, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => buf.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => push_csv_text_field(buf, s),
        other => push_csv_text_field(buf, &other.to_string()),
    }
}

fn push_csv_text_field(buf: &mut BytesMut, value: &str) {
    buf.extend_from_slice(b"\"");
    for b in value.as_bytes() {
        match *b {
            b'"' => buf.extend_from_slice(b"\"\""),
            b'\n' | b'\r' => buf.extend_from_slice(b" "),
            _ => buf.extend_from_slice(&[*b]),
        }
    }
    buf.extend_from_slice(b"\"");
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use serde_json::json;

    #[test]
    fn test_text_field_escaping() {
        let mut buf = BytesMut::new();
        push_csv_text_field(&mut buf, "Cité \"El Djorf\"\nnord");
        assert_eq!(&buf[..], "\"Cité \"\"El Djorf\"\" nord\"".as_bytes());
    }

    #[test]
    fn test_row() {
        let feature = OutputFeature {
            id: "p1".to_string(),
            geometry: Geometry::Point(Point::new(3.5, 36.25)),
            properties: vec![json!("Q1"), json!(87.5), Value::Null],
        };

        let mut buf = BytesMut::new();
        let mut wkt_buf = Vec::new();
        push_row(&mut buf, &feature, &mut wkt_buf).unwrap();

        let line = String::from_utf8(buf.to_vec()).unwrap();
        assert_eq!(line, "\"p1\",\"Q1\",87.5,,\"POINT(3.5 36.25)\"\n");
    }

    #[test]
    fn test_write_csv() {
        let output_path = std::env::temp_dir().join("ecopoint_test_layer.csv");
        let feature = OutputFeature {
            id: "r1".to_string(),
            geometry: Geometry::Point(Point::new(1.0, 2.0)),
            properties: vec![json!("Q1")],
        };

        write_csv(&output_path, &["zone"], &[feature]).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("id,zone,wkt"));
        assert_eq!(lines.next(), Some("\"r1\",\"Q1\",\"POINT(1 2)\""));

        std::fs::remove_file(output_path).ok();
    }
}

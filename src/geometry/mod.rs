// src/geometry/mod.rs

pub mod wkt;

pub use wkt::to_wkt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    io::{self, Write},
    path::Path,
};

/// `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// GeoJSON geometry object (RFC 7946 §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Every position in document order.
    pub fn positions(&self) -> Vec<&Position> {
        match self {
            Geometry::Point { coordinates } => {
                if coordinates.is_empty() {
                    Vec::new()
                } else {
                    vec![coordinates]
                }
            }
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().collect()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().collect()
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.positions()).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_tag")]
    pub kind: String,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Value,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_tag(),
            geometry: Some(geometry),
            properties: Value::Object(properties),
        }
    }
}

fn feature_tag() -> String {
    "Feature".to_string()
}

fn collection_tag() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_tag")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_tag(),
            features,
        }
    }

    /// Typed view of a service response; fails if it is not a FeatureCollection.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {}
            other => anyhow::bail!("expected a FeatureCollection, got type {:?}", other),
        }
        Self::deserialize(value).context("decoding FeatureCollection")
    }

    /// Geometry of the first feature that has one.
    pub fn first_geometry(&self) -> Option<&Geometry> {
        self.features.iter().find_map(|f| f.geometry.as_ref())
    }
}

/// Write `value` as pretty-printed GeoJSON, creating parent directories.
/// Goes through a temp file + rename so a crash never leaves half a document.
pub fn write_geojson<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{:?} has no file name", path))?
        .to_string_lossy();
    let tmp_path = dir.join(format!(".{}.tmp", file_name));
    let tmp = fs::File::create(&tmp_path)
        .map_err(|e| io::Error::new(e.kind(), format!("creating {:?}: {}", tmp_path, e)))?;

    let written = write_pretty(io::BufWriter::new(tmp), value).and_then(|()| {
        fs::rename(&tmp_path, path)
            .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))
    });
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

fn write_pretty<W: Write>(mut w: W, value: &Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut w, value).context("serializing GeoJSON")?;
    w.write_all(b"\n")?;
    w.flush().context("flushing GeoJSON")?;
    Ok(())
}

pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let f = fs::File::open(path).with_context(|| format!("opening {:?}", path))?;
    serde_json::from_reader(io::BufReader::new(f)).with_context(|| format!("parsing {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn isochrone_response() -> Value {
        json!({
            "type": "FeatureCollection",
            "bbox": [-71.11, 42.29, -71.09, 42.31],
            "features": [{
                "type": "Feature",
                "properties": { "group_index": 0, "value": 600.0, "center": [-71.1, 42.3] },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-71.11, 42.3], [-71.1, 42.29], [-71.09, 42.3],
                        [-71.1, 42.31], [-71.11, 42.3]
                    ]]
                }
            }],
            "metadata": { "service": "isochrones" }
        })
    }

    #[test]
    fn decodes_service_response() {
        let fc = FeatureCollection::from_value(&isochrone_response()).unwrap();
        assert_eq!(fc.features.len(), 1);
        let g = fc.first_geometry().unwrap();
        assert!(matches!(g, Geometry::Polygon { .. }));
        assert_eq!(g.positions().len(), 5);
        assert_eq!(fc.features[0].properties["value"], 600.0);
    }

    #[test]
    fn rejects_non_collections() {
        let err = FeatureCollection::from_value(&json!({"type": "Feature"})).unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
        assert!(FeatureCollection::from_value(&json!([1, 2])).is_err());
    }

    #[test]
    fn written_file_reproduces_coordinates() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("nested/out.geojson");
        let response = isochrone_response();

        write_geojson(&path, &response)?;
        let back = read_geojson(&path)?;
        assert_eq!(back, response);

        let before = FeatureCollection::from_value(&response)?;
        let after = FeatureCollection::from_value(&back)?;
        assert_eq!(
            before.first_geometry().unwrap().positions(),
            after.first_geometry().unwrap().positions()
        );

        // no temp file left behind
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn feature_without_geometry_is_tolerated() {
        let fc = FeatureCollection::from_value(&json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": null },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } }
            ]
        }))
        .unwrap();
        assert_eq!(
            fc.first_geometry(),
            Some(&Geometry::Point { coordinates: vec![1.0, 2.0] })
        );
    }

    #[test]
    fn failed_write_cleans_up_temp_file() -> Result<()> {
        let tmp = tempdir()?;
        // a directory in the way makes the final rename fail
        let path = tmp.path().join("taken.geojson");
        fs::create_dir(&path)?;

        assert!(write_geojson(&path, &isochrone_response()).is_err());
        assert!(!tmp.path().join(".taken.geojson.tmp").exists());
        assert!(path.is_dir());
        Ok(())
    }

    #[test]
    fn read_missing_file_fails() {
        let tmp = tempdir().unwrap();
        assert!(read_geojson(tmp.path().join("nope.geojson")).is_err());
    }
}

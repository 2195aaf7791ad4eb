// src/pipeline/isochrones.rs

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fs::File, path::Path, time::Duration};
use tracing::{debug, error, info, instrument, warn};

use super::pause;
use crate::geometry::{to_wkt, write_geojson, Feature, FeatureCollection};
use crate::routing::{GeometryRequest, RoutingService};
use crate::settings::IsochroneJob;
use crate::table::RowWriter;

/// One line of the stations CSV. Columns beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    #[serde(rename = "STATION")]
    pub name: String,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
}

/// One line of the output CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRow {
    #[serde(rename = "STATION")]
    pub name: String,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    pub geometry: String,
}

impl StationRow {
    pub const HEADER: [&'static str; 4] = ["STATION", "X", "Y", "geometry"];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsochroneSummary {
    pub read: usize,
    pub written: usize,
    pub failed: usize,
}

/// Read every well-formed station. Malformed lines are logged and dropped;
/// an unreadable file is an error.
pub fn read_stations<P: AsRef<Path>>(path: P) -> Result<Vec<Station>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening stations file {:?}", path))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut stations = Vec::new();
    for (i, record) in reader.deserialize::<Station>().enumerate() {
        match record {
            Ok(s) => stations.push(s),
            // +2: 1-based, after the header line
            Err(e) => warn!(line = i + 2, error = %e, "skipping malformed station row"),
        }
    }
    Ok(stations)
}

/// Request an isochrone for every station and write one WKT row per success.
#[instrument(level = "info", skip(service, job), fields(input = %job.input.display()))]
pub async fn run_isochrones<S: RoutingService>(
    service: &S,
    job: &IsochroneJob,
    interval: Duration,
) -> Result<IsochroneSummary> {
    let stations = read_stations(&job.input)?;
    let mut summary = IsochroneSummary {
        read: stations.len(),
        ..Default::default()
    };
    info!(stations = stations.len(), "loaded stations");

    let mut writer = RowWriter::create(&job.output, &StationRow::HEADER)?;
    let mut features = Vec::new();

    for (i, station) in stations.iter().enumerate() {
        if i > 0 {
            pause(interval).await;
        }

        let collection = match isochrone_for(service, job, station).await {
            Ok(c) => c,
            Err(e) => {
                error!(station = %station.name, "isochrone failed: {:#}", e);
                summary.failed += 1;
                continue;
            }
        };
        // checked non-empty in isochrone_for
        let Some(geometry) = collection.first_geometry() else {
            continue;
        };
        debug!(
            station = %station.name,
            bands = collection.features.len(),
            vertices = geometry.positions().len(),
            "isochrone received"
        );

        writer.write(&StationRow {
            name: station.name.clone(),
            x: station.x,
            y: station.y,
            geometry: to_wkt(geometry),
        })?;
        summary.written += 1;

        if job.geojson_output.is_some() {
            features.extend(tagged_bands(collection, &station.name));
        }
    }

    if let Some(path) = &job.geojson_output {
        let merged = serde_json::to_value(FeatureCollection::new(features))?;
        write_geojson(path, &merged)?;
        info!(path = %path.display(), "wrote merged GeoJSON");
    }

    info!(
        read = summary.read,
        written = summary.written,
        failed = summary.failed,
        output = %job.output.display(),
        "isochrones done"
    );
    Ok(summary)
}

async fn isochrone_for<S: RoutingService>(
    service: &S,
    job: &IsochroneJob,
    station: &Station,
) -> Result<FeatureCollection> {
    let request = GeometryRequest::isochrone(
        job.profile,
        [station.x, station.y],
        job.range.clone(),
        job.range_type,
        job.smoothing,
    );
    let response = service.request(&request).await?;
    let collection = FeatureCollection::from_value(&response)?;
    if collection.first_geometry().is_none() {
        return Err(anyhow!("response contained no geometry"));
    }
    Ok(collection)
}

/// Every band that has a geometry, with `STATION` added to the service's properties.
fn tagged_bands(collection: FeatureCollection, station: &str) -> Vec<Feature> {
    collection
        .features
        .into_iter()
        .filter_map(|f| {
            let geometry = f.geometry?;
            let mut props = match f.properties {
                Value::Object(m) => m,
                _ => Map::new(),
            };
            props.insert("STATION".into(), Value::String(station.to_string()));
            Some(Feature::new(geometry, props))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::routing::{RangeType, RequestKind, RoutingError};
    use serde_json::json;
    use std::{cell::RefCell, collections::VecDeque, fs};
    use tempfile::tempdir;

    /// Replays canned responses in order and records what it was asked.
    struct Stub {
        responses: RefCell<VecDeque<Result<Value, RoutingError>>>,
        seen: RefCell<Vec<GeometryRequest>>,
    }

    impl Stub {
        fn new(responses: Vec<Result<Value, RoutingError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl RoutingService for Stub {
        async fn request(&self, request: &GeometryRequest) -> Result<Value, RoutingError> {
            self.seen.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(RoutingError::Decode("stub exhausted".into())))
        }
    }

    fn polygon_response() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "value": 600 },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-71.105, 42.3], [-71.1, 42.295], [-71.095, 42.3],
                        [-71.1, 42.305], [-71.105, 42.3]
                    ]]
                }
            }]
        })
    }

    fn job_in(dir: &Path, csv: &str) -> IsochroneJob {
        let input = dir.join("stations.csv");
        fs::write(&input, csv).unwrap();
        IsochroneJob {
            input,
            output: dir.join("out/isochrones.csv"),
            smoothing: Some(5.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn single_station_polygon_becomes_wkt_row() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        let job = job_in(tmp.path(), "STATION,X,Y\nTest,-71.1,42.3\n");
        let stub = Stub::new(vec![Ok(polygon_response())]);

        let summary = run_isochrones(&stub, &job, Duration::ZERO).await?;
        assert_eq!(summary, IsochroneSummary { read: 1, written: 1, failed: 0 });

        let out = fs::read_to_string(&job.output)?;
        assert_eq!(
            out,
            "STATION,X,Y,geometry\n\
             Test,-71.1,42.3,\"POLYGON ((-71.105 42.3, -71.1 42.295, -71.095 42.3, -71.1 42.305, -71.105 42.3))\"\n"
        );

        let seen = stub.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].coordinates, vec![[-71.1, 42.3]]);
        assert_eq!(
            seen[0].kind,
            RequestKind::Isochrone {
                range: vec![600.0],
                range_type: RangeType::Time,
                smoothing: Some(5.0),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_requests_are_skipped() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        let job = job_in(
            tmp.path(),
            "STATION,X,Y,LINE\nAlewife,-71.142,42.395,Red\nDavis,-71.121,42.396,Red\nPorter,-71.119,42.388,Red\n",
        );
        let stub = Stub::new(vec![
            Ok(polygon_response()),
            Err(RoutingError::Service { status: 429, message: "Rate Limit Exceeded".into() }),
            Ok(polygon_response()),
        ]);

        let summary = run_isochrones(&stub, &job, Duration::ZERO).await?;
        assert_eq!(summary, IsochroneSummary { read: 3, written: 2, failed: 1 });

        let mut reader = csv::Reader::from_path(&job.output)?;
        let names: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(names, vec!["Alewife", "Porter"]);
        Ok(())
    }

    #[tokio::test]
    async fn empty_collection_counts_as_failure() -> Result<()> {
        let tmp = tempdir()?;
        let job = job_in(tmp.path(), "STATION,X,Y\nNowhere,0,0\n");
        let stub = Stub::new(vec![Ok(json!({"type": "FeatureCollection", "features": []}))]);

        let summary = run_isochrones(&stub, &job, Duration::ZERO).await?;
        assert_eq!(summary.written, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(fs::read_to_string(&job.output)?, "STATION,X,Y,geometry\n");
        Ok(())
    }

    #[tokio::test]
    async fn merged_geojson_tags_each_station() -> Result<()> {
        let tmp = tempdir()?;
        let mut job = job_in(tmp.path(), "STATION,X,Y\nA,-71.1,42.3\nB,-71.0,42.4\n");
        job.geojson_output = Some(tmp.path().join("out/stations.geojson"));
        let stub = Stub::new(vec![Ok(polygon_response()), Ok(polygon_response())]);

        run_isochrones(&stub, &job, Duration::ZERO).await?;

        let fc = FeatureCollection::from_value(&crate::geometry::read_geojson(
            job.geojson_output.as_ref().unwrap(),
        )?)?;
        let tags: Vec<_> = fc.features.iter().map(|f| f.properties["STATION"].clone()).collect();
        assert_eq!(tags, vec![json!("A"), json!("B")]);
        Ok(())
    }

    #[tokio::test]
    async fn merged_geojson_keeps_every_band() -> Result<()> {
        let tmp = tempdir()?;
        let mut job = job_in(tmp.path(), "STATION,X,Y\nA,-71.1,42.3\nB,-71.0,42.4\n");
        job.range = vec![300.0, 600.0];
        job.geojson_output = Some(tmp.path().join("out/bands.geojson"));

        let band = |value: f64, r: f64| {
            json!({
                "type": "Feature",
                "properties": { "group_index": 0, "value": value },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-r, 0.0], [0.0, -r], [r, 0.0], [-r, 0.0]]]
                }
            })
        };
        let two_bands = json!({
            "type": "FeatureCollection",
            "features": [band(300.0, 1.0), band(600.0, 2.0)]
        });
        let stub = Stub::new(vec![Ok(two_bands.clone()), Ok(two_bands)]);

        let summary = run_isochrones(&stub, &job, Duration::ZERO).await?;
        assert_eq!(summary.written, 2);

        let fc = FeatureCollection::from_value(&crate::geometry::read_geojson(
            job.geojson_output.as_ref().unwrap(),
        )?)?;
        let tags: Vec<_> = fc
            .features
            .iter()
            .map(|f| (f.properties["STATION"].clone(), f.properties["value"].clone()))
            .collect();
        assert_eq!(
            tags,
            vec![
                (json!("A"), json!(300.0)),
                (json!("A"), json!(600.0)),
                (json!("B"), json!(300.0)),
                (json!("B"), json!(600.0)),
            ]
        );

        // the CSV still carries one row per station, first band only
        let out = fs::read_to_string(&job.output)?;
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("POLYGON ((-1 0, 0 -1, 1 0, -1 0))"));
        assert!(!out.contains("POLYGON ((-2 0"));
        Ok(())
    }

    #[test]
    fn malformed_rows_are_dropped() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("s.csv");
        fs::write(&path, "STATION,X,Y\nGood, -71.1 ,42.3\nBad,east,42.3\n")?;
        let stations = read_stations(&path)?;
        assert_eq!(
            stations,
            vec![Station { name: "Good".into(), x: -71.1, y: 42.3 }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_input_aborts() {
        let tmp = tempdir().unwrap();
        let job = IsochroneJob {
            input: tmp.path().join("nope.csv"),
            output: tmp.path().join("out.csv"),
            ..Default::default()
        };
        let stub = Stub::new(vec![]);
        let err = run_isochrones(&stub, &job, Duration::ZERO).await.unwrap_err();
        assert!(format!("{:#}", err).contains("nope.csv"));
        assert!(stub.seen.borrow().is_empty());
        assert!(!job.output.exists());
    }
}

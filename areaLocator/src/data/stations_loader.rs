use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::poi::Coordinate;
use crate::config::constants::STATION_RECORD_KIND;
use crate::models::base_station::{Antenna, BaseStation};
use crate::utils::logging::{self, SearchPhase};

#[derive(Debug, Error)]
pub enum StationLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawPosition {
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Lng")]
    lng: f64,
}

#[derive(Deserialize)]
struct RawStation {
    #[serde(default)]
    standortbescheinigung_nr: Option<Value>,
    position: RawPosition,
    #[serde(default)]
    antennas: Vec<Antenna>,
}

/// Stations read from a dataset, with counts of the records that were dropped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub stations: Vec<BaseStation>,
    pub other_kinds: usize,
    pub invalid: usize,
}

fn station_id(raw: Option<Value>, line: usize) -> String {
    match raw {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => format!("station_{}", line),
        Some(other) => other.to_string(),
    }
}

/// Reads newline-delimited JSON records, keeping the station permit records.
pub fn read_stations<R: BufRead>(reader: R) -> Result<LoadReport, StationLoadError> {
    let mut report = LoadReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: Value = serde_json::from_str(&line)
            .map_err(|source| StationLoadError::Json { line: line_number, source })?;

        if record.get("kind").and_then(Value::as_str) != Some(STATION_RECORD_KIND) {
            report.other_kinds += 1;
            continue;
        }

        let raw: RawStation = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(line = line_number, error = %e, "Skipping station record with missing fields");
                report.invalid += 1;
                continue;
            }
        };

        let position = Coordinate::new(raw.position.lat, raw.position.lng);
        if !position.is_valid() {
            warn!(line = line_number, lat = position.lat, lon = position.lon, "Skipping station with out-of-range position");
            report.invalid += 1;
            continue;
        }

        report.stations.push(BaseStation::new(
            station_id(raw.standortbescheinigung_nr, line_number),
            position,
            raw.antennas,
        ));
    }

    Ok(report)
}

pub fn load_stations(path: impl AsRef<Path>) -> Result<Vec<BaseStation>, StationLoadError> {
    let _timing = logging::start_timing("load_stations", SearchPhase::DataLoad);
    let path = path.as_ref();

    let file = File::open(path)?;
    let report = read_stations(BufReader::new(file))?;

    info!(
        path = %path.display(),
        stations = report.stations.len(),
        other_kinds = report.other_kinds,
        invalid = report.invalid,
        "Loaded base stations"
    );

    Ok(report.stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DATASET: &str = r#"{"kind":"GetStandorteFreigabe","standortbescheinigung_nr":"510042","position":{"Lat":51.05,"Lng":13.74},"antennas":[{"type":"Mobilfunk","height":24.5},{"type":"Richtfunk","height":30.0}]}
{"kind":"GetFunkmessungen","position":{"Lat":51.0,"Lng":13.0}}

{"kind":"GetStandorteFreigabe","standortbescheinigung_nr":990017,"position":{"Lat":51.06,"Lng":13.75}}
{"kind":"GetStandorteFreigabe","standortbescheinigung_nr":"1","position":{"Lat":51.07}}
{"kind":"GetStandorteFreigabe","position":{"Lat":95.0,"Lng":13.0}}
{"kind":"GetStandorteFreigabe","position":{"Lat":51.08,"Lng":13.76},"antennas":[]}
"#;

    #[test]
    fn keeps_only_complete_station_records() {
        let report = read_stations(Cursor::new(DATASET)).unwrap();

        assert_eq!(report.stations.len(), 3);
        assert_eq!(report.other_kinds, 1);
        assert_eq!(report.invalid, 2);

        let first = &report.stations[0];
        assert_eq!(first.id(), "510042");
        assert_eq!(first.lat(), 51.05);
        assert_eq!(first.lon(), 13.74);
        assert_eq!(first.antennas().len(), 2);
        assert_eq!(first.mobile_antenna_height(), Some(24.5));
    }

    #[test]
    fn numeric_and_missing_ids() {
        let report = read_stations(Cursor::new(DATASET)).unwrap();
        assert_eq!(report.stations[1].id(), "990017");
        assert!(report.stations[1].antennas().is_empty());
        assert_eq!(report.stations[2].id(), "station_7");
    }

    #[test]
    fn malformed_json_reports_line() {
        let data = "{\"kind\":\"GetStandorteFreigabe\",\"position\":{\"Lat\":1.0,\"Lng\":2.0}}\n{not json\n";
        match read_stations(Cursor::new(data)) {
            Err(StationLoadError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected JSON error, got {:?}", other.map(|r| r.stations.len())),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_stations("/nonexistent/positions.jsonl");
        assert!(matches!(result, Err(StationLoadError::Io(_))));
    }
}

use std::path::Path;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::core::batch::BatchEntry;
use crate::models::area::{AreaResult, SearchOutcome};
use crate::models::base_station::BaseStation;
use crate::utils::logging::{self, SearchPhase};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Area references station {0}, which is not in the dataset")]
    UnknownStation(usize),
}

#[derive(Debug, Serialize)]
struct StationRow<'a> {
    id: &'a str,
    lat: f64,
    lon: f64,
    antennas: usize,
    mobile_antennas: usize,
    mobile_antenna_height: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
struct BatchRow {
    seed: u64,
    status: &'static str,
    attempts: Option<usize>,
    center_lat: Option<f64>,
    center_lon: Option<f64>,
    height_km: Option<f64>,
    width_km: Option<f64>,
    density: Option<f64>,
    error: Option<String>,
}

impl From<&BatchEntry> for BatchRow {
    fn from(entry: &BatchEntry) -> Self {
        match &entry.result {
            Ok(SearchOutcome::Found(area)) => BatchRow {
                seed: entry.seed,
                status: "found",
                attempts: Some(area.attempts),
                center_lat: Some(area.center_lat),
                center_lon: Some(area.center_lon),
                height_km: Some(area.height_km),
                width_km: Some(area.width_km),
                density: Some(area.density),
                ..Default::default()
            },
            Ok(SearchOutcome::Exhausted { attempts, reason }) => BatchRow {
                seed: entry.seed,
                status: "exhausted",
                attempts: Some(*attempts),
                error: Some(reason.to_string()),
                ..Default::default()
            },
            Err(e) => BatchRow {
                seed: entry.seed,
                status: "invalid",
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}

fn write_area_stations<W: std::io::Write>(
    writer: W,
    stations: &[BaseStation],
    area: &AreaResult,
) -> Result<usize, ExportError> {
    let mut csv = csv::Writer::from_writer(writer);

    for &key in &area.station_keys {
        let station = stations.get(key).ok_or(ExportError::UnknownStation(key))?;
        csv.serialize(StationRow {
            id: station.id(),
            lat: station.lat(),
            lon: station.lon(),
            antennas: station.antennas().len(),
            mobile_antennas: station.mobile_antennas().count(),
            mobile_antenna_height: station.mobile_antenna_height(),
        })?;
    }

    csv.flush()?;
    Ok(area.station_keys.len())
}

fn write_batch_results<W: std::io::Write>(writer: W, entries: &[BatchEntry]) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for entry in entries {
        csv.serialize(BatchRow::from(entry))?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes one row per station inside `area`.
pub fn export_area_stations(
    path: impl AsRef<Path>,
    stations: &[BaseStation],
    area: &AreaResult,
) -> Result<(), ExportError> {
    let _timing = logging::start_timing("export_area_stations", SearchPhase::Export);
    let path = path.as_ref();

    let file = std::fs::File::create(path)?;
    let rows = write_area_stations(file, stations, area)?;

    info!(path = %path.display(), rows, "Exported area stations");
    Ok(())
}

pub fn export_batch_results(path: impl AsRef<Path>, entries: &[BatchEntry]) -> Result<(), ExportError> {
    let _timing = logging::start_timing("export_batch_results", SearchPhase::Export);
    let path = path.as_ref();

    let file = std::fs::File::create(path)?;
    write_batch_results(file, entries)?;

    info!(path = %path.display(), rows = entries.len(), "Exported batch results");
    Ok(())
}

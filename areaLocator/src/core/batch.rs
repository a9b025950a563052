use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::core::error::LocatorError;
use crate::core::locator::AreaLocator;
use crate::models::area::SearchOutcome;
use crate::utils::logging::{self, SearchPhase};

/// Result of one seed in a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub seed: u64,
    pub result: Result<SearchOutcome, LocatorError>,
}

impl BatchEntry {
    pub fn is_found(&self) -> bool {
        matches!(self.result, Ok(SearchOutcome::Found(_)))
    }
}

/// Runs one search per seed against the same locator. Entries come back in
/// seed order whether or not the run is parallel.
pub fn locate_batch(
    locator: &AreaLocator<'_>,
    target: usize,
    seeds: &[u64],
    min_density: f64,
    max_density: f64,
    parallel: bool,
) -> Vec<BatchEntry> {
    let _timing = logging::start_timing("locate_batch", SearchPhase::Batch);

    let run = |&seed: &u64| BatchEntry {
        seed,
        result: locator.find_area_with_base_stations(target, seed, min_density, max_density),
    };

    let entries: Vec<BatchEntry> = if parallel {
        seeds.par_iter().map(run).collect()
    } else {
        seeds.iter().map(run).collect()
    };

    let found = entries.iter().filter(|e| e.is_found()).count();
    let attempts: usize = entries
        .iter()
        .filter_map(|e| e.result.as_ref().ok())
        .map(SearchOutcome::attempts)
        .sum();
    info!(seeds = seeds.len(), found, attempts, parallel, "Batch search complete");

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::locator::SearchLimits;
    use crate::data::poi::Coordinate;
    use crate::models::base_station::BaseStation;

    fn stations() -> Vec<BaseStation> {
        let mut stations = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                stations.push(BaseStation::new(
                    format!("{}-{}", i, j),
                    Coordinate::new(50.0 + i as f64 * 0.01, 8.0 + j as f64 * 0.015),
                    Vec::new(),
                ));
            }
        }
        stations
    }

    #[test]
    fn parallel_matches_sequential() {
        let stations = stations();
        let locator = AreaLocator::new(&stations, SearchLimits { max_attempts: 200, timeout: None }).unwrap();
        let seeds: Vec<u64> = (0..8).collect();

        let sequential = locate_batch(&locator, 4, &seeds, 0.5, 50.0, false);
        let parallel = locate_batch(&locator, 4, &seeds, 0.5, 50.0, true);

        assert_eq!(sequential, parallel);
        assert!(parallel.iter().all(|e| e.result.as_ref().map_or(false, |o| o.attempts() >= 1)));
        assert_eq!(parallel.iter().map(|e| e.seed).collect::<Vec<_>>(), seeds);
    }

    #[test]
    fn validation_errors_are_reported_per_seed() {
        let stations = stations();
        let locator = AreaLocator::new(&stations, SearchLimits { max_attempts: 10, timeout: None }).unwrap();

        let entries = locate_batch(&locator, 4, &[1, 2], 3.0, 1.0, true);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| matches!(e.result, Err(LocatorError::InvalidDensityBand { .. }))));
    }
}

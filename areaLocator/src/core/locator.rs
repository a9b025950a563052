use std::time::{Duration, Instant};

use anyhow::Context;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::constants::{MAX_EXPANSION_STEP, MAX_SEARCH_RADIUS, RADIUS_TOLERANCE, SEARCH_EPSILON};
use crate::config::const_funcs::{box_dimensions_km, calc_density};
use crate::config::locator_config::LocatorConfig;
use crate::core::error::LocatorError;
use crate::data::poi::Coordinate;
use crate::data::stations_loader;
use crate::models::area::{AreaResult, BoundingBox, DensityBand, ExhaustionReason, SearchOutcome};
use crate::models::base_station::BaseStation;
use crate::utils::logging::{self, SearchPhase};
use crate::utils::spatial_index::{SpatialIndex, SpatialIndexError};

/// Bounds on how long a single search may keep retrying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    pub max_attempts: usize,
    pub timeout: Option<Duration>,
}

/// A candidate box after the density step, before acceptance.
struct Candidate {
    bounds: BoundingBox,
    keys: Vec<usize>,
    height_km: f64,
    width_km: f64,
    density: f64,
}

/// Searches a fixed station set for areas with an exact station count.
///
/// The spatial index is built once in [`AreaLocator::new`] and only read
/// afterwards, so one locator can serve many searches, including concurrent
/// ones from the batch runner.
pub struct AreaLocator<'a> {
    stations: &'a [BaseStation],
    index: SpatialIndex,
    limits: SearchLimits,
    progress: ProgressBar,
}

impl<'a> AreaLocator<'a> {
    pub fn new(stations: &'a [BaseStation], limits: SearchLimits) -> Result<Self, SpatialIndexError> {
        let index = SpatialIndex::from_points(stations)?;
        Ok(Self {
            stations,
            index,
            limits,
            progress: ProgressBar::hidden(),
        })
    }

    /// Reports attempts to `progress` (hidden by default).
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    fn validate(&self, target: usize, min_density: f64, max_density: f64) -> Result<DensityBand, LocatorError> {
        let band = DensityBand::new(min_density, max_density)?;
        if target == 0 {
            return Err(LocatorError::ZeroTarget);
        }
        if self.stations.is_empty() {
            return Err(LocatorError::EmptyDataset);
        }
        if target > self.stations.len() {
            return Err(LocatorError::TargetExceedsDataset {
                target,
                available: self.stations.len(),
            });
        }
        Ok(band)
    }

    /// Finds an area holding exactly `target` stations with a density inside
    /// `[min_density, max_density]`. Identical inputs give identical results.
    pub fn find_area_with_base_stations(
        &self,
        target: usize,
        seed: u64,
        min_density: f64,
        max_density: f64,
    ) -> Result<SearchOutcome, LocatorError> {
        let band = self.validate(target, min_density, max_density)?;

        let mut rng = StdRng::seed_from_u64(seed);
        // A deadline past what Instant can represent means no deadline
        let deadline = self.limits.timeout.and_then(|t| Instant::now().checked_add(t));
        let mut attempts = 0;

        loop {
            if attempts >= self.limits.max_attempts {
                info!(attempts, target, seed, "Giving up: maximum attempts reached");
                return Ok(SearchOutcome::Exhausted { attempts, reason: ExhaustionReason::MaxAttempts });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                info!(attempts, target, seed, "Giving up: timeout reached");
                return Ok(SearchOutcome::Exhausted { attempts, reason: ExhaustionReason::Timeout });
            }

            attempts += 1;
            self.progress.inc(1);

            let start = &self.stations[rng.gen_range(0..self.stations.len())];
            let center = *start.position();

            let included = self.radius_search(&center, target);
            if included.len() != target {
                debug!(attempt = attempts, found = included.len(), target, "Radius search did not converge, retrying");
                continue;
            }

            let candidate = self.fit_density(&center, included, target, &band);

            if band.contains(candidate.density) && candidate.keys.len() == target {
                info!(
                    "Found area with density of {:.2} after {} attempts!",
                    candidate.density, attempts
                );
                self.progress.set_message(format!("density {:.2}", candidate.density));

                let mut station_keys = candidate.keys;
                station_keys.sort_unstable();

                return Ok(SearchOutcome::Found(AreaResult {
                    center_lat: center.lat,
                    center_lon: center.lon,
                    height_km: candidate.height_km,
                    width_km: candidate.width_km,
                    density: candidate.density,
                    bounds: candidate.bounds,
                    station_keys,
                    attempts,
                }));
            }

            debug!(
                "Failed to find area with density of {} <= {:.2} <= {} and {} == {}! Retrying...",
                band.min(), candidate.density, band.max(), candidate.keys.len(), target
            );
        }
    }

    /// Bisects the half-width of a square around `center` until it holds
    /// `target` stations or the bracket collapses.
    fn radius_search(&self, center: &Coordinate, target: usize) -> Vec<usize> {
        let _timing = logging::start_timing("radius_search", SearchPhase::RadiusSearch);

        let mut min_radius = SEARCH_EPSILON;
        let mut max_radius = MAX_SEARCH_RADIUS;

        loop {
            let radius = (min_radius + max_radius) / 2.0;
            let included = self.index.intersection(&BoundingBox::around(center, radius));

            match included.len().cmp(&target) {
                std::cmp::Ordering::Equal => return included,
                std::cmp::Ordering::Less => min_radius = radius,
                std::cmp::Ordering::Greater => max_radius = radius,
            }
            if max_radius - min_radius < RADIUS_TOLERANCE {
                return included;
            }
        }
    }

    /// Measures the tight box around `included` and, if it is too dense,
    /// grows it towards the lower edge of the band.
    fn fit_density(&self, center: &Coordinate, included: Vec<usize>, target: usize, band: &DensityBand) -> Candidate {
        let tight = BoundingBox::enclosing(included.iter().map(|&k| self.stations[k].position()))
            .unwrap_or_else(|| BoundingBox::around(center, 0.0));

        let (height_km, width_km) = box_dimensions_km(&tight, center);
        let density = calc_density(target, height_km, width_km);

        if density <= band.max() {
            return Candidate { bounds: tight, keys: included, height_km, width_km, density };
        }

        self.expand_to_band(center, &tight, target, band)
    }

    fn expand_to_band(&self, center: &Coordinate, tight: &BoundingBox, target: usize, band: &DensityBand) -> Candidate {
        let _timing = logging::start_timing("expand_to_band", SearchPhase::DensityExpansion);

        let mut min_step = SEARCH_EPSILON;
        let mut max_step = MAX_EXPANSION_STEP;

        while max_step - min_step >= SEARCH_EPSILON {
            let step = (min_step + max_step) / 2.0;
            let expanded = tight.expand(step);

            if self.index.count(&expanded) > target {
                max_step = step;
                continue;
            }

            let (height_km, width_km) = box_dimensions_km(&expanded, center);
            let density = calc_density(target, height_km, width_km);
            debug!("New density: {:.2}", density);

            if density < band.min() {
                max_step = step;
            } else {
                min_step = step;
            }
        }

        // The lower bound is the widest step seen that kept both the count and
        // the minimum density; if it never moved the box is still too dense.
        let bounds = tight.expand(min_step);
        let keys = self.index.intersection(&bounds);
        let (height_km, width_km) = box_dimensions_km(&bounds, center);
        let density = calc_density(target, height_km, width_km);

        Candidate { bounds, keys, height_km, width_km, density }
    }
}

/// Loads the configured dataset, indexes it and runs one search.
///
/// Parameters are validated before the dataset is read.
pub fn find_location(
    config: &LocatorConfig,
    target: usize,
    seed: u64,
    min_density: f64,
    max_density: f64,
) -> anyhow::Result<SearchOutcome> {
    DensityBand::new(min_density, max_density)?;
    if target == 0 {
        return Err(LocatorError::ZeroTarget.into());
    }

    let stations = stations_loader::load_stations(&config.dataset_path)
        .with_context(|| format!("Failed to load stations from {}", config.dataset_path.display()))?;

    let locator = AreaLocator::new(&stations, config.limits())?;
    Ok(locator.find_area_with_base_stations(target, seed, min_density, max_density)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::base_station::Antenna;

    fn station(id: &str, lat: f64, lon: f64) -> BaseStation {
        BaseStation::new(
            id.to_string(),
            Coordinate::new(lat, lon),
            vec![Antenna { antenna_type: "Mobilfunk".to_string(), height: 25.0 }],
        )
    }

    fn limits(max_attempts: usize) -> SearchLimits {
        SearchLimits { max_attempts, timeout: None }
    }

    fn cluster() -> Vec<BaseStation> {
        vec![
            station("a", 52.000, 13.000),
            station("b", 52.005, 13.004),
            station("c", 52.008, 13.009),
        ]
    }

    #[test]
    fn clustered_stations_are_found() {
        let stations = cluster();
        let locator = AreaLocator::new(&stations, limits(100)).unwrap();

        let outcome = locator.find_area_with_base_stations(3, 42, 1.0, 1000.0).unwrap();
        let area = outcome.area().expect("area should be found");

        assert_eq!(area.station_keys, vec![0, 1, 2]);
        assert!(area.height_km > 0.0);
        assert!(area.width_km > 0.0);
        assert!(area.density >= 1.0 && area.density <= 1000.0);
        assert_eq!(locator.index().count(&area.bounds), 3);
        assert_eq!(area.attempts, 1);
    }

    #[test]
    fn dense_area_is_expanded_into_band() {
        let stations = cluster();
        let locator = AreaLocator::new(&stations, limits(100)).unwrap();

        // The tight box holds about 5.5 stations per km²
        let area = locator
            .find_area_with_base_stations(3, 42, 1.0, 2.0)
            .unwrap()
            .into_area()
            .expect("expansion should reach the band");

        assert!(area.density >= 1.0 && area.density <= 2.0, "density {}", area.density);
        assert_eq!(locator.index().count(&area.bounds), 3);
        assert!(area.bounds.min_lat < 52.000 && area.bounds.max_lat > 52.008);
    }

    #[test]
    fn impossible_band_exhausts_attempts() {
        let stations = cluster();
        let locator = AreaLocator::new(&stations, limits(25)).unwrap();

        let outcome = locator.find_area_with_base_stations(3, 1, 10_000.0, 20_000.0).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Exhausted { attempts: 25, reason: ExhaustionReason::MaxAttempts }
        );
    }

    #[test]
    fn zero_timeout_exhausts_immediately() {
        let stations = cluster();
        let locator = AreaLocator::new(
            &stations,
            SearchLimits { max_attempts: 100, timeout: Some(Duration::ZERO) },
        )
        .unwrap();

        let outcome = locator.find_area_with_base_stations(3, 1, 1.0, 1000.0).unwrap();
        assert_eq!(outcome, SearchOutcome::Exhausted { attempts: 0, reason: ExhaustionReason::Timeout });
    }

    #[test]
    fn unreachable_deadline_searches_without_limit() {
        let stations = cluster();
        for timeout in [Duration::MAX, Duration::from_secs_f64(1e19)] {
            let locator = AreaLocator::new(&stations, SearchLimits { max_attempts: 100, timeout: Some(timeout) })
                .unwrap();
            let outcome = locator.find_area_with_base_stations(3, 42, 1.0, 1000.0).unwrap();
            assert!(outcome.area().is_some());
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let stations = cluster();
        let locator = AreaLocator::new(&stations, limits(10)).unwrap();

        assert!(matches!(
            locator.find_area_with_base_stations(3, 42, 5.0, 1.0),
            Err(LocatorError::InvalidDensityBand { .. })
        ));
        assert_eq!(locator.find_area_with_base_stations(0, 42, 1.0, 2.0), Err(LocatorError::ZeroTarget));
        assert_eq!(
            locator.find_area_with_base_stations(4, 42, 1.0, 2.0),
            Err(LocatorError::TargetExceedsDataset { target: 4, available: 3 })
        );
    }

    #[test]
    fn density_band_is_checked_before_dataset() {
        let locator = AreaLocator::new(&[], limits(10)).unwrap();
        assert!(matches!(
            locator.find_area_with_base_stations(1, 42, 5.0, 1.0),
            Err(LocatorError::InvalidDensityBand { .. })
        ));
        assert_eq!(locator.find_area_with_base_stations(1, 42, 1.0, 2.0), Err(LocatorError::EmptyDataset));
    }

    #[test]
    fn find_location_validates_before_loading() {
        let config = LocatorConfig {
            dataset_path: "/nonexistent/positions.jsonl".into(),
            ..LocatorConfig::default()
        };

        let err = find_location(&config, 3, 42, 25.0, 20.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocatorError>(),
            Some(LocatorError::InvalidDensityBand { .. })
        ));

        // Valid parameters reach the loader, which then fails on the path
        let err = find_location(&config, 3, 42, 20.0, 25.0).unwrap_err();
        assert!(err.downcast_ref::<LocatorError>().is_none());
    }
}

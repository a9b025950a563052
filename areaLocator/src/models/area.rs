use serde::{Deserialize, Serialize};
use std::fmt;
use crate::config::const_funcs::{bounding_box_from_center_and_dimensions, scenario_directory_name};
use crate::core::error::LocatorError;
use crate::data::poi::Coordinate;

/// Axis-aligned box in degrees. All edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    /// Square box extending `half_width` degrees from `center` in every direction.
    pub fn around(center: &Coordinate, half_width: f64) -> Self {
        Self {
            min_lat: center.lat - half_width,
            max_lat: center.lat + half_width,
            min_lon: center.lon - half_width,
            max_lon: center.lon + half_width,
        }
    }

    /// Tightest box containing all coordinates, or None if there are none.
    pub fn enclosing<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.lat, first.lat, first.lon, first.lon);
        for c in iter {
            bounds.min_lat = bounds.min_lat.min(c.lat);
            bounds.max_lat = bounds.max_lat.max(c.lat);
            bounds.min_lon = bounds.min_lon.min(c.lon);
            bounds.max_lon = bounds.max_lon.max(c.lon);
        }
        Some(bounds)
    }

    /// Moves every edge outwards by `step` degrees.
    pub fn expand(&self, step: f64) -> Self {
        Self {
            min_lat: self.min_lat - step,
            max_lat: self.max_lat + step,
            min_lon: self.min_lon - step,
            max_lon: self.max_lon + step,
        }
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat >= self.min_lat && point.lat <= self.max_lat &&
        point.lon >= self.min_lon && point.lon <= self.max_lon
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lat <= other.max_lat && self.max_lat >= other.min_lat &&
        self.min_lon <= other.max_lon && self.max_lon >= other.min_lon
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

impl fmt::Display for BoundingBox {
    // lon/lat order, as used by OSM bbox parameters
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }
}

/// Accepted station density range in stations per km², inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityBand {
    min: f64,
    max: f64,
}

impl DensityBand {
    pub fn new(min: f64, max: f64) -> Result<Self, LocatorError> {
        if min > max {
            return Err(LocatorError::InvalidDensityBand { min, max });
        }
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 {
            return Err(LocatorError::NonPositiveDensity { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, density: f64) -> bool {
        self.min <= density && density <= self.max
    }
}

/// An accepted area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    pub center_lat: f64,
    pub center_lon: f64,
    pub height_km: f64,
    pub width_km: f64,
    pub density: f64,
    pub bounds: BoundingBox,
    pub station_keys: Vec<usize>,
    pub attempts: usize,
}

impl AreaResult {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center_lat, self.center_lon)
    }

    pub fn area_sq_km(&self) -> f64 {
        self.height_km * self.width_km
    }

    pub fn station_count(&self) -> usize {
        self.station_keys.len()
    }

    /// Box of the area's size centered on its center, as used for OSM scenario downloads.
    /// Its `Display` is the OSM `bbox` parameter.
    pub fn scenario_bounds(&self) -> BoundingBox {
        bounding_box_from_center_and_dimensions(&self.center(), self.width_km, self.height_km)
    }

    pub fn scenario_name(&self) -> String {
        scenario_directory_name(&self.center(), self.width_km, self.height_km)
    }

    /// `(center_lat, center_lon, height_km, width_km, density)`
    pub fn as_tuple(&self) -> (f64, f64, f64, f64, f64) {
        (self.center_lat, self.center_lon, self.height_km, self.width_km, self.density)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhaustionReason {
    MaxAttempts,
    Timeout,
}

impl fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionReason::MaxAttempts => write!(f, "maximum attempts reached"),
            ExhaustionReason::Timeout => write!(f, "timeout reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchOutcome {
    Found(AreaResult),
    Exhausted {
        attempts: usize,
        reason: ExhaustionReason,
    },
}

impl SearchOutcome {
    pub fn area(&self) -> Option<&AreaResult> {
        match self {
            SearchOutcome::Found(area) => Some(area),
            SearchOutcome::Exhausted { .. } => None,
        }
    }

    pub fn into_area(self) -> Option<AreaResult> {
        match self {
            SearchOutcome::Found(area) => Some(area),
            SearchOutcome::Exhausted { .. } => None,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            SearchOutcome::Found(area) => area.attempts,
            SearchOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_band_validation() {
        assert!(DensityBand::new(1.0, 2.0).is_ok());
        assert!(DensityBand::new(3.0, 3.0).is_ok());
        assert!(matches!(
            DensityBand::new(5.0, 2.0),
            Err(LocatorError::InvalidDensityBand { .. })
        ));
        assert!(matches!(
            DensityBand::new(0.0, 2.0),
            Err(LocatorError::NonPositiveDensity { .. })
        ));
        assert!(matches!(
            DensityBand::new(1.0, f64::INFINITY),
            Err(LocatorError::NonPositiveDensity { .. })
        ));
    }

    #[test]
    fn density_band_is_inclusive() {
        let band = DensityBand::new(1.0, 2.0).unwrap();
        assert!(band.contains(1.0));
        assert!(band.contains(2.0));
        assert!(!band.contains(0.999));
        assert!(!band.contains(2.001));
    }

    #[test]
    fn enclosing_box() {
        let coords = [
            Coordinate::new(52.0, 13.0),
            Coordinate::new(52.5, 12.5),
            Coordinate::new(51.8, 13.2),
        ];
        let bounds = BoundingBox::enclosing(coords.iter()).unwrap();
        assert_eq!(bounds, BoundingBox::new(51.8, 52.5, 12.5, 13.2));
        assert!(coords.iter().all(|c| bounds.contains(c)));
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn expand_and_intersect() {
        let a = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let b = BoundingBox::new(1.5, 2.0, 1.5, 2.0);
        assert!(!a.intersects(&b));
        assert!(a.expand(0.5).intersects(&b));
        // Touching edges count as intersecting
        assert!(BoundingBox::new(1.0, 2.0, 1.0, 2.0).intersects(&a));
    }

    #[test]
    fn scenario_bounds_cover_the_area() {
        let area = AreaResult {
            center_lat: 52.004,
            center_lon: 13.0045,
            height_km: 0.9,
            width_km: 0.62,
            density: 5.4,
            bounds: BoundingBox::new(52.0, 52.008, 13.0, 13.009),
            station_keys: vec![0, 1, 2],
            attempts: 1,
        };

        let scenario = area.scenario_bounds();
        assert!(scenario.contains(&area.center()));
        assert!((scenario.center().lat - area.center_lat).abs() < 1e-9);
        assert!((scenario.center().lon - area.center_lon).abs() < 1e-9);
        // 0.9 km of latitude is roughly 0.0081 degrees
        assert!((scenario.max_lat - scenario.min_lat - 0.0081).abs() < 1e-4);
        assert!(scenario.max_lon - scenario.min_lon > scenario.max_lat - scenario.min_lat);
        assert_eq!(area.scenario_name(), "scenario-52.004-13.0045-0.62-0.9");
    }

    #[test]
    fn outcome_attempts() {
        let exhausted = SearchOutcome::Exhausted { attempts: 7, reason: ExhaustionReason::Timeout };
        assert_eq!(exhausted.attempts(), 7);
        assert!(exhausted.area().is_none());
    }

    #[test]
    fn display_uses_lon_lat_order() {
        let bounds = BoundingBox::new(51.0, 52.0, 7.0, 8.0);
        assert_eq!(bounds.to_string(), "7,51,8,52");
    }
}

use serde::{Deserialize, Serialize};
use crate::config::constants::{MIN_LAT, MAX_LAT, MIN_LON, MAX_LON};

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() &&
        (MIN_LAT..=MAX_LAT).contains(&self.lat) &&
        (MIN_LON..=MAX_LON).contains(&self.lon)
    }
}

pub trait POI {
    fn get_coordinate(&self) -> &Coordinate;
    fn get_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinate::new(52.5, 13.4).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.1).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}

use serde::{Deserialize, Serialize};
use crate::config::constants::MOBILE_ANTENNA_TYPE;
use crate::data::poi::{Coordinate, POI};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    #[serde(rename = "type")]
    pub antenna_type: String,
    pub height: f64,
}

impl Antenna {
    pub fn is_mobile(&self) -> bool {
        self.antenna_type == MOBILE_ANTENNA_TYPE
    }
}

/// A cell site loaded from the positions dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStation {
    id: String,
    position: Coordinate,
    antennas: Vec<Antenna>,
}

impl BaseStation {
    pub fn new(id: String, position: Coordinate, antennas: Vec<Antenna>) -> Self {
        Self { id, position, antennas }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> &Coordinate {
        &self.position
    }

    pub fn lat(&self) -> f64 {
        self.position.lat
    }

    pub fn lon(&self) -> f64 {
        self.position.lon
    }

    pub fn antennas(&self) -> &[Antenna] {
        &self.antennas
    }

    pub fn mobile_antennas(&self) -> impl Iterator<Item = &Antenna> {
        self.antennas.iter().filter(|a| a.is_mobile())
    }

    /// Mean height of the mobile network antennas, if the site has any.
    pub fn mobile_antenna_height(&self) -> Option<f64> {
        let (count, total) = self
            .mobile_antennas()
            .fold((0usize, 0.0), |(n, sum), a| (n + 1, sum + a.height));

        if count == 0 {
            None
        } else {
            Some(total / count as f64)
        }
    }
}

impl POI for BaseStation {
    fn get_coordinate(&self) -> &Coordinate {
        &self.position
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}

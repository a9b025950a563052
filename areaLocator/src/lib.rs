// Module declarations for the area locator

// Search core
pub mod core {
    pub mod error;
    pub mod locator;
    pub mod batch;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod const_funcs;
    pub mod locator_config;
}

// Model definitions
pub mod models {
    pub mod base_station;
    pub mod area;
}

// Data loaders
pub mod data {
    pub mod stations_loader;
    pub mod poi;
}

// Utility functions
pub mod utils {
    pub mod spatial_index;
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::config::const_funcs::calculate_distance;
pub use crate::config::locator_config::LocatorConfig;
pub use crate::core::error::LocatorError;
pub use crate::core::locator::{find_location, AreaLocator};
pub use crate::models::area::{AreaResult, BoundingBox, DensityBand, ExhaustionReason, SearchOutcome};
pub use crate::models::base_station::{Antenna, BaseStation};
pub use crate::utils::spatial_index::SpatialIndex;

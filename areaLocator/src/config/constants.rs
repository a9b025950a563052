// Geodesy
pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DISTANCE_EPSILON_KM: f64 = 0.0001;        // Added to every distance so areas are never zero
pub const OFFSET_SAMPLE_DEGREES: f64 = 0.05;        // Sample span for km -> degree conversion

// Coordinate bounds (degrees)
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

// Radius search (degrees)
pub const SEARCH_EPSILON: f64 = 0.001;              // Roughly 100m of latitude
pub const MAX_SEARCH_RADIUS: f64 = 1000.0;
pub const RADIUS_TOLERANCE: f64 = 0.0001;

// Density expansion (degrees)
pub const MAX_EXPANSION_STEP: f64 = 70.0;

// Search limits
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

// CLI defaults
pub const DEFAULT_TARGET_STATIONS: usize = 1;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MIN_DENSITY: f64 = 1.0;
pub const DEFAULT_MAX_DENSITY: f64 = 2.0;

// Dataset
pub const STATION_RECORD_KIND: &str = "GetStandorteFreigabe";
pub const MOBILE_ANTENNA_TYPE: &str = "Mobilfunk";
pub const DEFAULT_DATASET_PATH: &str = "data/positions.jsonl";
pub const NS3_DATASET_SUBPATH: &str = "contrib/defiance/utils/data/positions.jsonl";

// Spatial index
pub const QUADTREE_NODE_CAPACITY: usize = 8;
pub const QUADTREE_MAX_DEPTH: usize = 24;

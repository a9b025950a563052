use crate::config::constants::*;
use crate::data::poi::{Coordinate, POI};
use crate::models::area::BoundingBox;

/// Great-circle distance in kilometers between two points given in degrees.
///
/// A small epsilon is added so that areas derived from these distances are
/// never zero, even for co-located stations.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lon1_rad = lon1.to_radians();
    let lat2_rad = lat2.to_radians();
    let lon2_rad = lon2.to_radians();

    let dlon = lon2_rad - lon1_rad;
    let dlat = lat2_rad - lat1_rad;
    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    c * EARTH_RADIUS_KM + DISTANCE_EPSILON_KM
}

/// Height and width (km) of a box, measured through the given center.
pub fn box_dimensions_km(bounds: &BoundingBox, center: &Coordinate) -> (f64, f64) {
    let height = calculate_distance(bounds.min_lat, center.lon, bounds.max_lat, center.lon);
    let width = calculate_distance(center.lat, bounds.min_lon, center.lat, bounds.max_lon);
    (height, width)
}

pub fn calc_density(station_count: usize, height_km: f64, width_km: f64) -> f64 {
    station_count as f64 / (height_km * width_km)
}

/// Mean position of a set of points.
pub fn find_center_point<P: POI>(points: &[P]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }

    let count = points.len() as f64;
    let total_lat: f64 = points.iter().map(|p| p.get_coordinate().lat).sum();
    let total_lon: f64 = points.iter().map(|p| p.get_coordinate().lon).sum();

    Some(Coordinate::new(total_lat / count, total_lon / count))
}

pub fn distance_to_lat_offset(distance_km: f64, center: &Coordinate) -> f64 {
    let sample_km = calculate_distance(center.lat, center.lon, center.lat + OFFSET_SAMPLE_DEGREES, center.lon);
    distance_km * (OFFSET_SAMPLE_DEGREES / sample_km)
}

pub fn distance_to_lon_offset(distance_km: f64, center: &Coordinate) -> f64 {
    let sample_km = calculate_distance(center.lat, center.lon, center.lat, center.lon + OFFSET_SAMPLE_DEGREES);
    distance_km * (OFFSET_SAMPLE_DEGREES / sample_km)
}

/// Box of `width_km` x `height_km` centered on `center`.
pub fn bounding_box_from_center_and_dimensions(center: &Coordinate, width_km: f64, height_km: f64) -> BoundingBox {
    let lat_offset = distance_to_lat_offset(height_km / 2.0, center);
    let lon_offset = distance_to_lon_offset(width_km / 2.0, center);

    BoundingBox {
        min_lat: center.lat - lat_offset,
        max_lat: center.lat + lat_offset,
        min_lon: center.lon - lon_offset,
        max_lon: center.lon + lon_offset,
    }
}

pub fn scenario_directory_name(center: &Coordinate, width_km: f64, height_km: f64) -> String {
    format!("scenario-{}-{}-{}-{}", center.lat, center.lon, width_km, height_km)
}

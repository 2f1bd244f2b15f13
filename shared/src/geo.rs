use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_MILES: f64 = 3959.0;

// Optional EWKT SRID prefix, then POINT(lon lat)
static POINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:SRID=\d+;)?\s*POINT\s*\(\s*(\S+)\s+(\S+)\s*\)\s*$").unwrap()
});

/// Latitude/longitude in decimal degrees (WGS84)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    MalformedCoordinate(String),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCoordinate(raw) => write!(f, "Malformed coordinate: {:?}", raw),
        }
    }
}

impl std::error::Error for GeoError {}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_miles(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Great-circle distance in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for near-antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Parses `POINT(lon lat)`. Longitude comes first.
pub fn parse_point(raw: &str) -> Result<Coordinate, GeoError> {
    let malformed = || GeoError::MalformedCoordinate(raw.to_string());

    let caps = POINT_PATTERN.captures(raw).ok_or_else(malformed)?;
    let longitude: f64 = caps[1].parse().map_err(|_| malformed())?;
    let latitude: f64 = caps[2].parse().map_err(|_| malformed())?;

    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(malformed());
    }

    Ok(Coordinate { latitude, longitude })
}

/// Fail-soft variant used when ranking: anything unparsable is an unknown location.
pub fn try_parse_point(raw: &str) -> Option<Coordinate> {
    if raw.trim().is_empty() {
        return None;
    }
    match parse_point(raw) {
        Ok(coordinate) => Some(coordinate),
        Err(e) => {
            log::warn!("{}, treating distance as unknown", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: Coordinate = Coordinate { latitude: 40.7128, longitude: -74.0060 };
    const LA: Coordinate = Coordinate { latitude: 34.0522, longitude: -118.2437 };

    #[test]
    fn test_self_distance_is_zero() {
        for c in [NYC, LA, Coordinate::new(0.0, 0.0), Coordinate::new(-89.9, 179.9)] {
            assert_eq!(c.distance_to(&c), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = haversine_miles(NYC.latitude, NYC.longitude, LA.latitude, LA.longitude);
        let b = haversine_miles(LA.latitude, LA.longitude, NYC.latitude, NYC.longitude);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_nyc_to_la() {
        let miles = NYC.distance_to(&LA);
        assert!((miles - 2445.0).abs() < 2445.0 * 0.01, "got {}", miles);
    }

    #[test]
    fn test_antipodal_distance_is_finite() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_MILES;
        for (lat, lon) in [(-87.843, -176.79), (10.0, 20.0), (45.5, -73.6), (0.0, 0.0)] {
            let miles = haversine_miles(lat, lon, -lat, lon + 180.0);
            assert!(miles.is_finite(), "({}, {}) gave {}", lat, lon, miles);
            assert!((miles - half_circumference).abs() < 1.0, "({}, {}) gave {}", lat, lon, miles);
        }
        assert!((half_circumference - 12437.0).abs() < 1.0);
    }

    #[test]
    fn test_parse_point_longitude_first() {
        let c = parse_point("POINT(-74.006 40.7128)").unwrap();
        assert_eq!(c.longitude, -74.006);
        assert_eq!(c.latitude, 40.7128);

        let c = parse_point("SRID=4326;POINT(-118.2437 34.0522)").unwrap();
        assert_eq!(c.latitude, 34.0522);
    }

    #[test]
    fn test_parse_point_rejects_garbage() {
        for raw in ["", "POINT()", "POINT(1)", "POINT(a b)", "LINESTRING(1 2, 3 4)", "POINT(NaN 1)", "POINT(inf 2)"] {
            assert!(matches!(parse_point(raw), Err(GeoError::MalformedCoordinate(_))), "{}", raw);
        }
        assert_eq!(try_parse_point("not a point"), None);
        assert_eq!(try_parse_point("   "), None);
    }
}

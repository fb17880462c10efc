//! Geographic points and great-circle distances.

use crate::validation::FieldError;

/// Radius used for spherical distance queries, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Stores farther than this from the query point are never returned.
pub const MAX_NEAR_DISTANCE_METERS: f64 = 10_000.0;

pub const DEFAULT_NEAR_LIMIT: i64 = 10;
pub const MAX_NEAR_LIMIT: i64 = 100;

/// A longitude/latitude pair in degrees, stored in GeoJSON order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lng: f64, lat: f64) -> Result<Self, FieldError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(FieldError::new("lng", "Longitude must be a number between -180 and 180"));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(FieldError::new("lat", "Latitude must be a number between -90 and 90"));
        }
        Ok(Self { lng, lat })
    }

    /// Parses raw query-string values. Anything that is not a valid number is rejected.
    pub fn parse(lng: &str, lat: &str) -> Result<Self, FieldError> {
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|_| FieldError::new("lng", "Longitude must be a number"))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| FieldError::new("lat", "Latitude must be a number"))?;
        Self::new(lng, lat)
    }

    /// Haversine distance to `other`, in meters.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

/// Clamps a caller-supplied result count for the nearest-store query.
pub fn near_limit(requested: Option<i64>) -> i64 {
    requested
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_NEAR_LIMIT)
        .min(MAX_NEAR_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(-79.38, 43.65).unwrap();
        assert_eq!(p.distance_meters(&p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let d = a.distance_meters(&b);
        assert!((d - 111_317.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn parse_rejects_garbage_and_out_of_range() {
        assert!(GeoPoint::parse("abc", "10").is_err());
        assert!(GeoPoint::parse("10", "").is_err());
        assert!(GeoPoint::parse("NaN", "10").is_err());
        assert!(GeoPoint::parse("181", "10").is_err());
        assert!(GeoPoint::parse("10", "-91").is_err());

        let p = GeoPoint::parse(" -79.5 ", "43.7").unwrap();
        assert_eq!(p, GeoPoint { lng: -79.5, lat: 43.7 });
    }

    #[test]
    fn near_limit_defaults_and_caps() {
        assert_eq!(near_limit(None), DEFAULT_NEAR_LIMIT);
        assert_eq!(near_limit(Some(0)), DEFAULT_NEAR_LIMIT);
        assert_eq!(near_limit(Some(3)), 3);
        assert_eq!(near_limit(Some(5_000)), MAX_NEAR_LIMIT);
    }
}

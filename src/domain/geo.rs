use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius (IUGG), in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle distance to `other` using the haversine formula.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Rounds a distance for display, to the metre.
pub fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

/// A cached geocoding result, keyed by the exact address text.
///
/// `coordinates` is `None` when the provider answered but had no match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub fetched_at: DateTime<Utc>,
}

impl GeoPoint {
    pub fn new(address: impl Into<String>, coordinates: Option<Coordinates>) -> Self {
        Self {
            address: address.into(),
            coordinates,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_fresh(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// Failure talking to the geocoding provider. A missing match is not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("geocoder did not answer within {0} ms")]
    Timeout(u64),
    #[error("geocoder request failed: {0}")]
    Http(String),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("unexpected geocoder payload: {0}")]
    Payload(String),
    #[error("no geocoding provider configured")]
    Unconfigured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let point = Coordinates::new(37.6173, 55.7558);
        assert_eq!(point.distance_km(&point), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(37.60, 55.74);
        let b = Coordinates::new(37.62, 55.75);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_short_hop_in_moscow() {
        let order = Coordinates::new(37.60, 55.74);
        let restaurant = Coordinates::new(37.62, 55.75);
        let km = order.distance_km(&restaurant);
        assert!(km > 1.6 && km < 1.75, "got {km}");
    }

    #[test]
    fn test_distance_moscow_to_saint_petersburg() {
        let moscow = Coordinates::new(37.6173, 55.7558);
        let spb = Coordinates::new(30.3351, 59.9343);
        let km = moscow.distance_km(&spb);
        assert!((km - 634.0).abs() < 5.0, "got {km}");
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(1.23456), 1.235);
        assert_eq!(round_km(0.0004), 0.0);
    }

    #[test]
    fn test_geo_point_freshness() {
        let mut point = GeoPoint::new("Moscow", None);
        let now = Utc::now();
        assert!(point.is_fresh(chrono::Duration::days(1), now));

        point.fetched_at = now - chrono::Duration::days(2);
        assert!(!point.is_fresh(chrono::Duration::days(1), now));
    }
}

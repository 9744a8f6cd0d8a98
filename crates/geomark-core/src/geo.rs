// crates/geomark-core/src/geo.rs

//! # Geographic primitives
//!
//! Plain value types shared by every component: a validated [`Coordinate`],
//! the camera state ([`Viewport`]) and the region used to bias search
//! suggestions ([`SearchBias`]).

use crate::error::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Highest zoom level the render surface accepts.
pub const MAX_ZOOM: u8 = 22;

/// A WGS84 position. Latitude in `[-90, 90]`, longitude in `[-180, 180]`.
///
/// The fields are private so an out-of-range value can never be observed;
/// deserialisation goes through the same check as [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = MapError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Validates and builds a coordinate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use geomark_core::Coordinate;
    ///
    /// let boston = Coordinate::new(42.36, -71.06).unwrap();
    /// assert_eq!(boston.latitude(), 42.36);
    /// assert!(Coordinate::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if lat_ok && lon_ok {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(MapError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// For compile-time constants that are known to be in range.
    pub(crate) const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Displayed center point and zoom level of the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
}

/// Region that search suggestions are biased toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBias {
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl SearchBias {
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.center.distance_to(point) <= self.radius_meters
    }

    /// Bounding box of the bias circle as `(west, south, east, north)`.
    ///
    /// Clamped to valid ranges; does not wrap across the antimeridian.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let dlat = (self.radius_meters / EARTH_RADIUS_METERS).to_degrees();
        let cos_lat = self.center.latitude.to_radians().cos().max(1e-6);
        let dlon = (dlat / cos_lat).min(180.0);

        let lat = self.center.latitude;
        let lon = self.center.longitude;
        (
            (lon - dlon).max(-180.0),
            (lat - dlat).max(-90.0),
            (lon + dlon).min(180.0),
            (lat + dlat).min(90.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.0001, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn deserialisation_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude":42.0,"longitude":-71.0}"#).unwrap();
        assert_eq!(ok.longitude(), -71.0);
        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude":120.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn boston_to_new_york_is_about_300_km() {
        let boston = Coordinate::new(42.3601, -71.0589).unwrap();
        let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
        let km = boston.distance_to(&nyc) / 1000.0;
        assert!((300.0..310.0).contains(&km), "got {km}");
    }

    #[test]
    fn bias_box_encloses_center() {
        let bias = SearchBias {
            center: Coordinate::new(42.36, -71.06).unwrap(),
            radius_meters: 200_000.0,
        };
        let (w, s, e, n) = bias.bounding_box();
        assert!(w < -71.06 && e > -71.06);
        assert!(s < 42.36 && n > 42.36);
        assert!(bias.contains(&bias.center));
    }
}

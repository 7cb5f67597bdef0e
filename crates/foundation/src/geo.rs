use serde::{Deserialize, Serialize};

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// Geographic position in degrees.
///
/// GeoJSON stores positions as `[lng, lat]`; keep the named fields and convert
/// at the edges with [`LatLng::from_lng_lat`] / [`LatLng::to_lng_lat`] so the
/// two orders never get mixed up.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Unweighted mean of every coordinate pair of a feature collection.
pub type Centroid = LatLng;

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Pulls the position into the valid geographic range.
    pub fn clamped(self) -> Self {
        Self {
            lat: clamp_lat(self.lat),
            lng: clamp_lng(self.lng),
        }
    }
}

pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(MIN_LAT, MAX_LAT)
}

pub fn clamp_lng(lng: f64) -> f64 {
    lng.clamp(MIN_LNG, MAX_LNG)
}

pub fn is_valid_lat(lat: f64) -> bool {
    lat.is_finite() && (MIN_LAT..=MAX_LAT).contains(&lat)
}

pub fn is_valid_lng(lng: f64) -> bool {
    lng.is_finite() && (MIN_LNG..=MAX_LNG).contains(&lng)
}

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers (IUGG).
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Great-circle distance to `other` via the Haversine formula,
    /// rounded to 2 decimal places.
    #[must_use]
    pub fn distance_km(self, other: Location) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        (EARTH_RADIUS_KM * c * 100.0).round() / 100.0
    }
}

/// A candidate business returned by the discovery provider.
///
/// Identity is the provider-issued `place_id`; every other field is
/// read-only display/ranking data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub location: Location,
    /// Aggregate rating in [0, 5], when the provider reports one.
    pub rating: Option<f64>,
    pub total_reviews: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<String>>,
    #[serde(default)]
    pub place_types: Vec<String>,
}

/// A single customer review collected for an agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub author: String,
    /// Star rating in [1, 5].
    pub rating: u8,
    pub text: String,
    /// Unix epoch seconds.
    pub time: i64,
    pub relative_time_description: String,
}

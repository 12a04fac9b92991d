use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A GPS trace stored on the OSM server, as listed under `user/gpx_files`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Trace {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `private`, `public`, `trackable` or `identifiable`.
    pub visibility: String,
    pub lat_lng: LatLng,
    pub date: DateTime<Utc>,
    pub user_name: String,
    pub tags: Vec<String>,
}

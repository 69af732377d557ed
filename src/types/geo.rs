//! Geographic Primitives
//!
//! One structured coordinate representation shared by every entity that
//! carries a location. Older clients still send the legacy `"lat,lng"`
//! string encoding, which is accepted at the API boundary only.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parse the legacy `"lat,lng"` string encoding.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut parts = s.splitn(2, ',');
        let lat = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("invalid coordinates: {}", s))?;
        let lng = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("invalid coordinates: {}", s))?;

        let lat: f64 = lat
            .parse()
            .map_err(|_| format!("invalid latitude: {}", lat))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| format!("invalid longitude: {}", lng))?;

        Ok(Self { lat, lng })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Location input accepted by create/update endpoints.
///
/// Either a structured point or the legacy string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Point(Coordinates),
    Encoded(String),
}

impl LocationInput {
    /// Normalize to structured coordinates.
    pub fn into_coordinates(self) -> Result<Coordinates, String> {
        match self {
            LocationInput::Point(point) => Ok(point),
            LocationInput::Encoded(s) => Coordinates::parse(&s),
        }
    }
}

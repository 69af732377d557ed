//! Wilaya Types
//!
//! Wilayas are the Algerian administrative regions the platform groups
//! users and hospitals by. Each wilaya embeds its blood-center list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::{Coordinates, LocationInput};

/// A blood collection center, embedded in its wilaya.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodCenter {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub location: Option<Coordinates>,
}

/// An administrative region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wilaya {
    /// Official wilaya number, unique
    pub code: u32,
    pub name: String,
    pub location: Coordinates,
    pub centers: Vec<BloodCenter>,
    pub created_at: DateTime<Utc>,
}

impl Wilaya {
    pub fn new(code: u32, name: String, location: Coordinates) -> Self {
        Self {
            code,
            name,
            location,
            centers: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// POST /wilaya
#[derive(Debug, Deserialize)]
pub struct CreateWilayaRequest {
    pub code: u32,
    pub name: String,
    pub location: LocationInput,
}

/// PUT /wilaya/:code
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWilayaRequest {
    pub name: Option<String>,
    pub location: Option<LocationInput>,
}

/// POST /wilaya/:code/centers
#[derive(Debug, Deserialize)]
pub struct AddCenterRequest {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub location: Option<LocationInput>,
}

/// Wilaya as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct WilayaResponse {
    pub code: u32,
    pub name: String,
    pub location: Coordinates,
    pub centers: Vec<BloodCenter>,
    pub created_at: DateTime<Utc>,
}

impl From<&Wilaya> for WilayaResponse {
    fn from(wilaya: &Wilaya) -> Self {
        Self {
            code: wilaya.code,
            name: wilaya.name.clone(),
            location: wilaya.location,
            centers: wilaya.centers.clone(),
            created_at: wilaya.created_at,
        }
    }
}

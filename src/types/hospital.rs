//! Hospital Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::{Coordinates, LocationInput};

/// A hospital able to receive donations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub location: Coordinates,
    pub wilaya_code: u32,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Hospital {
    pub fn new(name: String, location: Coordinates, wilaya_code: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            location,
            wilaya_code,
            phone: None,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// POST /hospital
#[derive(Debug, Deserialize)]
pub struct CreateHospitalRequest {
    pub name: String,
    pub location: LocationInput,
    pub wilaya_code: u32,
    pub phone: Option<String>,
}

/// PUT /hospital/:id
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHospitalRequest {
    pub name: Option<String>,
    pub location: Option<LocationInput>,
    pub wilaya_code: Option<u32>,
    pub phone: Option<String>,
}

/// Hospital as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct HospitalResponse {
    pub id: Uuid,
    pub name: String,
    pub location: Coordinates,
    pub wilaya_code: u32,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Hospital> for HospitalResponse {
    fn from(hospital: &Hospital) -> Self {
        Self {
            id: hospital.id,
            name: hospital.name.clone(),
            location: hospital.location,
            wilaya_code: hospital.wilaya_code,
            phone: hospital.phone.clone(),
            created_at: hospital.created_at,
        }
    }
}

/// GET /hospital/nearest response entry
#[derive(Debug, Clone, Serialize)]
pub struct NearestHospital {
    #[serde(flatten)]
    pub hospital: HospitalResponse,
    pub distance_km: f64,
}

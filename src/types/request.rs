//! Donation Request Types
//!
//! A request for blood published by a user on behalf of a patient. Donors
//! respond against the request; responses live inside the request document
//! and the latest response per donor wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blood::NeededBloodType;
use super::geo::{Coordinates, LocationInput};

/// Urgency of a donation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for UrgencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("unknown urgency: {}", s)),
        }
    }
}

/// Status of a donation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Active,
    Fulfilled,
    Expired,
    Cancelled,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Fulfilled => "fulfilled",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "fulfilled" => Ok(Self::Fulfilled),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// A donor's answer to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Interested,
    Confirmed,
    Declined,
}

/// A donor's recorded response, embedded in the request document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorResponse {
    pub donor_id: Uuid,
    pub status: ResponseStatus,
    pub responded_at: DateTime<Utc>,
}

/// A published request for blood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub needed_blood_type: NeededBloodType,
    pub location: Coordinates,
    pub wilaya_code: Option<u32>,
    pub urgency: UrgencyLevel,
    pub status: RequestStatus,
    /// Donor responses, latest per donor
    pub responses: Vec<DonorResponse>,
    pub expires_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonationRequest {
    pub fn new(
        requester_id: Uuid,
        patient_name: String,
        needed_blood_type: NeededBloodType,
        location: Coordinates,
        urgency: UrgencyLevel,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requester_id,
            patient_name,
            needed_blood_type,
            location,
            wilaya_code: None,
            urgency,
            status: RequestStatus::Active,
            responses: Vec::new(),
            expires_at: None,
            fulfilled_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a donor's response. A donor who already responded gets their
    /// entry replaced, last write wins.
    pub fn record_response(&mut self, donor_id: Uuid, status: ResponseStatus) {
        self.responses.retain(|r| r.donor_id != donor_id);
        self.responses.push(DonorResponse {
            donor_id,
            status,
            responded_at: Utc::now(),
        });
        self.touch();
    }

    /// Mark as fulfilled
    pub fn mark_fulfilled(&mut self) {
        self.status = RequestStatus::Fulfilled;
        if self.fulfilled_at.is_none() {
            self.fulfilled_at = Some(Utc::now());
        }
        self.touch();
    }

    /// Mark as cancelled
    pub fn mark_cancelled(&mut self) {
        self.status = RequestStatus::Cancelled;
        if self.cancelled_at.is_none() {
            self.cancelled_at = Some(Utc::now());
        }
        self.touch();
    }

    /// Mark as expired
    pub fn mark_expired(&mut self) {
        self.status = RequestStatus::Expired;
        self.touch();
    }

    pub fn is_active(&self) -> bool {
        self.status == RequestStatus::Active
    }

    /// An active request past its deadline is expired in all but status.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.expires_at.map(|at| at < now).unwrap_or(false)
    }

    /// Update timestamp
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// POST /donation-request
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub patient_name: String,
    pub needed_blood_type: NeededBloodType,
    pub location: LocationInput,
    pub wilaya_code: Option<u32>,
    pub urgency: Option<UrgencyLevel>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /donation-request/:id/respond
#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub status: ResponseStatus,
}

/// Donation request as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct RequestResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub patient_name: String,
    pub needed_blood_type: NeededBloodType,
    pub location: Coordinates,
    pub wilaya_code: Option<u32>,
    pub urgency: UrgencyLevel,
    pub status: RequestStatus,
    pub responses: Vec<DonorResponse>,
    pub expires_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DonationRequest> for RequestResponse {
    fn from(request: &DonationRequest) -> Self {
        Self {
            id: request.id,
            requester_id: request.requester_id,
            patient_name: request.patient_name.clone(),
            needed_blood_type: request.needed_blood_type,
            location: request.location,
            wilaya_code: request.wilaya_code,
            urgency: request.urgency,
            status: request.status,
            responses: request.responses.clone(),
            expires_at: request.expires_at,
            fulfilled_at: request.fulfilled_at,
            cancelled_at: request.cancelled_at,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::blood::BloodType;

    fn test_request() -> DonationRequest {
        DonationRequest::new(
            Uuid::new_v4(),
            "patient".to_string(),
            NeededBloodType::Specific(BloodType::ONeg),
            Coordinates::new(36.7538, 3.0588),
            UrgencyLevel::High,
        )
    }

    #[test]
    fn test_last_response_per_donor_wins() {
        let mut request = test_request();
        let donor = Uuid::new_v4();

        request.record_response(donor, ResponseStatus::Interested);
        request.record_response(donor, ResponseStatus::Declined);

        assert_eq!(request.responses.len(), 1);
        assert_eq!(request.responses[0].status, ResponseStatus::Declined);
    }

    #[test]
    fn test_responses_from_distinct_donors_accumulate() {
        let mut request = test_request();

        request.record_response(Uuid::new_v4(), ResponseStatus::Interested);
        request.record_response(Uuid::new_v4(), ResponseStatus::Confirmed);

        assert_eq!(request.responses.len(), 2);
    }

    #[test]
    fn test_fulfilled_timestamp_written_once() {
        let mut request = test_request();

        request.mark_fulfilled();
        let first = request.fulfilled_at.unwrap();
        request.mark_fulfilled();

        assert_eq!(request.fulfilled_at.unwrap(), first);
        assert_eq!(request.status, RequestStatus::Fulfilled);
    }

    #[test]
    fn test_deadline_check_only_bites_active_requests() {
        let mut request = test_request();
        let now = Utc::now();

        assert!(!request.is_past_deadline(now));

        request.expires_at = Some(now - chrono::Duration::hours(1));
        assert!(request.is_past_deadline(now));

        request.mark_cancelled();
        assert!(!request.is_past_deadline(now));
    }
}

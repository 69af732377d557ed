//! Donation Types
//!
//! A donation moves through requested → scheduled → completed, with
//! cancellation possible until it reaches a terminal state. Each transition
//! stamps its own timestamp; the completion timestamp is written once and
//! never overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a donation through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Created, waiting to be scheduled
    Requested,
    /// Appointment agreed with the hospital
    Scheduled,
    /// Blood collected
    Completed,
    /// Abandoned by either party
    Cancelled,
}

impl Default for DonationStatus {
    fn default() -> Self {
        Self::Requested
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// A single donation from a donor, optionally tied to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    /// Recipient user, when the donation targets a specific person
    pub recipient_id: Option<Uuid>,
    pub hospital_id: Uuid,
    /// Originating donation request, if any
    pub request_id: Option<Uuid>,
    pub status: DonationStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    pub fn new(donor_id: Uuid, hospital_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            donor_id,
            recipient_id: None,
            hospital_id,
            request_id: None,
            status: DonationStatus::Requested,
            scheduled_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as scheduled
    pub fn mark_scheduled(&mut self, scheduled_at: DateTime<Utc>) {
        self.status = DonationStatus::Scheduled;
        self.scheduled_at = Some(scheduled_at);
        self.touch();
    }

    /// Mark as completed. The completion timestamp is written only the
    /// first time; repeating the transition leaves it untouched.
    pub fn mark_completed(&mut self) {
        self.status = DonationStatus::Completed;
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        self.touch();
    }

    /// Mark as cancelled
    pub fn mark_cancelled(&mut self) {
        self.status = DonationStatus::Cancelled;
        if self.cancelled_at.is_none() {
            self.cancelled_at = Some(Utc::now());
        }
        self.touch();
    }

    pub fn can_schedule(&self) -> bool {
        self.status == DonationStatus::Requested
    }

    pub fn can_complete(&self) -> bool {
        matches!(
            self.status,
            DonationStatus::Requested | DonationStatus::Scheduled | DonationStatus::Completed
        )
    }

    pub fn can_cancel(&self) -> bool {
        !matches!(
            self.status,
            DonationStatus::Completed | DonationStatus::Cancelled
        )
    }

    /// Update timestamp
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// POST /donation
#[derive(Debug, Deserialize)]
pub struct CreateDonationRequest {
    pub hospital_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
}

/// POST /donation/:id/schedule
#[derive(Debug, Deserialize)]
pub struct ScheduleDonationRequest {
    pub scheduled_at: DateTime<Utc>,
}

/// Donation as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct DonationResponse {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub hospital_id: Uuid,
    pub request_id: Option<Uuid>,
    pub status: DonationStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Donation> for DonationResponse {
    fn from(donation: &Donation) -> Self {
        Self {
            id: donation.id,
            donor_id: donation.donor_id,
            recipient_id: donation.recipient_id,
            hospital_id: donation.hospital_id,
            request_id: donation.request_id,
            status: donation.status,
            scheduled_at: donation.scheduled_at,
            completed_at: donation.completed_at,
            cancelled_at: donation.cancelled_at,
            created_at: donation.created_at,
            updated_at: donation.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_lifecycle() {
        let mut donation = Donation::new(Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(donation.status, DonationStatus::Requested);
        assert!(donation.can_schedule());
        assert!(donation.can_cancel());

        donation.mark_scheduled(Utc::now());
        assert_eq!(donation.status, DonationStatus::Scheduled);
        assert!(!donation.can_schedule());
        assert!(donation.scheduled_at.is_some());

        donation.mark_completed();
        assert_eq!(donation.status, DonationStatus::Completed);
        assert!(donation.completed_at.is_some());
        assert!(!donation.can_cancel());
    }

    #[test]
    fn test_completion_timestamp_written_once() {
        let mut donation = Donation::new(Uuid::new_v4(), Uuid::new_v4());

        donation.mark_completed();
        let first = donation.completed_at.unwrap();

        donation.mark_completed();
        assert_eq!(donation.completed_at.unwrap(), first);
    }

    #[test]
    fn test_cancel_blocks_from_terminal_states() {
        let mut donation = Donation::new(Uuid::new_v4(), Uuid::new_v4());
        donation.mark_cancelled();
        assert!(!donation.can_cancel());
        assert!(!donation.can_complete());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DonationStatus::Requested.to_string(), "requested");
        assert_eq!(DonationStatus::Completed.to_string(), "completed");
        assert_eq!("scheduled".parse::<DonationStatus>(), Ok(DonationStatus::Scheduled));
        assert!("done".parse::<DonationStatus>().is_err());
    }
}

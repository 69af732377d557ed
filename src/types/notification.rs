//! Notification Types
//!
//! Notifications are written best-effort as a side effect of workflow
//! transitions. A failed write is logged by the caller and never unwinds
//! the transition that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DonationRequested,
    DonationScheduled,
    DonationCompleted,
    DonationCancelled,
    RequestResponse,
    RequestFulfilled,
    RequestCancelled,
    System,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DonationRequested => "donation_requested",
            Self::DonationScheduled => "donation_scheduled",
            Self::DonationCompleted => "donation_completed",
            Self::DonationCancelled => "donation_cancelled",
            Self::RequestResponse => "request_response",
            Self::RequestFulfilled => "request_fulfilled",
            Self::RequestCancelled => "request_cancelled",
            Self::System => "system",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donation_requested" => Ok(Self::DonationRequested),
            "donation_scheduled" => Ok(Self::DonationScheduled),
            "donation_completed" => Ok(Self::DonationCompleted),
            "donation_cancelled" => Ok(Self::DonationCancelled),
            "request_response" => Ok(Self::RequestResponse),
            "request_fulfilled" => Ok(Self::RequestFulfilled),
            "request_cancelled" => Ok(Self::RequestCancelled),
            "system" => Ok(Self::System),
            _ => Err(format!("unknown notification type: {}", s)),
        }
    }
}

/// Delivery priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// A notification addressed to one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: Uuid,
        notification_type: NotificationType,
        title: String,
        body: String,
        priority: Priority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            notification_type,
            title,
            body,
            priority,
            read: false,
            read_at: None,
            archived: false,
            created_at: Utc::now(),
        }
    }

    /// Mark as read. The read timestamp is written only the first time.
    pub fn mark_read(&mut self) {
        self.read = true;
        if self.read_at.is_none() {
            self.read_at = Some(Utc::now());
        }
    }

    /// Mark as archived
    pub fn mark_archived(&mut self) {
        self.archived = true;
    }
}

/// Notification as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            notification_type: notification.notification_type,
            title: notification.title.clone(),
            body: notification.body.clone(),
            priority: notification.priority,
            read: notification.read,
            read_at: notification.read_at,
            archived: notification.archived,
            created_at: notification.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timestamp_written_once() {
        let mut notification = Notification::new(
            Uuid::new_v4(),
            NotificationType::DonationScheduled,
            "title".to_string(),
            "body".to_string(),
            Priority::Normal,
        );

        assert!(!notification.read);
        notification.mark_read();
        let first = notification.read_at.unwrap();

        notification.mark_read();
        assert_eq!(notification.read_at.unwrap(), first);
    }

    #[test]
    fn test_type_round_trip() {
        let all = [
            NotificationType::DonationRequested,
            NotificationType::DonationScheduled,
            NotificationType::DonationCompleted,
            NotificationType::DonationCancelled,
            NotificationType::RequestResponse,
            NotificationType::RequestFulfilled,
            NotificationType::RequestCancelled,
            NotificationType::System,
        ];
        for notification_type in all {
            assert_eq!(
                notification_type.to_string().parse::<NotificationType>(),
                Ok(notification_type)
            );
        }
    }
}

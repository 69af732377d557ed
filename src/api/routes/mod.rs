//! Route Handlers
//!
//! One module per resource. Every handler follows the same sequence:
//! parse request, validate, query or mutate the store, shape the JSON
//! response.

pub mod admin;
pub mod auth;
pub mod donations;
pub mod hospitals;
pub mod map;
pub mod notifications;
pub mod requests;
pub mod stats;
pub mod users;
pub mod wilayas;

use uuid::Uuid;

use crate::storage::{NotificationStore, SqliteStore};
use crate::types::notification::{Notification, NotificationType, Priority};

/// Write a notification for `recipient`, best-effort.
///
/// A failed write is logged and never unwinds the transition that
/// triggered it.
pub(crate) async fn notify_best_effort(
    store: &SqliteStore,
    recipient: Uuid,
    notification_type: NotificationType,
    title: &str,
    body: &str,
    priority: Priority,
) {
    let notification = Notification::new(
        recipient,
        notification_type,
        title.to_string(),
        body.to_string(),
        priority,
    );

    if let Err(e) = store.insert_notification(&notification).await {
        tracing::warn!(
            target: "hayat::notify",
            recipient = %recipient,
            "failed to create notification: {}",
            e
        );
    }
}

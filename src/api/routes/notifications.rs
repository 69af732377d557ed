//! Notification Routes
//!
//! - GET  /notification - Caller's notifications, unread first
//! - GET  /notification/unread-count - Unread badge count
//! - POST /notification/:id/read - Mark read (timestamp written once)
//! - POST /notification/:id/archive - Hide from listings

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::storage::NotificationStore;
use crate::types::notification::{Notification, NotificationResponse};
use crate::types::pagination::{PageParams, Paginated};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/", get(handle_list_notifications))
        .route("/unread-count", get(handle_unread_count))
        .route("/:id/read", post(handle_mark_read))
        .route("/:id/archive", post(handle_mark_archived))
}

/// GET /notification
async fn handle_list_notifications(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<NotificationResponse>>> {
    let recipient = auth.id();

    let total = state.store.count_notifications(recipient).await?;
    let notifications = state
        .store
        .list_notifications(recipient, params.offset(), params.limit())
        .await?;

    let data = notifications.iter().map(NotificationResponse::from).collect();
    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// GET /notification/unread-count
async fn handle_unread_count(
    auth: AuthUser,
    State(state): State<SharedAppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let unread = state.store.unread_count(auth.id()).await?;
    Ok(Json(serde_json::json!({ "unread": unread })))
}

/// POST /notification/:id/read
async fn handle_mark_read(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let mut notification = fetch_own_notification(&auth, &state, id).await?;

    notification.mark_read();
    state.store.update_notification(&notification).await?;

    Ok(Json(NotificationResponse::from(&notification)))
}

/// POST /notification/:id/archive
async fn handle_mark_archived(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let mut notification = fetch_own_notification(&auth, &state, id).await?;

    notification.mark_archived();
    state.store.update_notification(&notification).await?;

    Ok(Json(NotificationResponse::from(&notification)))
}

/// Another account's notification reads as missing, not forbidden.
async fn fetch_own_notification(
    auth: &AuthUser,
    state: &SharedAppState,
    id: Uuid,
) -> ApiResult<Notification> {
    state
        .store
        .get_notification(id)
        .await?
        .filter(|n| n.recipient_id == auth.id())
        .ok_or_else(|| ApiError::NotFound(format!("notification {}", id)))
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing;
    use crate::storage::{HospitalStore, UserStore};
    use crate::types::geo::Coordinates;
    use crate::types::hospital::Hospital;
    use axum::http::StatusCode;

    async fn register_and_login(app: &axum::Router, username: &str) -> String {
        let body = serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "full_name": username
        });
        testing::send(
            app,
            testing::json_request("POST", "/auth/register", None, body),
        )
        .await;

        let response = testing::send(
            app,
            testing::json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"identifier": username, "password": "password123"}),
            ),
        )
        .await;
        testing::body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_transition_notifies_counterparty() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());

        let donor_token = register_and_login(&app, "donor").await;
        let recipient_token = register_and_login(&app, "recipient").await;
        let recipient = state
            .store
            .get_user_by_username("recipient")
            .await
            .unwrap()
            .unwrap();

        let hospital = Hospital::new(
            "CHU Alger".to_string(),
            Coordinates::new(36.7538, 3.0588),
            16,
        );
        state.store.insert_hospital(&hospital).await.unwrap();

        // Donation targeting the recipient creates a notification for them
        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                "/donation",
                Some(&donor_token),
                serde_json::json!({
                    "hospital_id": hospital.id.to_string(),
                    "recipient_id": recipient.id.to_string()
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = testing::send(
            &app,
            testing::get_request("/notification/unread-count", Some(&recipient_token)),
        )
        .await;
        let body = testing::body_json(response).await;
        assert_eq!(body["unread"], 1);

        let response = testing::send(
            &app,
            testing::get_request("/notification", Some(&recipient_token)),
        )
        .await;
        let body = testing::body_json(response).await;
        assert_eq!(body["data"][0]["notification_type"], "donation_requested");
        assert_eq!(body["pagination"]["totalItems"], 1);
    }

    #[tokio::test]
    async fn test_read_and_archive_flow() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());

        let token = register_and_login(&app, "amine").await;
        let user = state
            .store
            .get_user_by_username("amine")
            .await
            .unwrap()
            .unwrap();

        use crate::storage::NotificationStore;
        use crate::types::notification::{Notification, NotificationType, Priority};
        let notification = Notification::new(
            user.id,
            NotificationType::System,
            "hello".to_string(),
            "welcome".to_string(),
            Priority::Low,
        );
        state.store.insert_notification(&notification).await.unwrap();

        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                &format!("/notification/{}/read", notification.id),
                Some(&token),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let read_at = testing::body_json(response).await["read_at"]
            .as_str()
            .unwrap()
            .to_string();

        // Marking read again keeps the original timestamp
        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                &format!("/notification/{}/read", notification.id),
                Some(&token),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(
            testing::body_json(response).await["read_at"].as_str().unwrap(),
            read_at
        );

        // Archive hides it from the listing
        testing::send(
            &app,
            testing::json_request(
                "POST",
                &format!("/notification/{}/archive", notification.id),
                Some(&token),
                serde_json::json!({}),
            ),
        )
        .await;
        let response =
            testing::send(&app, testing::get_request("/notification", Some(&token))).await;
        let body = testing::body_json(response).await;
        assert_eq!(body["pagination"]["totalItems"], 0);
    }

    #[tokio::test]
    async fn test_cannot_touch_another_users_notification() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());

        let _owner_token = register_and_login(&app, "owner").await;
        let other_token = register_and_login(&app, "other").await;
        let owner = state
            .store
            .get_user_by_username("owner")
            .await
            .unwrap()
            .unwrap();

        use crate::storage::NotificationStore;
        use crate::types::notification::{Notification, NotificationType, Priority};
        let notification = Notification::new(
            owner.id,
            NotificationType::System,
            "private".to_string(),
            "body".to_string(),
            Priority::Normal,
        );
        state.store.insert_notification(&notification).await.unwrap();

        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                &format!("/notification/{}/read", notification.id),
                Some(&other_token),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

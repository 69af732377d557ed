//! Map Routes
//!
//! Geo-point feeds for the map view.
//!
//! - GET /map/hospitals - Every hospital as a point
//! - GET /map/requests - Active donation requests as points

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::api::server::SharedAppState;
use crate::storage::{HospitalStore, RequestStore};
use crate::types::blood::NeededBloodType;
use crate::types::request::UrgencyLevel;

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/hospitals", get(handle_hospital_points))
        .route("/requests", get(handle_request_points))
}

/// A hospital pin.
#[derive(Debug, Serialize)]
struct HospitalPoint {
    id: Uuid,
    name: String,
    lat: f64,
    lng: f64,
    wilaya_code: u32,
}

/// An active request pin.
#[derive(Debug, Serialize)]
struct RequestPoint {
    id: Uuid,
    needed_blood_type: NeededBloodType,
    urgency: UrgencyLevel,
    lat: f64,
    lng: f64,
}

/// GET /map/hospitals
async fn handle_hospital_points(
    State(state): State<SharedAppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let points: Vec<HospitalPoint> = state
        .store
        .all_hospitals()
        .await?
        .into_iter()
        .map(|hospital| HospitalPoint {
            id: hospital.id,
            name: hospital.name,
            lat: hospital.location.lat,
            lng: hospital.location.lng,
            wilaya_code: hospital.wilaya_code,
        })
        .collect();

    Ok(Json(serde_json::json!({ "data": points })))
}

/// GET /map/requests
async fn handle_request_points(
    State(state): State<SharedAppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let now = Utc::now();

    // Requests past their deadline are dropped from the feed; their status
    // flips lazily on the next direct read.
    let points: Vec<RequestPoint> = state
        .store
        .list_active_requests()
        .await?
        .into_iter()
        .filter(|request| !request.is_past_deadline(now))
        .map(|request| RequestPoint {
            id: request.id,
            needed_blood_type: request.needed_blood_type,
            urgency: request.urgency,
            lat: request.location.lat,
            lng: request.location.lng,
        })
        .collect();

    Ok(Json(serde_json::json!({ "data": points })))
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing;
    use crate::storage::{HospitalStore, RequestStore};
    use crate::types::blood::NeededBloodType;
    use crate::types::geo::Coordinates;
    use crate::types::hospital::Hospital;
    use crate::types::request::{DonationRequest, UrgencyLevel};
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_request_feed_shows_active_only() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());

        let active = DonationRequest::new(
            Uuid::new_v4(),
            "patient".to_string(),
            NeededBloodType::Any,
            Coordinates::new(36.75, 3.05),
            UrgencyLevel::Critical,
        );
        let mut cancelled = DonationRequest::new(
            Uuid::new_v4(),
            "other".to_string(),
            NeededBloodType::Any,
            Coordinates::new(35.69, -0.64),
            UrgencyLevel::Low,
        );
        cancelled.mark_cancelled();

        state.store.insert_request(&active).await.unwrap();
        state.store.insert_request(&cancelled).await.unwrap();

        let response = testing::send(&app, testing::get_request("/map/requests", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = testing::body_json(response).await;
        let points = body["data"].as_array().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["urgency"], "critical");
        assert_eq!(points[0]["lat"], 36.75);
    }

    #[tokio::test]
    async fn test_hospital_feed() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());

        let hospital = Hospital::new(
            "CHU Oran".to_string(),
            Coordinates::new(35.6969, -0.6492),
            31,
        );
        state.store.insert_hospital(&hospital).await.unwrap();

        let response = testing::send(&app, testing::get_request("/map/hospitals", None)).await;
        let body = testing::body_json(response).await;
        assert_eq!(body["data"][0]["name"], "CHU Oran");
        assert_eq!(body["data"][0]["wilaya_code"], 31);
    }
}

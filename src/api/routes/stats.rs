//! Statistics Routes
//!
//! - GET /stats - Aggregate platform counters
//!
//! Everything is recomputed from the store on each request; there is no
//! caching layer.

use axum::{extract::State, routing::get, Json, Router};

use crate::api::error::ApiResult;
use crate::api::server::SharedAppState;
use crate::storage::{
    DonationFilter, DonationStore, HospitalStore, RequestFilter, RequestStore, UserStore,
    WilayaStore,
};

pub fn router() -> Router<SharedAppState> {
    Router::new().route("/", get(handle_stats))
}

/// GET /stats
async fn handle_stats(State(state): State<SharedAppState>) -> ApiResult<Json<serde_json::Value>> {
    let total_users = state.store.count_users().await?;
    let total_donors = state.store.count_donors().await?;
    let donors_by_blood_type = state.store.donors_by_blood_type().await?;

    let total_donations = state.store.count_donations(DonationFilter::default()).await?;
    let donations_by_status = state.store.donations_by_status().await?;

    let total_requests = state.store.count_requests(RequestFilter::default()).await?;
    let requests_by_status = state.store.requests_by_status().await?;
    let requests_by_urgency = state.store.requests_by_urgency().await?;

    let hospitals = state.store.count_hospitals().await?;
    let wilayas = state.store.count_wilayas().await?;

    Ok(Json(serde_json::json!({
        "users": {
            "total": total_users,
            "donors": total_donors,
            "donorsByBloodType": donors_by_blood_type
        },
        "donations": {
            "total": total_donations,
            "byStatus": donations_by_status
        },
        "requests": {
            "total": total_requests,
            "byStatus": requests_by_status,
            "byUrgency": requests_by_urgency
        },
        "hospitals": hospitals,
        "wilayas": wilayas
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_stats_reflect_registrations() {
        let app = testing::app();

        for (username, donor) in [("a", true), ("b", true), ("c", false)] {
            let body = serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
                "full_name": username,
                "blood_type": "O+",
                "is_donor": donor
            });
            let response = testing::send(
                &app,
                testing::json_request("POST", "/auth/register", None, body),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = testing::send(&app, testing::get_request("/stats", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = testing::body_json(response).await;
        assert_eq!(body["users"]["total"], 3);
        assert_eq!(body["users"]["donors"], 2);
        assert_eq!(body["users"]["donorsByBloodType"]["O+"], 2);
        assert_eq!(body["donations"]["total"], 0);
        assert_eq!(body["hospitals"], 0);
    }
}

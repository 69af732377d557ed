//! Donation Request Routes
//!
//! - POST /donation-request - Publish a request
//! - GET  /donation-request - Paginated listing with status/urgency filters
//! - GET  /donation-request/:id - Fetch
//! - POST /donation-request/:id/respond - Record a donor's answer
//! - POST /donation-request/:id/fulfill - → fulfilled (requester or admin)
//! - POST /donation-request/:id/cancel - → cancelled (requester or admin)
//! - GET  /donation-request/:id/matches - Compatible donors ranked by distance
//!
//! There is no background sweep; an active request past its deadline is
//! expired lazily when it is next read.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::notify_best_effort;
use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::matching::{compatible_donors, rank_donors};
use crate::storage::{RequestFilter, RequestStore, UserStore};
use crate::types::notification::{NotificationType, Priority};
use crate::types::pagination::{PageParams, Paginated};
use crate::types::request::{
    CreateRequestBody, DonationRequest, RequestResponse, RequestStatus, RespondBody,
    UrgencyLevel,
};
use crate::types::user::Account;

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/", get(handle_list_requests).post(handle_create_request))
        .route("/:id", get(handle_get_request))
        .route("/:id/respond", post(handle_respond))
        .route("/:id/fulfill", post(handle_fulfill))
        .route("/:id/cancel", post(handle_cancel))
        .route("/:id/matches", get(handle_matches))
}

/// POST /donation-request
async fn handle_create_request(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Json(req): Json<CreateRequestBody>,
) -> ApiResult<impl IntoResponse> {
    if req.patient_name.trim().is_empty() {
        return Err(ApiError::Validation("patient_name is required".to_string()));
    }

    let location = req.location.into_coordinates().map_err(ApiError::Validation)?;

    let mut request = DonationRequest::new(
        auth.id(),
        req.patient_name.trim().to_string(),
        req.needed_blood_type,
        location,
        req.urgency.unwrap_or_default(),
    );
    request.wilaya_code = req.wilaya_code;
    request.expires_at = req.expires_at;

    state.store.insert_request(&request).await?;

    Ok((StatusCode::CREATED, Json(RequestResponse::from(&request))))
}

/// GET /donation-request query parameters
#[derive(Debug, Deserialize)]
struct RequestListQuery {
    status: Option<String>,
    urgency: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /donation-request
async fn handle_list_requests(
    State(state): State<SharedAppState>,
    Query(query): Query<RequestListQuery>,
) -> ApiResult<Json<Paginated<RequestResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<RequestStatus>())
        .transpose()
        .map_err(ApiError::Validation)?;
    let urgency = query
        .urgency
        .as_deref()
        .map(|s| s.parse::<UrgencyLevel>())
        .transpose()
        .map_err(ApiError::Validation)?;

    let filter = RequestFilter { status, urgency };
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let total = state.store.count_requests(filter).await?;
    let listed = state
        .store
        .list_requests(filter, params.offset(), params.limit())
        .await?;

    let mut data = Vec::with_capacity(listed.len());
    for request in listed {
        let request = lazily_expire(&state, request).await;
        data.push(RequestResponse::from(&request));
    }

    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// GET /donation-request/:id
async fn handle_get_request(
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RequestResponse>> {
    let request = fetch_request(&state, id).await?;
    let request = lazily_expire(&state, request).await;

    Ok(Json(RequestResponse::from(&request)))
}

/// POST /donation-request/:id/respond
async fn handle_respond(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondBody>,
) -> ApiResult<Json<RequestResponse>> {
    // Only donor users respond to requests
    let donor = match &auth.account {
        Account::User(user) if user.is_donor => user.clone(),
        Account::User(_) => {
            return Err(ApiError::Validation(
                "caller is not registered as a donor".to_string(),
            ))
        }
        Account::Admin(_) => {
            return Err(ApiError::Forbidden(
                "admin accounts cannot respond to requests".to_string(),
            ))
        }
    };

    let request = fetch_request(&state, id).await?;
    let mut request = lazily_expire(&state, request).await;

    if !request.is_active() {
        return Err(ApiError::Validation(format!(
            "request is {}, not accepting responses",
            request.status
        )));
    }

    request.record_response(donor.id, req.status);
    state.store.update_request(&request).await?;

    let priority = match request.urgency {
        UrgencyLevel::Critical | UrgencyLevel::High => Priority::High,
        _ => Priority::Normal,
    };
    notify_best_effort(
        &state.store,
        request.requester_id,
        NotificationType::RequestResponse,
        "New donor response",
        &format!("{} responded to your request", donor.username),
        priority,
    )
    .await;

    Ok(Json(RequestResponse::from(&request)))
}

/// POST /donation-request/:id/fulfill
async fn handle_fulfill(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RequestResponse>> {
    let mut request = fetch_request(&state, id).await?;
    require_requester_or_admin(&auth, &request)?;

    if !request.is_active() {
        return Err(ApiError::Validation(format!(
            "cannot fulfill a {} request",
            request.status
        )));
    }

    request.mark_fulfilled();
    state.store.update_request(&request).await?;

    notify_responders(
        &state,
        &request,
        NotificationType::RequestFulfilled,
        "Request fulfilled",
        &format!("The request for {} has been fulfilled", request.patient_name),
    )
    .await;

    Ok(Json(RequestResponse::from(&request)))
}

/// POST /donation-request/:id/cancel
async fn handle_cancel(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RequestResponse>> {
    let mut request = fetch_request(&state, id).await?;
    require_requester_or_admin(&auth, &request)?;

    if !request.is_active() {
        return Err(ApiError::Validation(format!(
            "cannot cancel a {} request",
            request.status
        )));
    }

    request.mark_cancelled();
    state.store.update_request(&request).await?;

    notify_responders(
        &state,
        &request,
        NotificationType::RequestCancelled,
        "Request cancelled",
        &format!("The request for {} has been cancelled", request.patient_name),
    )
    .await;

    Ok(Json(RequestResponse::from(&request)))
}

/// GET /donation-request/:id/matches
///
/// Donors compatible with the request's needed blood type, ranked by
/// distance from the request location.
async fn handle_matches(
    _auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let request = fetch_request(&state, id).await?;

    let compatible = compatible_donors(request.needed_blood_type);
    let mut donors = state.store.get_donors(Some(compatible)).await?;
    donors.retain(|donor| donor.id != request.requester_id);

    Ok(Json(rank_donors(
        request.location,
        donors,
        params.page(),
        params.limit(),
    )))
}

async fn fetch_request(state: &SharedAppState, id: Uuid) -> ApiResult<DonationRequest> {
    state
        .store
        .get_request(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("donation request {}", id)))
}

/// Expire an active request past its deadline, best-effort persist.
async fn lazily_expire(state: &SharedAppState, mut request: DonationRequest) -> DonationRequest {
    if request.is_past_deadline(Utc::now()) {
        request.mark_expired();
        if let Err(e) = state.store.update_request(&request).await {
            tracing::warn!(
                target: "hayat::requests",
                request_id = %request.id,
                "failed to persist expiry: {}",
                e
            );
        }
    }
    request
}

fn require_requester_or_admin(auth: &AuthUser, request: &DonationRequest) -> ApiResult<()> {
    if auth.id() == request.requester_id || auth.account.role().is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "only the requester can perform this transition".to_string(),
        ))
    }
}

/// Notify every donor who responded to the request.
async fn notify_responders(
    state: &SharedAppState,
    request: &DonationRequest,
    notification_type: NotificationType,
    title: &str,
    body: &str,
) {
    for response in &request.responses {
        notify_best_effort(
            &state.store,
            response.donor_id,
            notification_type,
            title,
            body,
            Priority::Normal,
        )
        .await;
    }
}

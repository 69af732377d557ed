//! Donation Routes
//!
//! - POST /donation - Create (caller is the donor)
//! - GET  /donation - Paginated listing, admins see everything
//! - GET  /donation/:id - Fetch (participants and admins)
//! - POST /donation/:id/schedule - requested → scheduled
//! - POST /donation/:id/complete - → completed, timestamp written once
//! - POST /donation/:id/cancel - → cancelled
//!
//! Each transition writes a best-effort notification for the counter-party.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::notify_best_effort;
use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::storage::{DonationFilter, DonationStore, HospitalStore, UserStore};
use crate::types::donation::{
    CreateDonationRequest, Donation, DonationResponse, DonationStatus, ScheduleDonationRequest,
};
use crate::types::notification::{NotificationType, Priority};
use crate::types::pagination::{PageParams, Paginated};
use crate::types::user::Account;

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/", get(handle_list_donations).post(handle_create_donation))
        .route("/:id", get(handle_get_donation))
        .route("/:id/schedule", post(handle_schedule_donation))
        .route("/:id/complete", post(handle_complete_donation))
        .route("/:id/cancel", post(handle_cancel_donation))
}

/// POST /donation
async fn handle_create_donation(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Json(req): Json<CreateDonationRequest>,
) -> ApiResult<impl IntoResponse> {
    // Only users donate; the caller becomes the donor
    let donor = match &auth.account {
        Account::User(user) => user.clone(),
        Account::Admin(_) => {
            return Err(ApiError::Forbidden(
                "admin accounts cannot donate".to_string(),
            ))
        }
    };

    if state.store.get_hospital(req.hospital_id).await?.is_none() {
        return Err(ApiError::Validation("unknown hospital".to_string()));
    }
    if let Some(recipient_id) = req.recipient_id {
        if state.store.get_user(recipient_id).await?.is_none() {
            return Err(ApiError::Validation("unknown recipient".to_string()));
        }
    }

    let mut donation = Donation::new(donor.id, req.hospital_id);
    donation.recipient_id = req.recipient_id;
    donation.request_id = req.request_id;

    state.store.insert_donation(&donation).await?;

    if let Some(recipient_id) = donation.recipient_id {
        notify_best_effort(
            &state.store,
            recipient_id,
            NotificationType::DonationRequested,
            "New donation offer",
            &format!("{} offered to donate blood for you", donor.username),
            Priority::Normal,
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(DonationResponse::from(&donation))))
}

/// GET /donation query parameters
#[derive(Debug, Deserialize)]
struct DonationListQuery {
    status: Option<String>,
    donor: Option<Uuid>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /donation
async fn handle_list_donations(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Query(query): Query<DonationListQuery>,
) -> ApiResult<Json<Paginated<DonationResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<DonationStatus>())
        .transpose()
        .map_err(ApiError::Validation)?;

    // Non-admins only ever see their own donations
    let donor_id = if auth.account.role().is_admin() {
        query.donor
    } else {
        Some(auth.id())
    };

    let filter = DonationFilter { status, donor_id };
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let total = state.store.count_donations(filter).await?;
    let donations = state
        .store
        .list_donations(filter, params.offset(), params.limit())
        .await?;

    let data = donations.iter().map(DonationResponse::from).collect();
    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// GET /donation/:id
async fn handle_get_donation(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DonationResponse>> {
    let donation = fetch_donation(&state, id).await?;
    require_participant(&auth, &donation)?;

    Ok(Json(DonationResponse::from(&donation)))
}

/// POST /donation/:id/schedule
async fn handle_schedule_donation(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ScheduleDonationRequest>,
) -> ApiResult<Json<DonationResponse>> {
    let mut donation = fetch_donation(&state, id).await?;
    require_donor_or_admin(&auth, &donation)?;

    if !donation.can_schedule() {
        return Err(ApiError::Validation(format!(
            "cannot schedule a {} donation",
            donation.status
        )));
    }

    donation.mark_scheduled(req.scheduled_at);
    state.store.update_donation(&donation).await?;

    notify_counterparties(
        &state,
        &donation,
        auth.id(),
        NotificationType::DonationScheduled,
        "Donation scheduled",
        &format!("Donation {} has been scheduled", donation.id),
        Priority::Normal,
    )
    .await;

    Ok(Json(DonationResponse::from(&donation)))
}

/// POST /donation/:id/complete
async fn handle_complete_donation(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DonationResponse>> {
    let mut donation = fetch_donation(&state, id).await?;
    require_donor_or_admin(&auth, &donation)?;

    if !donation.can_complete() {
        return Err(ApiError::Validation(format!(
            "cannot complete a {} donation",
            donation.status
        )));
    }

    let already_completed = donation.status == DonationStatus::Completed;
    donation.mark_completed();
    state.store.update_donation(&donation).await?;

    if !already_completed {
        notify_counterparties(
            &state,
            &donation,
            auth.id(),
            NotificationType::DonationCompleted,
            "Donation completed",
            &format!("Donation {} has been completed", donation.id),
            Priority::Normal,
        )
        .await;
    }

    Ok(Json(DonationResponse::from(&donation)))
}

/// POST /donation/:id/cancel
async fn handle_cancel_donation(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DonationResponse>> {
    let mut donation = fetch_donation(&state, id).await?;
    require_participant(&auth, &donation)?;

    if !donation.can_cancel() {
        return Err(ApiError::Validation(format!(
            "cannot cancel a {} donation",
            donation.status
        )));
    }

    donation.mark_cancelled();
    state.store.update_donation(&donation).await?;

    notify_counterparties(
        &state,
        &donation,
        auth.id(),
        NotificationType::DonationCancelled,
        "Donation cancelled",
        &format!("Donation {} has been cancelled", donation.id),
        Priority::High,
    )
    .await;

    Ok(Json(DonationResponse::from(&donation)))
}

async fn fetch_donation(state: &SharedAppState, id: Uuid) -> ApiResult<Donation> {
    state
        .store
        .get_donation(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("donation {}", id)))
}

/// Donor, recipient, or admin.
fn require_participant(auth: &AuthUser, donation: &Donation) -> ApiResult<()> {
    let caller = auth.id();
    if caller == donation.donor_id
        || donation.recipient_id == Some(caller)
        || auth.account.role().is_admin()
    {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "not a participant of this donation".to_string(),
        ))
    }
}

/// Donor or admin.
fn require_donor_or_admin(auth: &AuthUser, donation: &Donation) -> ApiResult<()> {
    if auth.id() == donation.donor_id || auth.account.role().is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "only the donor can perform this transition".to_string(),
        ))
    }
}

/// Notify every participant except the actor who triggered the change.
async fn notify_counterparties(
    state: &SharedAppState,
    donation: &Donation,
    actor: Uuid,
    notification_type: NotificationType,
    title: &str,
    body: &str,
    priority: Priority,
) {
    let mut recipients = vec![donation.donor_id];
    if let Some(recipient_id) = donation.recipient_id {
        recipients.push(recipient_id);
    }

    for recipient in recipients.into_iter().filter(|id| *id != actor) {
        notify_best_effort(&state.store, recipient, notification_type, title, body, priority)
            .await;
    }
}

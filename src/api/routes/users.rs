//! User Routes
//!
//! - GET    /user - List users (admin)
//! - GET    /user/donors - Distance-ranked donor search
//! - GET    /user/:id - Fetch a user
//! - PUT    /user/:id - Update a user (self or admin)
//! - DELETE /user/:id - Delete a user (self or admin)

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::matching::{compatible_donors, rank_donors};
use crate::storage::UserStore;
use crate::types::blood::NeededBloodType;
use crate::types::geo::Coordinates;
use crate::types::pagination::{PageParams, Paginated};
use crate::types::user::{UpdateUserRequest, UserResponse};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/", get(handle_list_users))
        .route("/donors", get(handle_search_donors))
        .route(
            "/:id",
            get(handle_get_user)
                .put(handle_update_user)
                .delete(handle_delete_user),
        )
}

/// GET /user
async fn handle_list_users(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<UserResponse>>> {
    auth.require_admin()?;

    let total = state.store.count_users().await?;
    let users = state
        .store
        .list_users(params.offset(), params.limit())
        .await?;

    let data = users.iter().map(UserResponse::from).collect();
    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// GET /user/donors query parameters
#[derive(Debug, Deserialize)]
struct DonorQuery {
    blood_type: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    /// Donor to exclude; defaults to the caller
    exclude: Option<Uuid>,
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /user/donors
///
/// Donors compatible with the requested blood type, ranked ascending by
/// haversine distance from the given point.
async fn handle_search_donors(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Query(query): Query<DonorQuery>,
) -> ApiResult<impl IntoResponse> {
    let (lat, lng) = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(ApiError::Validation(
                "lat and lng query parameters are required".to_string(),
            ))
        }
    };
    let origin = Coordinates::new(lat, lng);

    let compatible = query
        .blood_type
        .as_deref()
        .map(NeededBloodType::parse)
        .map(compatible_donors);

    let mut donors = state.store.get_donors(compatible).await?;

    let exclude = query.exclude.unwrap_or_else(|| auth.id());
    donors.retain(|donor| donor.id != exclude);

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).max(1);

    Ok(Json(rank_donors(origin, donors, page, limit)))
}

/// GET /user/:id
async fn handle_get_user(
    _auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /user/:id
async fn handle_update_user(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    if !auth.can_manage(id) {
        return Err(ApiError::Forbidden(
            "cannot modify another user's profile".to_string(),
        ));
    }

    let mut user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))?;

    if let Some(full_name) = req.full_name {
        user.full_name = full_name;
    }
    if let Some(phone) = req.phone {
        user.phone = Some(phone);
    }
    if let Some(blood_type) = req.blood_type {
        user.blood_type = blood_type;
    }
    if let Some(is_donor) = req.is_donor {
        user.is_donor = is_donor;
    }
    if let Some(location) = req.location {
        user.location = Some(location.into_coordinates().map_err(ApiError::Validation)?);
    }
    if let Some(wilaya_code) = req.wilaya_code {
        user.wilaya_code = Some(wilaya_code);
    }
    user.touch();

    state.store.update_user(&user).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /user/:id
async fn handle_delete_user(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !auth.can_manage(id) {
        return Err(ApiError::Forbidden(
            "cannot delete another user's account".to_string(),
        ));
    }

    if !state.store.delete_user(id).await? {
        return Err(ApiError::NotFound(format!("user {}", id)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

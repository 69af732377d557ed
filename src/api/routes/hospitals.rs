//! Hospital Routes
//!
//! - POST   /hospital - Create (admin)
//! - GET    /hospital - Paginated listing
//! - GET    /hospital/nearest - Nearest hospitals to a point
//! - GET    /hospital/:id - Fetch
//! - PUT    /hospital/:id - Update (admin)
//! - DELETE /hospital/:id - Delete (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::matching::haversine_km;
use crate::storage::HospitalStore;
use crate::types::geo::Coordinates;
use crate::types::hospital::{
    CreateHospitalRequest, Hospital, HospitalResponse, NearestHospital, UpdateHospitalRequest,
};
use crate::types::pagination::{PageParams, Paginated};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/", get(handle_list_hospitals).post(handle_create_hospital))
        .route("/nearest", get(handle_nearest_hospitals))
        .route(
            "/:id",
            get(handle_get_hospital)
                .put(handle_update_hospital)
                .delete(handle_delete_hospital),
        )
}

/// POST /hospital
async fn handle_create_hospital(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Json(req): Json<CreateHospitalRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require_admin()?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }

    let location = req.location.into_coordinates().map_err(ApiError::Validation)?;
    let mut hospital = Hospital::new(req.name.trim().to_string(), location, req.wilaya_code);
    hospital.phone = req.phone;

    state.store.insert_hospital(&hospital).await?;

    Ok((StatusCode::CREATED, Json(HospitalResponse::from(&hospital))))
}

/// GET /hospital
async fn handle_list_hospitals(
    State(state): State<SharedAppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<HospitalResponse>>> {
    let total = state.store.count_hospitals().await?;
    let hospitals = state
        .store
        .list_hospitals(params.offset(), params.limit())
        .await?;

    let data = hospitals.iter().map(HospitalResponse::from).collect();
    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// GET /hospital/nearest query parameters
#[derive(Debug, Deserialize)]
struct NearestQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    limit: Option<u32>,
}

/// GET /hospital/nearest
async fn handle_nearest_hospitals(
    State(state): State<SharedAppState>,
    Query(query): Query<NearestQuery>,
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
    let limit = query.limit.unwrap_or(10).max(1) as usize;

    let mut nearest: Vec<NearestHospital> = state
        .store
        .all_hospitals()
        .await?
        .iter()
        .map(|hospital| NearestHospital {
            hospital: hospital.into(),
            distance_km: haversine_km(origin, hospital.location),
        })
        .collect();

    nearest.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    nearest.truncate(limit);

    Ok(Json(serde_json::json!({ "data": nearest })))
}

/// GET /hospital/:id
async fn handle_get_hospital(
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HospitalResponse>> {
    let hospital = state
        .store
        .get_hospital(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("hospital {}", id)))?;

    Ok(Json(HospitalResponse::from(&hospital)))
}

/// PUT /hospital/:id
async fn handle_update_hospital(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHospitalRequest>,
) -> ApiResult<Json<HospitalResponse>> {
    auth.require_admin()?;

    let mut hospital = state
        .store
        .get_hospital(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("hospital {}", id)))?;

    if let Some(name) = req.name {
        hospital.name = name;
    }
    if let Some(location) = req.location {
        hospital.location = location.into_coordinates().map_err(ApiError::Validation)?;
    }
    if let Some(wilaya_code) = req.wilaya_code {
        hospital.wilaya_code = wilaya_code;
    }
    if let Some(phone) = req.phone {
        hospital.phone = Some(phone);
    }

    state.store.update_hospital(&hospital).await?;

    Ok(Json(HospitalResponse::from(&hospital)))
}

/// DELETE /hospital/:id
async fn handle_delete_hospital(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    auth.require_admin()?;

    if !state.store.delete_hospital(id).await? {
        return Err(ApiError::NotFound(format!("hospital {}", id)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

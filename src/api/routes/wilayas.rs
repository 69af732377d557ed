//! Wilaya Routes
//!
//! - POST   /wilaya - Create (admin)
//! - GET    /wilaya - Paginated listing
//! - GET    /wilaya/:code - Fetch by wilaya number
//! - PUT    /wilaya/:code - Update (admin)
//! - DELETE /wilaya/:code - Delete (admin)
//! - POST   /wilaya/:code/centers - Append a blood center (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::storage::WilayaStore;
use crate::types::pagination::{PageParams, Paginated};
use crate::types::wilaya::{
    AddCenterRequest, BloodCenter, CreateWilayaRequest, UpdateWilayaRequest, Wilaya,
    WilayaResponse,
};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/", get(handle_list_wilayas).post(handle_create_wilaya))
        .route(
            "/:code",
            get(handle_get_wilaya)
                .put(handle_update_wilaya)
                .delete(handle_delete_wilaya),
        )
        .route("/:code/centers", post(handle_add_center))
}

/// POST /wilaya
async fn handle_create_wilaya(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Json(req): Json<CreateWilayaRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require_admin()?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }

    let location = req.location.into_coordinates().map_err(ApiError::Validation)?;
    let wilaya = Wilaya::new(req.code, req.name.trim().to_string(), location);

    state.store.insert_wilaya(&wilaya).await?;

    Ok((StatusCode::CREATED, Json(WilayaResponse::from(&wilaya))))
}

/// GET /wilaya
async fn handle_list_wilayas(
    State(state): State<SharedAppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<WilayaResponse>>> {
    let total = state.store.count_wilayas().await?;
    let wilayas = state
        .store
        .list_wilayas(params.offset(), params.limit())
        .await?;

    let data = wilayas.iter().map(WilayaResponse::from).collect();
    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// GET /wilaya/:code
async fn handle_get_wilaya(
    State(state): State<SharedAppState>,
    Path(code): Path<u32>,
) -> ApiResult<Json<WilayaResponse>> {
    let wilaya = state
        .store
        .get_wilaya(code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("wilaya {}", code)))?;

    Ok(Json(WilayaResponse::from(&wilaya)))
}

/// PUT /wilaya/:code
async fn handle_update_wilaya(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(code): Path<u32>,
    Json(req): Json<UpdateWilayaRequest>,
) -> ApiResult<Json<WilayaResponse>> {
    auth.require_admin()?;

    let mut wilaya = state
        .store
        .get_wilaya(code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("wilaya {}", code)))?;

    if let Some(name) = req.name {
        wilaya.name = name;
    }
    if let Some(location) = req.location {
        wilaya.location = location.into_coordinates().map_err(ApiError::Validation)?;
    }

    state.store.update_wilaya(&wilaya).await?;

    Ok(Json(WilayaResponse::from(&wilaya)))
}

/// DELETE /wilaya/:code
async fn handle_delete_wilaya(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(code): Path<u32>,
) -> ApiResult<impl IntoResponse> {
    auth.require_admin()?;

    if !state.store.delete_wilaya(code).await? {
        return Err(ApiError::NotFound(format!("wilaya {}", code)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /wilaya/:code/centers
async fn handle_add_center(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(code): Path<u32>,
    Json(req): Json<AddCenterRequest>,
) -> ApiResult<Json<WilayaResponse>> {
    auth.require_admin()?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }

    let mut wilaya = state
        .store
        .get_wilaya(code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("wilaya {}", code)))?;

    let location = req
        .location
        .map(|l| l.into_coordinates().map_err(ApiError::Validation))
        .transpose()?;

    wilaya.centers.push(BloodCenter {
        name: req.name.trim().to_string(),
        address: req.address,
        phone: req.phone,
        location,
    });

    state.store.update_wilaya(&wilaya).await?;

    Ok(Json(WilayaResponse::from(&wilaya)))
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing;
    use crate::storage::AdminStore;
    use crate::types::user::{Admin, Role};
    use axum::http::StatusCode;

    /// Seed an admin straight into the store and log them in.
    async fn admin_token(state: &crate::api::server::SharedAppState, app: &axum::Router) -> String {
        let admin = Admin::new(
            "staff".to_string(),
            "staff@example.com".to_string(),
            crate::auth::hash_password("password123").unwrap(),
            Role::Admin,
        );
        state.store.insert_admin(&admin).await.unwrap();

        let response = testing::send(
            app,
            testing::json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"identifier": "staff", "password": "password123"}),
            ),
        )
        .await;
        testing::body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_create_and_add_center() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());
        let token = admin_token(&state, &app).await;

        let body = serde_json::json!({
            "code": 16,
            "name": "Alger",
            "location": "36.7538,3.0588"
        });
        let response = testing::send(
            &app,
            testing::json_request("POST", "/wilaya", Some(&token), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = serde_json::json!({
            "name": "CTS Mustapha",
            "address": "Place du 1er Mai"
        });
        let response = testing::send(
            &app,
            testing::json_request("POST", "/wilaya/16/centers", Some(&token), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = testing::send(&app, testing::get_request("/wilaya/16", None)).await;
        let body = testing::body_json(response).await;
        assert_eq!(body["centers"].as_array().unwrap().len(), 1);
        assert_eq!(body["centers"][0]["name"], "CTS Mustapha");
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());
        let token = admin_token(&state, &app).await;

        let body = serde_json::json!({
            "code": 31,
            "name": "Oran",
            "location": {"lat": 35.6969, "lng": -0.6492}
        });
        let response = testing::send(
            &app,
            testing::json_request("POST", "/wilaya", Some(&token), body.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = testing::send(
            &app,
            testing::json_request("POST", "/wilaya", Some(&token), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_get_unknown_wilaya_is_404() {
        let app = testing::app();

        let response = testing::send(&app, testing::get_request("/wilaya/99", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

//! Admin Account Routes
//!
//! Superadmin-only management of administrator accounts.
//!
//! - GET    /admin/accounts - List admins
//! - POST   /admin/accounts - Create an admin
//! - DELETE /admin/accounts/:id - Delete an admin

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::auth::hash_password;
use crate::storage::AdminStore;
use crate::types::pagination::{PageParams, Paginated};
use crate::types::user::{Admin, AdminResponse, CreateAdminRequest, Role};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route(
            "/accounts",
            get(handle_list_admins).post(handle_create_admin),
        )
        .route("/accounts/:id", axum::routing::delete(handle_delete_admin))
}

/// GET /admin/accounts
async fn handle_list_admins(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Paginated<AdminResponse>>> {
    auth.require_superadmin()?;

    let total = state.store.count_admins().await?;
    let admins = state
        .store
        .list_admins(params.offset(), params.limit())
        .await?;

    let data = admins.iter().map(AdminResponse::from).collect();
    Ok(Json(Paginated::new(
        data,
        params.page(),
        params.limit(),
        total,
    )))
}

/// POST /admin/accounts
async fn handle_create_admin(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Json(req): Json<CreateAdminRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require_superadmin()?;

    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("username is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("invalid email".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let role = req.role.unwrap_or(Role::Admin);
    if role == Role::User {
        return Err(ApiError::Validation(
            "admin accounts must be admin or superadmin".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let admin = Admin::new(
        req.username.trim().to_string(),
        req.email.trim().to_string(),
        password_hash,
        role,
    );

    state.store.insert_admin(&admin).await?;

    Ok((StatusCode::CREATED, Json(AdminResponse::from(&admin))))
}

/// DELETE /admin/accounts/:id
async fn handle_delete_admin(
    auth: AuthUser,
    State(state): State<SharedAppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    auth.require_superadmin()?;

    if auth.id() == id {
        return Err(ApiError::Validation(
            "cannot delete your own account".to_string(),
        ));
    }

    if !state.store.delete_admin(id).await? {
        return Err(ApiError::NotFound(format!("admin {}", id)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing;
    use crate::storage::AdminStore;
    use crate::types::user::{Admin, Role};
    use axum::http::StatusCode;

    async fn seed_and_login(
        state: &crate::api::server::SharedAppState,
        app: &axum::Router,
        username: &str,
        role: Role,
    ) -> String {
        let admin = Admin::new(
            username.to_string(),
            format!("{}@example.com", username),
            crate::auth::hash_password("password123").unwrap(),
            role,
        );
        state.store.insert_admin(&admin).await.unwrap();

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
    async fn test_superadmin_creates_admin() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());
        let token = seed_and_login(&state, &app, "root", Role::Superadmin).await;

        let body = serde_json::json!({
            "username": "staff",
            "email": "staff@example.com",
            "password": "password123"
        });
        let response = testing::send(
            &app,
            testing::json_request("POST", "/admin/accounts", Some(&token), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(testing::body_json(response).await["role"], "admin");

        let response = testing::send(
            &app,
            testing::get_request("/admin/accounts", Some(&token)),
        )
        .await;
        let body = testing::body_json(response).await;
        assert_eq!(body["pagination"]["totalItems"], 2);
    }

    #[tokio::test]
    async fn test_plain_admin_forbidden() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());
        let token = seed_and_login(&state, &app, "staff", Role::Admin).await;

        let response = testing::send(
            &app,
            testing::get_request("/admin/accounts", Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());
        let token = seed_and_login(&state, &app, "root", Role::Superadmin).await;

        let root = state.store.get_admin_by_username("root").await.unwrap().unwrap();

        let response = testing::send(
            &app,
            testing::json_request(
                "DELETE",
                &format!("/admin/accounts/{}", root.id),
                Some(&token),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

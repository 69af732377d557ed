//! Authentication Routes
//!
//! - POST /auth/register - Create a user account
//! - POST /auth/login - Exchange credentials for a signed token
//! - GET  /auth/me - Resolve the calling account from its token

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::server::SharedAppState;
use crate::auth::{hash_password, verify_password};
use crate::storage::{AdminStore, UserStore};
use crate::types::user::{
    Account, AccountResponse, LoginRequest, LoginResponse, RegisterRequest, User, UserResponse,
};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/register", post(handle_register))
        .route("/login", post(handle_login))
        .route("/me", get(handle_me))
}

/// POST /auth/register
async fn handle_register(
    State(state): State<SharedAppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = req.username.trim();
    let email = req.email.trim();

    if username.is_empty() {
        return Err(ApiError::Validation("username is required".to_string()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("invalid email".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if req.full_name.trim().is_empty() {
        return Err(ApiError::Validation("full_name is required".to_string()));
    }

    if state.store.get_user_by_email(email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    if state.store.get_user_by_username(username).await?.is_some() {
        return Err(ApiError::Conflict("username already taken".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let mut user = User::new(
        username.to_string(),
        email.to_string(),
        password_hash,
        req.full_name.trim().to_string(),
    );
    user.phone = req.phone;
    if let Some(blood_type) = req.blood_type {
        user.blood_type = blood_type;
    }
    user.is_donor = req.is_donor.unwrap_or(false);
    if let Some(location) = req.location {
        user.location = Some(location.into_coordinates().map_err(ApiError::Validation)?);
    }
    user.wilaya_code = req.wilaya_code;

    state.store.insert_user(&user).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login
async fn handle_login(
    State(state): State<SharedAppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let identifier = req.identifier.trim();

    let account = find_by_identifier(&state, identifier)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    verify_password(&req.password, account.password_hash())?;

    let token = state.tokens.issue(&account)?;

    Ok(Json(LoginResponse {
        token,
        account: AccountResponse::from(&account),
    }))
}

/// GET /auth/me
async fn handle_me(auth: AuthUser) -> Json<AccountResponse> {
    Json(AccountResponse::from(&auth.account))
}

/// Resolve a login identifier against users first, then admins.
async fn find_by_identifier(
    state: &SharedAppState,
    identifier: &str,
) -> ApiResult<Option<Account>> {
    if let Some(user) = state.store.get_user_by_email(identifier).await? {
        return Ok(Some(Account::User(user)));
    }
    if let Some(user) = state.store.get_user_by_username(identifier).await? {
        return Ok(Some(Account::User(user)));
    }
    if let Some(admin) = state.store.get_admin_by_email(identifier).await? {
        return Ok(Some(Account::Admin(admin)));
    }
    if let Some(admin) = state.store.get_admin_by_username(identifier).await? {
        return Ok(Some(Account::Admin(admin)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing;
    use axum::http::StatusCode;

    fn register_body(username: &str) -> serde_json::Value {
        serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "full_name": "Test User"
        })
    }

    #[tokio::test]
    async fn test_register_login_me_flow() {
        let app = testing::app();

        let response = testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, register_body("amine")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"identifier": "amine@example.com", "password": "password123"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = testing::body_json(response).await;
        let token = body["token"].as_str().unwrap().to_string();

        let response = testing::send(&app, testing::get_request("/auth/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let me = testing::body_json(response).await;
        assert_eq!(me["username"], "amine");
        assert_eq!(me["role"], "user");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let app = testing::app();

        let response = testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, register_body("amine")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, register_body("amine")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let app = testing::app();

        let mut body = register_body("amine");
        body["password"] = serde_json::json!("short");

        let response = testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let app = testing::app();

        testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, register_body("amine")),
        )
        .await;

        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"identifier": "amine", "password": "not-the-password"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let app = testing::app();

        let response =
            testing::send(&app, testing::get_request("/auth/me", Some("garbage"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = testing::send(&app, testing::get_request("/auth/me", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let app = testing::app();

        // Forge a token signed with the right secret but already expired
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = crate::auth::Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            role: crate::types::user::Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let response = testing::send(&app, testing::get_request("/auth/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_role_forbidden_on_admin_route() {
        let app = testing::app();

        testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, register_body("amine")),
        )
        .await;
        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"identifier": "amine", "password": "password123"}),
            ),
        )
        .await;
        let token = testing::body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        // User listing is admin-only
        let response = testing::send(&app, testing::get_request("/user", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_deleted_subject_stops_authenticating() {
        use crate::storage::UserStore;

        let state = testing::state();
        let app = crate::api::server::create_router(state.clone());

        testing::send(
            &app,
            testing::json_request("POST", "/auth/register", None, register_body("amine")),
        )
        .await;
        let response = testing::send(
            &app,
            testing::json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"identifier": "amine", "password": "password123"}),
            ),
        )
        .await;
        let token = testing::body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let user = state
            .store
            .get_user_by_username("amine")
            .await
            .unwrap()
            .unwrap();
        state.store.delete_user(user.id).await.unwrap();

        let response = testing::send(&app, testing::get_request("/auth/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

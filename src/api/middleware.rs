//! Token Verification
//!
//! Extractor for protected routes: pulls the bearer token, verifies its
//! signature and expiry, then re-resolves the subject account so deleted
//! accounts stop authenticating immediately.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use uuid::Uuid;

use super::error::ApiError;
use super::server::SharedAppState;
use crate::auth::Claims;
use crate::storage::AccountStore;
use crate::types::user::Account;

/// The authenticated caller of a protected route.
pub struct AuthUser {
    pub account: Account,
    pub claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.account.id()
    }

    /// Caller may manage the given resource owner's data: the owner
    /// themselves, or any admin.
    pub fn can_manage(&self, owner: Uuid) -> bool {
        self.account.id() == owner || self.account.role().is_admin()
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.account.role().is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }

    pub fn require_superadmin(&self) -> Result<(), ApiError> {
        if self.account.role() == crate::types::user::Role::Superadmin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("superadmin role required".to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        let claims = state.tokens.verify(token)?;
        let subject = claims.subject_id()?;

        // The subject must still exist in the store
        let account = state
            .store
            .find_account(subject, claims.role)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("unknown token subject".to_string()))?;

        Ok(AuthUser { account, claims })
    }
}

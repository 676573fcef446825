use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{header, request::Parts},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::auth::{AuthError, Identity};
use crate::models::{ProvisionUserInput, User};

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        Ok(state.tokens.verify_session(token)?)
    }
}

impl Identity {
    /// The caller's organization, for organization-scoped routes.
    pub(crate) fn organization(&self) -> ApiResult<Uuid> {
        self.organization_id.ok_or(ApiError::NotFound("organization"))
    }
}

#[derive(Debug, Deserialize)]
pub struct AutoLoginRequest {
    token: String,
}

#[derive(Debug, Serialize)]
pub struct AutoLoginResponse {
    token: String,
    user: User,
    created: bool,
}

/// Exchanges an SSO token for a session, provisioning the user on first
/// sight.
pub async fn auto_login(
    State(state): State<AppState>,
    body: Result<Json<AutoLoginRequest>, JsonRejection>,
) -> ApiResult<Json<AutoLoginResponse>> {
    let Json(request) = body?;
    let claims = state.tokens.verify_sso(&request.token)?;

    if claims.email.trim().is_empty() {
        return Err(ApiError::validation("email", "SSO token carries no email"));
    }

    let (user, created) = state.db.provision_user(ProvisionUserInput {
        email: claims.email,
        name: claims.name,
        organization_id: claims.organization_id,
    })?;
    if created {
        tracing::info!(user_id = %user.id, "Provisioned user from SSO login");
    }

    let token = state.tokens.issue_session(&user).map_err(|e| anyhow::anyhow!(e))?;

    Ok(Json(AutoLoginResponse {
        token,
        user,
        created,
    }))
}

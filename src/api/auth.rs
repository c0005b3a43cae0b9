use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::require_field;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Account;
use crate::services::{AuthError, TokenPair};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// The account resolved from a bearer token, stored in request extensions
/// by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub Account);

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that requires an
/// `Authorization: Bearer <access token>` header.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return Err(ApiError::Unauthorized(AuthError::Unauthenticated.to_string()));
    };

    let account = state.token_service().authenticate(&token).await?;

    let account_id = account.id;
    tracing::Span::current().record("user_id", account_id.value());
    request
        .extensions_mut()
        .insert(AuthenticatedAccount(account));

    let mut response = next.run(request).await;
    response.extensions_mut().insert(account_id);
    Ok(response)
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /user/token
/// Exchange email and password for an access/refresh token pair
pub async fn obtain_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let email = require_field(payload.email.as_deref(), "email")?;
    let password = require_field(payload.password.as_deref(), "password")?;

    let pair = state.token_service().issue(email, password).await?;

    Ok(Json(ApiResponse::success(pair)))
}

/// POST /user/token/refresh
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AccessTokenResponse>>, ApiError> {
    let refresh = require_field(payload.refresh.as_deref(), "refresh")?;

    let access = state.token_service().refresh(refresh.trim()).await?;

    Ok(Json(ApiResponse::success(AccessTokenResponse { access })))
}

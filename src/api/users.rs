use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthenticatedAccount;
use super::validation::{validate_name, validate_new_email, validate_new_password};
use super::{ApiError, ApiResponse, AppState};
use crate::domain::{AccountAttributes, AccountPatch, AccountProfile, NewAccount};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub email: serde_json::Value,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// POST /user/create
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountProfile>>), ApiError> {
    let min_length = state.config().security.password_min_length;
    validate_new_email(&payload.email)?;
    let name = validate_name(payload.name.as_deref())?;
    let password = validate_new_password(payload.password.as_deref(), min_length)?;

    let new = NewAccount {
        email: payload.email,
        password: password.to_string(),
        attributes: AccountAttributes {
            name: name.to_string(),
            ..AccountAttributes::default()
        },
    };

    let account = state.account_service().create(new).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(account.into())),
    ))
}

/// GET /user/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Result<Json<ApiResponse<AccountProfile>>, ApiError> {
    let profile = state.self_service().get_self(account.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT|PATCH /user/me
///
/// Omitted fields are left unchanged. A new password is stored hashed.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountProfile>>, ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(|name| validate_name(Some(name)).map(str::to_string))
        .transpose()?;

    if payload.password.is_some() {
        let min_length = state.config().security.password_min_length;
        validate_new_password(payload.password.as_deref(), min_length)?;
    }

    let patch = AccountPatch {
        name,
        password: payload.password,
    };

    let profile = state.self_service().update_self(account.id, patch).await?;
    Ok(Json(ApiResponse::success(profile)))
}

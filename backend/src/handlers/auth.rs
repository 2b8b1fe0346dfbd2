use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::IntoParams;

use crate::{
    error::AppError,
    models::user::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, SetupAccountRequest,
        SetupAccountResponse, User, UserResponse, VerifySetupTokenResponse,
    },
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SetupTokenQuery {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(state.auth.login(payload).await?))
}

pub async fn register(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let created = state.auth.register(payload).await?;
    tracing::info!(by = %admin.username, username = %created.username, "Account registered by admin");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn profile(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    state.auth.change_password(&user, payload).await?;
    Ok(Json(json!({"message": "Password updated successfully"})))
}

pub async fn verify_setup_token(
    State(state): State<AppState>,
    Query(query): Query<SetupTokenQuery>,
) -> Result<Json<VerifySetupTokenResponse>, AppError> {
    Ok(Json(state.auth.verify_setup_token(&query.token).await?))
}

pub async fn setup_account(
    State(state): State<AppState>,
    Json(payload): Json<SetupAccountRequest>,
) -> Result<Json<SetupAccountResponse>, AppError> {
    Ok(Json(state.auth.complete_setup(payload).await?))
}

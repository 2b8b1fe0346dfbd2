use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::user::User, state::AppState, utils::jwt::Claims};

pub async fn auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, |_| true).await
}

// Auth + require manager or admin for read-only administrative routes
pub async fn auth_manager(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, User::is_manager_or_admin).await
}

// Auth + require admin role for admin-only routes
pub async fn auth_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, User::is_admin).await
}

async fn authorize(
    state: &AppState,
    mut request: Request,
    next: Next,
    allowed: fn(&User) -> bool,
) -> Result<Response, AppError> {
    let (claims, user) = authenticate_request(state, request.headers()).await?;
    if !allowed(&user) {
        tracing::warn!(username = %user.username, path = %request.uri().path(), "Access denied");
        return Err(AppError::Forbidden("Insufficient permissions".into()));
    }

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

async fn authenticate_request(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<(Claims, User), AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    state.auth.authenticate(token).await
}

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::str::FromStr;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attendance::{
            AttendanceFilter, AttendanceLogQuery, AttendanceResponse, ClockInRequest,
            ClockOutRequest, TodayStatusResponse,
        },
        attendance_history::AttendanceHistory,
        user::User,
        PageRequest, PaginatedResponse,
    },
    state::AppState,
    types::AttendanceId,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TodayQuery {
    /// Employee code; managers and admins may look up anyone.
    pub employee_id: Option<String>,
}

fn own_code(user: &User) -> Result<String, AppError> {
    user.employee_code
        .clone()
        .ok_or_else(|| AppError::Forbidden("No employee is linked to this account".into()))
}

/// Picks the employee an attendance action applies to. Acting for someone
/// else needs manager or admin rights.
pub fn resolve_employee(user: &User, requested: Option<&str>) -> Result<String, AppError> {
    let requested = requested.map(str::trim).filter(|code| !code.is_empty());
    match requested {
        Some(code) if user.employee_code.as_deref() == Some(code) => Ok(code.to_string()),
        Some(code) if user.is_manager_or_admin() => Ok(code.to_string()),
        Some(_) => Err(AppError::Forbidden(
            "You can only record your own attendance".into(),
        )),
        None => own_code(user),
    }
}

fn actor(user: &User) -> Option<String> {
    Some(user.username.clone())
}

pub async fn clock_in(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ClockInRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), AppError> {
    payload.validate()?;
    let code = resolve_employee(&user, payload.employee_id.as_deref())?;
    let record = state
        .attendance
        .clock_in(&code, &payload.notes, actor(&user))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn clock_out(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ClockOutRequest>,
) -> Result<Json<AttendanceResponse>, AppError> {
    payload.validate()?;
    let code = resolve_employee(&user, payload.employee_id.as_deref())?;
    let record = state
        .attendance
        .clock_out(&code, &payload.notes, actor(&user))
        .await?;
    Ok(Json(record))
}

pub async fn get_logs(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<AttendanceLogQuery>,
) -> Result<Json<PaginatedResponse<AttendanceResponse>>, AppError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".into(),
            ));
        }
    }

    let employee_code = if user.is_manager_or_admin() {
        query
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_owned)
    } else {
        Some(own_code(&user)?)
    };
    let filter = AttendanceFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        department_id: query.department_id,
        employee_code,
    };
    let page = PageRequest::new(query.page, query.limit);

    Ok(Json(state.attendance.logs(filter, page).await?))
}

pub async fn get_today(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<TodayStatusResponse>, AppError> {
    let code = resolve_employee(&user, query.employee_id.as_deref())?;
    Ok(Json(state.attendance.today(&code).await?))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AttendanceHistory>>, AppError> {
    let id = AttendanceId::from_str(&id)
        .map_err(|_| AppError::BadRequest("Invalid attendance ID".into()))?;
    let owner = if user.is_manager_or_admin() {
        None
    } else {
        Some(own_code(&user)?)
    };
    let entries = state.attendance.history(id, owner.as_deref()).await?;
    Ok(Json(entries))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{
        employee::{
            CreateEmployeeRequest, CreateEmployeeResponse, Employee, EmployeeListQuery,
            SetupTokenResponse, UpdateEmployeeRequest, UpdateEmployeeStatusRequest,
        },
        PaginatedResponse,
    },
    state::AppState,
};

pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<PaginatedResponse<Employee>>, AppError> {
    Ok(Json(state.employees.list(query).await?))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Employee>, AppError> {
    Ok(Json(state.employees.get(code.trim()).await?))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<CreateEmployeeResponse>), AppError> {
    let created = state.employees.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, AppError> {
    Ok(Json(state.employees.update(code.trim(), payload).await?))
}

pub async fn update_employee_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateEmployeeStatusRequest>,
) -> Result<Json<Employee>, AppError> {
    Ok(Json(
        state
            .employees
            .update_status(code.trim(), payload.status)
            .await?,
    ))
}

/// Soft delete; the row and its attendance stay in place.
pub async fn deactivate_employee(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let employee = state.employees.deactivate(code.trim()).await?;
    Ok(Json(json!({
        "message": "Employee deactivated successfully",
        "employee": employee,
    })))
}

pub async fn get_setup_token(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SetupTokenResponse>, AppError> {
    Ok(Json(state.employees.setup_token(code.trim()).await?))
}

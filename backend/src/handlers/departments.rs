use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::{
    error::AppError,
    models::{
        department::{
            CreateDepartmentRequest, Department, DepartmentListQuery, UpdateDepartmentRequest,
        },
        PaginatedResponse,
    },
    state::AppState,
    types::DepartmentId,
};

pub fn parse_department_id(raw: &str) -> Result<DepartmentId, AppError> {
    DepartmentId::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest("Invalid department ID".into()))
}

pub async fn list_departments(
    State(state): State<AppState>,
    Query(query): Query<DepartmentListQuery>,
) -> Result<Json<PaginatedResponse<Department>>, AppError> {
    Ok(Json(state.departments.list(query).await?))
}

pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Department>, AppError> {
    let id = parse_department_id(&id)?;
    Ok(Json(state.departments.get(id).await?))
}

pub async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let department = state.departments.create(payload).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDepartmentRequest>,
) -> Result<Json<Department>, AppError> {
    let id = parse_department_id(&id)?;
    Ok(Json(state.departments.update(id, payload).await?))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_department_id(&id)?;
    state.departments.delete(id).await?;
    Ok(Json(json!({ "message": "Department deleted successfully" })))
}

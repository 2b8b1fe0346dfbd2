use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::departments::parse_department_id;
use crate::{
    error::AppError,
    models::report::{
        AttendanceReportRow, CsvExport, DepartmentReport, DepartmentReportQuery, ReportQuery,
        SummaryReport,
    },
    state::AppState,
};

pub async fn attendance_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<AttendanceReportRow>>, AppError> {
    Ok(Json(state.reports.attendance_report(&query).await?))
}

pub async fn summary_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SummaryReport>, AppError> {
    Ok(Json(state.reports.summary_report(&query).await?))
}

pub async fn department_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DepartmentReportQuery>,
) -> Result<Json<DepartmentReport>, AppError> {
    let id = parse_department_id(&id)?;
    Ok(Json(
        state
            .reports
            .department_report(id, query.month, query.year)
            .await?,
    ))
}

pub async fn export_attendance(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<CsvExport>, AppError> {
    Ok(Json(state.reports.export_attendance(&query).await?))
}

pub async fn export_summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<CsvExport>, AppError> {
    Ok(Json(state.reports.export_summary(&query).await?))
}

pub async fn export_department(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DepartmentReportQuery>,
) -> Result<Json<CsvExport>, AppError> {
    let id = parse_department_id(&id)?;
    Ok(Json(
        state
            .reports
            .export_department(id, query.month, query.year)
            .await?,
    ))
}

//! Report payloads produced by the reporting service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::attendance::AttendanceStatus;
use crate::types::DepartmentId;

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DepartmentReportQuery {
    /// 1-12; defaults to the current month.
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// One attendance row with punctuality minutes derived from the current policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceReportRow {
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub date: NaiveDate,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    /// Absent until the row is clocked out.
    pub work_hours: Option<f64>,
    pub status: AttendanceStatus,
    pub late_minutes: i64,
    pub early_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryReport {
    /// `"<start> to <end>"`.
    pub period: String,
    pub total_employees: i64,
    pub total_present: i64,
    pub total_late: i64,
    pub total_absent: i64,
    pub total_work_hours: f64,
    pub average_work_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeMonthlyStats {
    pub total_present: i64,
    pub total_late: i64,
    pub total_absent: i64,
    pub avg_work_hours: f64,
    pub total_work_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeReportEntry {
    pub employee_id: String,
    pub employee_name: String,
    pub stats: EmployeeMonthlyStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentSummary {
    pub total_present: i64,
    pub total_late: i64,
    pub total_absent: i64,
    /// Percentage, `present / (present + absent) * 100`.
    pub attendance_rate: f64,
    pub average_work_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentReport {
    #[schema(value_type = String)]
    pub department_id: DepartmentId,
    pub department_name: String,
    /// `"YYYY-MM"`.
    pub period: String,
    pub total_employees: i64,
    pub employee_stats: Vec<EmployeeReportEntry>,
    pub summary: DepartmentSummary,
}

/// Rendered CSV handed back to the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CsvExport {
    pub csv_data: String,
    pub filename: String,
}

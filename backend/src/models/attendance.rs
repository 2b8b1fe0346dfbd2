//! Attendance rows (one per employee per calendar day) and their API shapes.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::UnknownVariant;
use crate::{
    services::punctuality::{Punctuality, PunctualityVerdict, ShiftPolicy},
    types::{AttendanceId, DepartmentId, EmployeeId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Late,
    HalfDay,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl TryFrom<String> for AttendanceStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "late" => Ok(AttendanceStatus::Late),
            "half_day" => Ok(AttendanceStatus::HalfDay),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(UnknownVariant {
                kind: "attendance status",
                value,
            }),
        }
    }
}

/// Stored attendance row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Attendance {
    pub id: AttendanceId,
    pub employee_id: EmployeeId,
    pub clock_in: DateTime<Utc>,
    /// Local calendar date of `clock_in`, kept for range queries.
    pub clock_in_date: NaiveDate,
    pub clock_out: Option<DateTime<Utc>>,
    /// Set exactly when `clock_out` is set.
    pub work_hours: Option<f64>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attendance row joined with its employee and the department's current policy.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AttendanceDetail {
    pub id: AttendanceId,
    pub employee_id: EmployeeId,
    pub employee_code: String,
    pub employee_name: String,
    pub department_id: DepartmentId,
    pub department_name: String,
    pub max_clock_in: String,
    pub max_clock_out: String,
    pub late_tolerance: i32,
    pub early_leave_penalty: i32,
    pub clock_in: DateTime<Utc>,
    pub clock_in_date: NaiveDate,
    pub clock_out: Option<DateTime<Utc>>,
    pub work_hours: Option<f64>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceDetail {
    pub fn policy(&self) -> ShiftPolicy {
        ShiftPolicy {
            max_clock_in: self.max_clock_in.clone(),
            max_clock_out: self.max_clock_out.clone(),
            late_tolerance: self.late_tolerance,
            early_leave_penalty: self.early_leave_penalty,
        }
    }

    /// Re-derives punctuality from the department's current policy.
    pub fn verdict(&self, tz: &Tz) -> PunctualityVerdict {
        let clock_in = self.clock_in.with_timezone(tz);
        let clock_out = self.clock_out.map(|value| value.with_timezone(tz));
        self.policy().verdict(&clock_in, clock_out.as_ref())
    }

    pub fn attendance(&self) -> Attendance {
        Attendance {
            id: self.id,
            employee_id: self.employee_id,
            clock_in: self.clock_in,
            clock_in_date: self.clock_in_date,
            clock_out: self.clock_out,
            work_hours: self.work_hours,
            status: self.status,
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ClockInRequest {
    /// Defaults to the caller's own employee code.
    pub employee_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ClockOutRequest {
    /// Defaults to the caller's own employee code.
    pub employee_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: String,
}

/// Attendance row annotated with punctuality, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(value_type = String)]
    pub id: AttendanceId,
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    pub clock_in: DateTime<Utc>,
    pub clock_in_date: NaiveDate,
    pub clock_out: Option<DateTime<Utc>>,
    pub work_hours: Option<f64>,
    pub status: AttendanceStatus,
    pub notes: String,
    pub is_late: bool,
    pub late_minutes: i64,
    pub is_early_leave: bool,
    pub early_minutes: i64,
    pub punctuality: Punctuality,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceResponse {
    pub fn new(attendance: Attendance, employee_code: String, verdict: PunctualityVerdict) -> Self {
        Self {
            id: attendance.id,
            employee_id: employee_code,
            employee_name: None,
            department_name: None,
            clock_in: attendance.clock_in,
            clock_in_date: attendance.clock_in_date,
            clock_out: attendance.clock_out,
            work_hours: attendance.work_hours,
            status: attendance.status,
            notes: attendance.notes,
            is_late: verdict.is_late,
            late_minutes: verdict.late_minutes,
            is_early_leave: verdict.is_early_leave,
            early_minutes: verdict.early_minutes,
            punctuality: verdict.punctuality,
            created_at: attendance.created_at,
            updated_at: attendance.updated_at,
        }
    }

    pub fn from_detail(detail: AttendanceDetail, tz: &Tz) -> Self {
        let verdict = detail.verdict(tz);
        let mut response = Self::new(detail.attendance(), detail.employee_code.clone(), verdict);
        response.employee_name = Some(detail.employee_name);
        response.department_name = Some(detail.department_name);
        response
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceLogQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub department_id: Option<DepartmentId>,
    /// Employee code filter.
    pub employee_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Filters for attendance range scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department_id: Option<DepartmentId>,
    pub employee_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    NotStarted,
    ClockedIn,
    ClockedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TodayStatusResponse {
    pub employee_id: String,
    pub date: NaiveDate,
    pub state: DayState,
    pub attendance: Option<AttendanceResponse>,
}

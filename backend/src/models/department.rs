//! Departments and the shift window each one enforces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::UnknownVariant;
use crate::{
    services::punctuality::ShiftPolicy,
    types::DepartmentId,
    validation::rules::validate_time_of_day,
};

pub const DEFAULT_LATE_TOLERANCE: i32 = 15;
pub const DEFAULT_EARLY_LEAVE_PENALTY: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentStatus {
    #[default]
    Active,
    Inactive,
}

impl DepartmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepartmentStatus::Active => "active",
            DepartmentStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<String> for DepartmentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(DepartmentStatus::Active),
            "inactive" => Ok(DepartmentStatus::Inactive),
            _ => Err(UnknownVariant {
                kind: "department status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    #[schema(value_type = String)]
    pub id: DepartmentId,
    pub name: String,
    pub description: String,
    /// Latest on-time clock-in, `HH:MM:SS`.
    pub max_clock_in: String,
    /// Earliest on-time clock-out, `HH:MM:SS`.
    pub max_clock_out: String,
    /// Grace minutes after `max_clock_in`.
    pub late_tolerance: i32,
    /// Grace minutes before `max_clock_out`.
    pub early_leave_penalty: i32,
    #[sqlx(try_from = "String")]
    pub status: DepartmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of employees assigned; only filled by list/get queries.
    #[sqlx(default)]
    pub employee_count: i64,
}

impl Department {
    pub fn policy(&self) -> ShiftPolicy {
        ShiftPolicy {
            max_clock_in: self.max_clock_in.clone(),
            max_clock_out: self.max_clock_out.clone(),
            late_tolerance: self.late_tolerance,
            early_leave_penalty: self.early_leave_penalty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_time_of_day"))]
    pub max_clock_in: String,
    #[validate(custom(function = "validate_time_of_day"))]
    pub max_clock_out: String,
    #[validate(range(min = 0, max = 1440))]
    pub late_tolerance: Option<i32>,
    #[validate(range(min = 0, max = 1440))]
    pub early_leave_penalty: Option<i32>,
    pub status: Option<DepartmentStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_time_of_day"))]
    pub max_clock_in: Option<String>,
    #[validate(custom(function = "validate_time_of_day"))]
    pub max_clock_out: Option<String>,
    #[validate(range(min = 0, max = 1440))]
    pub late_tolerance: Option<i32>,
    #[validate(range(min = 0, max = 1440))]
    pub early_leave_penalty: Option<i32>,
    pub status: Option<DepartmentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DepartmentListQuery {
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub status: Option<DepartmentStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

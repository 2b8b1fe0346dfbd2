//! Employees, identified externally by a stable code such as `EMP001`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::UnknownVariant;
use crate::{
    types::{DepartmentId, EmployeeId},
    validation::rules::validate_employee_code,
};

pub const EMPLOYEE_CODE_PREFIX: &str = "EMP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::Suspended => "suspended",
        }
    }
}

impl TryFrom<String> for EmployeeStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(EmployeeStatus::Active),
            "inactive" => Ok(EmployeeStatus::Inactive),
            "suspended" => Ok(EmployeeStatus::Suspended),
            _ => Err(UnknownVariant {
                kind: "employee status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    #[serde(skip)]
    pub id: EmployeeId,
    /// Stable public code, e.g. `EMP001`.
    #[serde(rename = "employee_id")]
    pub employee_code: String,
    #[schema(value_type = String)]
    pub department_id: DepartmentId,
    #[sqlx(default)]
    pub department_name: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub position: String,
    #[sqlx(try_from = "String")]
    pub status: EmployeeStatus,
    pub join_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

/// Formats the `n`th generated code: `EMP001`, `EMP042`, `EMP1000`.
pub fn format_employee_code(sequence: i64) -> String {
    format!("{}{:03}", EMPLOYEE_CODE_PREFIX, sequence)
}

/// Extracts the numeric suffix of a generated code.
pub fn employee_code_sequence(code: &str) -> Option<i64> {
    code.strip_prefix(EMPLOYEE_CODE_PREFIX)?.parse().ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeRequest {
    /// Generated as the next `EMP###` code when omitted.
    #[validate(custom(function = "validate_employee_code"))]
    pub employee_id: Option<String>,
    #[schema(value_type = String)]
    pub department_id: DepartmentId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub position: String,
    pub status: Option<EmployeeStatus>,
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateEmployeeResponse {
    pub employee: Employee,
    pub setup_token: String,
    pub setup_url: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    /// New employee code; cascades to the linked user account.
    #[validate(custom(function = "validate_employee_code"))]
    pub employee_id: Option<String>,
    #[schema(value_type = Option<String>)]
    pub department_id: Option<DepartmentId>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub position: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateEmployeeStatusRequest {
    pub status: EmployeeStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EmployeeListQuery {
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub department_id: Option<DepartmentId>,
    pub status: Option<EmployeeStatus>,
    /// Case-insensitive match on name, code or position.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Filters for employee listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub department_id: Option<DepartmentId>,
    pub status: Option<EmployeeStatus>,
    pub search: Option<String>,
}

impl From<&EmployeeListQuery> for EmployeeFilter {
    fn from(query: &EmployeeListQuery) -> Self {
        Self {
            department_id: query.department_id,
            status: query.status,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SetupTokenResponse {
    pub employee_id: String,
    pub username: String,
    pub email: String,
    pub setup_token: String,
    pub expires_at: DateTime<Utc>,
    pub setup_url: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::UnknownVariant;
use crate::types::{AttendanceHistoryId, AttendanceId, EmployeeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEntryType {
    ClockIn,
    ClockOut,
}

impl HistoryEntryType {
    pub fn code(&self) -> i16 {
        match self {
            HistoryEntryType::ClockIn => 1,
            HistoryEntryType::ClockOut => 2,
        }
    }
}

impl TryFrom<i16> for HistoryEntryType {
    type Error = UnknownVariant;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HistoryEntryType::ClockIn),
            2 => Ok(HistoryEntryType::ClockOut),
            other => Err(UnknownVariant {
                kind: "history entry type",
                value: other.to_string(),
            }),
        }
    }
}

/// Append-only audit entry for an attendance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceHistory {
    #[schema(value_type = String)]
    pub id: AttendanceHistoryId,
    #[schema(value_type = String)]
    pub attendance_id: AttendanceId,
    #[serde(skip)]
    pub employee_id: EmployeeId,
    #[sqlx(try_from = "i16")]
    pub entry_type: HistoryEntryType,
    pub description: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    /// Username of the account that triggered the entry.
    pub changed_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AttendanceHistory {
    pub fn new(
        attendance_id: AttendanceId,
        employee_id: EmployeeId,
        entry_type: HistoryEntryType,
        description: String,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttendanceHistoryId::new(),
            attendance_id,
            employee_id,
            entry_type,
            description,
            previous_value: None,
            new_value: None,
            changed_by: None,
            recorded_at,
        }
    }

    pub fn with_values(mut self, previous: Option<String>, new: Option<String>) -> Self {
        self.previous_value = previous;
        self.new_value = new;
        self
    }

    pub fn by_actor(mut self, actor: Option<String>) -> Self {
        self.changed_by = actor;
        self
    }
}

//! Clock-in / clock-out lifecycle.
//!
//! Each (employee, local day) moves `NoRecord -> Open -> Closed` and never
//! back. The storage layer closes the check-then-write races: a unique key
//! on `(employee_id, clock_in_date)` for clock-in and a conditional update
//! for clock-out.

use std::sync::Arc;

use chrono_tz::Tz;

use super::punctuality::{work_hours, ShiftPolicy};
use crate::{
    error::AppError,
    models::{
        attendance::{
            Attendance, AttendanceFilter, AttendanceResponse, AttendanceStatus, DayState,
            TodayStatusResponse,
        },
        attendance_history::{AttendanceHistory, HistoryEntryType},
        employee::Employee,
        PageRequest, PaginatedResponse,
    },
    repositories::{
        attendance::AttendanceRepositoryTrait, department::DepartmentRepositoryTrait,
        employee::EmployeeRepositoryTrait,
    },
    types::AttendanceId,
    utils::time::{in_timezone, local_date, Clock},
};

const NOTE_SEPARATOR: &str = " | ";

fn append_note(notes: &str, addition: &str) -> String {
    let notes = notes.trim();
    let addition = addition.trim();
    match (notes.is_empty(), addition.is_empty()) {
        (true, _) => addition.to_string(),
        (false, true) => notes.to_string(),
        (false, false) => format!("{}{}{}", notes, NOTE_SEPARATOR, addition),
    }
}

#[derive(Clone)]
pub struct AttendanceService {
    employees: Arc<dyn EmployeeRepositoryTrait>,
    departments: Arc<dyn DepartmentRepositoryTrait>,
    attendance: Arc<dyn AttendanceRepositoryTrait>,
    clock: Arc<dyn Clock>,
    time_zone: Tz,
}

impl AttendanceService {
    pub fn new(
        employees: Arc<dyn EmployeeRepositoryTrait>,
        departments: Arc<dyn DepartmentRepositoryTrait>,
        attendance: Arc<dyn AttendanceRepositoryTrait>,
        clock: Arc<dyn Clock>,
        time_zone: Tz,
    ) -> Self {
        Self {
            employees,
            departments,
            attendance,
            clock,
            time_zone,
        }
    }

    async fn employee(&self, code: &str) -> Result<Employee, AppError> {
        self.employees
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))
    }

    /// Current policy of the employee's department. A missing department
    /// yields an empty policy, which never flags anything.
    async fn policy_for(&self, employee: &Employee) -> Result<ShiftPolicy, AppError> {
        let policy = self
            .departments
            .find_by_id(employee.department_id)
            .await?
            .map(|department| department.policy())
            .unwrap_or_else(|| ShiftPolicy {
                max_clock_in: String::new(),
                max_clock_out: String::new(),
                late_tolerance: 0,
                early_leave_penalty: 0,
            });
        Ok(policy)
    }

    fn respond(
        &self,
        attendance: Attendance,
        employee: &Employee,
        policy: &ShiftPolicy,
    ) -> AttendanceResponse {
        let clock_in = in_timezone(attendance.clock_in, &self.time_zone);
        let clock_out = attendance
            .clock_out
            .map(|at| in_timezone(at, &self.time_zone));
        let verdict = policy.verdict(&clock_in, clock_out.as_ref());
        let mut response =
            AttendanceResponse::new(attendance, employee.employee_code.clone(), verdict);
        response.employee_name = Some(employee.name.clone());
        response.department_name = employee.department_name.clone();
        response
    }

    /// Opens today's attendance row for `code`.
    pub async fn clock_in(
        &self,
        code: &str,
        notes: &str,
        actor: Option<String>,
    ) -> Result<AttendanceResponse, AppError> {
        let employee = self.employee(code).await?;
        if !employee.is_active() {
            return Err(AppError::InvalidState("Employee is not active".into()));
        }

        let now = self.clock.now();
        let today = local_date(now, &self.time_zone);
        if self
            .attendance
            .find_for_day(employee.id, today)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already clocked in today".into()));
        }

        let policy = self.policy_for(&employee).await?;
        let check = policy.clock_in(&in_timezone(now, &self.time_zone));
        let (status, notes) = if check.is_late {
            (
                AttendanceStatus::Late,
                append_note(notes, &format!("Late by {} minutes", check.late_minutes)),
            )
        } else {
            (AttendanceStatus::Present, append_note(notes, ""))
        };

        let attendance = Attendance {
            id: AttendanceId::new(),
            employee_id: employee.id,
            clock_in: now,
            clock_in_date: today,
            clock_out: None,
            work_hours: None,
            status,
            notes,
            created_at: now,
            updated_at: now,
        };
        let description = if check.is_late {
            format!(
                "Clocked in late by {} minutes at {}",
                check.late_minutes,
                in_timezone(now, &self.time_zone).format("%H:%M:%S")
            )
        } else {
            format!(
                "Clocked in at {}",
                in_timezone(now, &self.time_zone).format("%H:%M:%S")
            )
        };
        let history = AttendanceHistory::new(
            attendance.id,
            employee.id,
            HistoryEntryType::ClockIn,
            description,
            now,
        )
        .with_values(None, Some(now.to_rfc3339()))
        .by_actor(actor);

        let saved = self
            .attendance
            .open_with_history(&attendance, &history)
            .await?;

        tracing::info!(
            employee_id = %employee.employee_code,
            attendance_id = %saved.id,
            date = %today,
            late = check.is_late,
            late_minutes = check.late_minutes,
            "Employee clocked in"
        );

        Ok(self.respond(saved, &employee, &policy))
    }

    /// Closes today's open attendance row for `code`.
    pub async fn clock_out(
        &self,
        code: &str,
        notes: &str,
        actor: Option<String>,
    ) -> Result<AttendanceResponse, AppError> {
        let employee = self.employee(code).await?;

        let now = self.clock.now();
        let today = local_date(now, &self.time_zone);
        let open = self
            .attendance
            .find_for_day(employee.id, today)
            .await?
            .ok_or_else(|| AppError::NotFound("No clock-in record found for today".into()))?;
        if open.clock_out.is_some() {
            return Err(AppError::Conflict("Already clocked out today".into()));
        }
        if now < open.clock_in {
            return Err(AppError::InvalidState(
                "Clock-out cannot be earlier than clock-in".into(),
            ));
        }

        let policy = self.policy_for(&employee).await?;
        let check = policy.clock_out(&in_timezone(now, &self.time_zone));
        let hours = work_hours(open.clock_in, now);

        let mut updated_notes = append_note(&open.notes, notes);
        if check.is_early {
            updated_notes = append_note(
                &updated_notes,
                &format!("Left early by {} minutes", check.early_minutes),
            );
        }

        let closed = Attendance {
            clock_out: Some(now),
            work_hours: Some(hours),
            notes: updated_notes,
            updated_at: now,
            ..open
        };
        let description = if check.is_early {
            format!(
                "Clocked out early by {} minutes after {:.2} hours",
                check.early_minutes, hours
            )
        } else {
            format!("Clocked out after {:.2} hours", hours)
        };
        let history = AttendanceHistory::new(
            closed.id,
            employee.id,
            HistoryEntryType::ClockOut,
            description,
            now,
        )
        .with_values(None, Some(now.to_rfc3339()))
        .by_actor(actor);

        let saved = self
            .attendance
            .close_with_history(&closed, &history)
            .await?;

        tracing::info!(
            employee_id = %employee.employee_code,
            attendance_id = %saved.id,
            work_hours = hours,
            early = check.is_early,
            early_minutes = check.early_minutes,
            "Employee clocked out"
        );

        Ok(self.respond(saved, &employee, &policy))
    }

    pub async fn logs(
        &self,
        filter: AttendanceFilter,
        page: PageRequest,
    ) -> Result<PaginatedResponse<AttendanceResponse>, AppError> {
        let (rows, total) = self.attendance.list_page(filter, page).await?;
        let data = rows
            .into_iter()
            .map(|detail| AttendanceResponse::from_detail(detail, &self.time_zone))
            .collect();
        Ok(PaginatedResponse::new(data, page, total))
    }

    pub async fn today(&self, code: &str) -> Result<TodayStatusResponse, AppError> {
        let employee = self.employee(code).await?;
        let today = local_date(self.clock.now(), &self.time_zone);

        let attendance = match self.attendance.find_for_day(employee.id, today).await? {
            Some(row) => self
                .attendance
                .find_detail(row.id)
                .await?
                .map(|detail| AttendanceResponse::from_detail(detail, &self.time_zone)),
            None => None,
        };
        let state = match &attendance {
            None => DayState::NotStarted,
            Some(record) if record.clock_out.is_none() => DayState::ClockedIn,
            Some(_) => DayState::ClockedOut,
        };

        Ok(TodayStatusResponse {
            employee_id: employee.employee_code,
            date: today,
            state,
            attendance,
        })
    }

    /// Audit entries of one record. `owner` restricts access to that employee's rows.
    pub async fn history(
        &self,
        id: AttendanceId,
        owner: Option<&str>,
    ) -> Result<Vec<AttendanceHistory>, AppError> {
        let detail = self
            .attendance
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;
        if let Some(code) = owner {
            if detail.employee_code != code {
                return Err(AppError::Forbidden(
                    "You can only view your own attendance".into(),
                ));
            }
        }
        self.attendance.history_for(id).await
    }
}

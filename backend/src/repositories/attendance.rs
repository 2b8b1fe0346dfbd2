//! Attendance persistence.
//!
//! Clock-in and clock-out each write the attendance row and its history
//! entry in one transaction. The `(employee_id, clock_in_date)` unique key
//! serialises concurrent clock-ins; clock-out only updates rows whose
//! `clock_out` is still NULL.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    common::push_clause,
    transaction::{begin_transaction, commit_transaction},
};
use crate::{
    error::AppError,
    models::{
        attendance::{Attendance, AttendanceDetail, AttendanceFilter},
        attendance_history::AttendanceHistory,
        PageRequest,
    },
    types::{AttendanceId, EmployeeId},
};

const SELECT_COLUMNS: &str = "id, employee_id, clock_in, clock_in_date, clock_out, work_hours, \
     status, notes, created_at, updated_at";

const DETAIL_COLUMNS: &str = "a.id, a.employee_id, e.employee_code, e.name AS employee_name, \
     d.id AS department_id, d.name AS department_name, d.max_clock_in, d.max_clock_out, \
     d.late_tolerance, d.early_leave_penalty, a.clock_in, a.clock_in_date, a.clock_out, \
     a.work_hours, a.status, a.notes, a.created_at, a.updated_at";

const DETAIL_FROM: &str = " FROM attendance a \
     JOIN employees e ON e.id = a.employee_id \
     JOIN departments d ON d.id = e.department_id";

const HISTORY_COLUMNS: &str = "id, attendance_id, employee_id, entry_type, description, \
     previous_value, new_value, changed_by, recorded_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepositoryTrait: Send + Sync {
    /// The employee's row for a local calendar date, open or closed.
    async fn find_for_day(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError>;

    /// Inserts a new open row plus its clock-in history entry.
    /// A second row for the same employee and day fails with `Conflict`.
    async fn open_with_history(
        &self,
        attendance: &Attendance,
        history: &AttendanceHistory,
    ) -> Result<Attendance, AppError>;

    /// Closes an open row plus its clock-out history entry.
    /// A row that is already closed fails with `Conflict`.
    async fn close_with_history(
        &self,
        attendance: &Attendance,
        history: &AttendanceHistory,
    ) -> Result<Attendance, AppError>;

    async fn find_detail(&self, id: AttendanceId) -> Result<Option<AttendanceDetail>, AppError>;

    /// One page of rows matching the filter, newest first, plus the total count.
    async fn list_page(
        &self,
        filter: AttendanceFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttendanceDetail>, i64), AppError>;

    /// Every row matching the filter, oldest first.
    async fn scan(&self, filter: AttendanceFilter) -> Result<Vec<AttendanceDetail>, AppError>;

    async fn history_for(&self, id: AttendanceId) -> Result<Vec<AttendanceHistory>, AppError>;
}

#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &AttendanceFilter) {
    let mut has_clause = false;
    if let Some(start) = filter.start_date {
        push_clause(builder, &mut has_clause);
        builder.push("a.clock_in_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        push_clause(builder, &mut has_clause);
        builder.push("a.clock_in_date <= ").push_bind(end);
    }
    if let Some(department_id) = filter.department_id {
        push_clause(builder, &mut has_clause);
        builder.push("e.department_id = ").push_bind(department_id);
    }
    if let Some(code) = filter.employee_code.clone() {
        push_clause(builder, &mut has_clause);
        builder.push("e.employee_code = ").push_bind(code);
    }
}

async fn insert_history(
    tx: &mut sqlx::PgConnection,
    history: &AttendanceHistory,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO attendance_history (id, attendance_id, employee_id, entry_type, \
         description, previous_value, new_value, changed_by, recorded_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(history.id)
    .bind(history.attendance_id)
    .bind(history.employee_id)
    .bind(history.entry_type.code())
    .bind(&history.description)
    .bind(&history.previous_value)
    .bind(&history.new_value)
    .bind(&history.changed_by)
    .bind(history.recorded_at)
    .execute(tx)
    .await?;
    Ok(())
}

#[async_trait]
impl AttendanceRepositoryTrait for AttendanceRepository {
    async fn find_for_day(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError> {
        let query = format!(
            "SELECT {} FROM attendance WHERE employee_id = $1 AND clock_in_date = $2",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn open_with_history(
        &self,
        attendance: &Attendance,
        history: &AttendanceHistory,
    ) -> Result<Attendance, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!(
            "INSERT INTO attendance (id, employee_id, clock_in, clock_in_date, clock_out, \
             work_hours, status, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NULL, NULL, $5, $6, $7, $8) \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(attendance.id)
            .bind(attendance.employee_id)
            .bind(attendance.clock_in)
            .bind(attendance.clock_in_date)
            .bind(attendance.status.as_str())
            .bind(&attendance.notes)
            .bind(attendance.created_at)
            .bind(attendance.updated_at)
            .fetch_one(tx.as_mut())
            .await?;

        insert_history(tx.as_mut(), history).await?;
        commit_transaction(tx).await?;
        Ok(row)
    }

    async fn close_with_history(
        &self,
        attendance: &Attendance,
        history: &AttendanceHistory,
    ) -> Result<Attendance, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!(
            "UPDATE attendance SET clock_out = $2, work_hours = $3, notes = $4, updated_at = $5 \
             WHERE id = $1 AND clock_out IS NULL \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(attendance.id)
            .bind(attendance.clock_out)
            .bind(attendance.work_hours)
            .bind(&attendance.notes)
            .bind(attendance.updated_at)
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or_else(|| AppError::Conflict("Already clocked out today".into()))?;

        insert_history(tx.as_mut(), history).await?;
        commit_transaction(tx).await?;
        Ok(row)
    }

    async fn find_detail(&self, id: AttendanceId) -> Result<Option<AttendanceDetail>, AppError> {
        let query = format!("SELECT {}{} WHERE a.id = $1", DETAIL_COLUMNS, DETAIL_FROM);
        let row = sqlx::query_as::<_, AttendanceDetail>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_page(
        &self,
        filter: AttendanceFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttendanceDetail>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*){}", DETAIL_FROM));
        push_filters(&mut count_builder, &filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {}{}", DETAIL_COLUMNS, DETAIL_FROM));
        push_filters(&mut builder, &filter);
        builder
            .push(" ORDER BY a.clock_in DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = builder
            .build_query_as::<AttendanceDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn scan(&self, filter: AttendanceFilter) -> Result<Vec<AttendanceDetail>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {}{}", DETAIL_COLUMNS, DETAIL_FROM));
        push_filters(&mut builder, &filter);
        builder.push(" ORDER BY a.clock_in_date, e.employee_code");
        let rows = builder
            .build_query_as::<AttendanceDetail>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn history_for(&self, id: AttendanceId) -> Result<Vec<AttendanceHistory>, AppError> {
        let query = format!(
            "SELECT {} FROM attendance_history WHERE attendance_id = $1 ORDER BY recorded_at, entry_type",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceHistory>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

//! Department persistence.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::common::{contains_pattern, push_clause};
use crate::{
    error::AppError,
    models::{
        department::{Department, DepartmentStatus},
        PageRequest,
    },
    types::DepartmentId,
};

const SELECT_COLUMNS: &str = "d.id, d.name, d.description, d.max_clock_in, d.max_clock_out, \
     d.late_tolerance, d.early_leave_penalty, d.status, d.created_at, d.updated_at, \
     (SELECT COUNT(*) FROM employees e WHERE e.department_id = d.id) AS employee_count";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepartmentRepositoryTrait: Send + Sync {
    async fn create(&self, department: &Department) -> Result<Department, AppError>;

    async fn find_by_id(&self, id: DepartmentId) -> Result<Option<Department>, AppError>;

    async fn list(
        &self,
        search: Option<String>,
        status: Option<DepartmentStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Department>, i64), AppError>;

    async fn update(&self, department: &Department) -> Result<Department, AppError>;

    async fn delete(&self, id: DepartmentId) -> Result<(), AppError>;

    async fn count_employees(&self, id: DepartmentId) -> Result<i64, AppError>;
}

#[derive(Debug, Clone)]
pub struct DepartmentRepository {
    pool: PgPool,
}

impl DepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    search: &'a Option<String>,
    status: Option<DepartmentStatus>,
) {
    let mut has_clause = false;
    if let Some(term) = search {
        push_clause(builder, &mut has_clause);
        let pattern = contains_pattern(term);
        builder
            .push("(LOWER(d.name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(d.description) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = status {
        push_clause(builder, &mut has_clause);
        builder.push("d.status = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl DepartmentRepositoryTrait for DepartmentRepository {
    async fn create(&self, department: &Department) -> Result<Department, AppError> {
        sqlx::query(
            "INSERT INTO departments (id, name, description, max_clock_in, max_clock_out, \
             late_tolerance, early_leave_penalty, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(department.id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(&department.max_clock_in)
        .bind(&department.max_clock_out)
        .bind(department.late_tolerance)
        .bind(department.early_leave_penalty)
        .bind(department.status.as_str())
        .bind(department.created_at)
        .bind(department.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(department.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".into()))
    }

    async fn find_by_id(&self, id: DepartmentId) -> Result<Option<Department>, AppError> {
        let query = format!("SELECT {} FROM departments d WHERE d.id = $1", SELECT_COLUMNS);
        let department = sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(department)
    }

    async fn list(
        &self,
        search: Option<String>,
        status: Option<DepartmentStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Department>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM departments d");
        push_filters(&mut count_builder, &search, status);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM departments d", SELECT_COLUMNS));
        push_filters(&mut builder, &search, status);
        builder
            .push(" ORDER BY d.name LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let departments = builder
            .build_query_as::<Department>()
            .fetch_all(&self.pool)
            .await?;

        Ok((departments, total))
    }

    async fn update(&self, department: &Department) -> Result<Department, AppError> {
        let result = sqlx::query(
            "UPDATE departments SET name = $2, description = $3, max_clock_in = $4, \
             max_clock_out = $5, late_tolerance = $6, early_leave_penalty = $7, status = $8, \
             updated_at = $9 WHERE id = $1",
        )
        .bind(department.id)
        .bind(&department.name)
        .bind(&department.description)
        .bind(&department.max_clock_in)
        .bind(&department.max_clock_out)
        .bind(department.late_tolerance)
        .bind(department.early_leave_penalty)
        .bind(department.status.as_str())
        .bind(department.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Department not found".into()));
        }

        self.find_by_id(department.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".into()))
    }

    async fn delete(&self, id: DepartmentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict("Department still has employees".into())
                }
                other => other.into(),
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Department not found".into()));
        }
        Ok(())
    }

    async fn count_employees(&self, id: DepartmentId) -> Result<i64, AppError> {
        let total = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE department_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

//! Employee persistence, including the user account linked to each employee.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    common::{contains_pattern, push_clause},
    transaction::{begin_transaction, commit_transaction},
};
use crate::{
    error::AppError,
    models::{
        employee::{
            employee_code_sequence, format_employee_code, Employee, EmployeeFilter,
            EmployeeStatus, EMPLOYEE_CODE_PREFIX,
        },
        user::User,
        PageRequest,
    },
    types::{DepartmentId, EmployeeId},
};

const SELECT_COLUMNS: &str = "e.id, e.employee_code, e.department_id, d.name AS department_name, \
     e.name, e.email, e.phone, e.address, e.position, e.status, e.join_date, e.created_at, \
     e.updated_at";
const FROM_CLAUSE: &str = " FROM employees e JOIN departments d ON d.id = e.department_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepositoryTrait: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Employee>, AppError>;

    async fn list(
        &self,
        filter: EmployeeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Employee>, i64), AppError>;

    async fn find_by_department(&self, id: DepartmentId) -> Result<Vec<Employee>, AppError>;

    /// Next unused `EMP###` code.
    async fn next_code(&self) -> Result<String, AppError>;

    /// Inserts the employee and its pending account atomically.
    async fn create_with_account(
        &self,
        employee: &Employee,
        account: &User,
    ) -> Result<Employee, AppError>;

    /// Saves `employee`; a changed code is carried over to the linked account.
    async fn update(&self, previous_code: &str, employee: &Employee)
        -> Result<Employee, AppError>;

    /// Marks the employee inactive and disables the linked account.
    async fn deactivate(&self, code: &str) -> Result<Employee, AppError>;

    /// Active employees, optionally restricted to one department.
    async fn count_active(&self, department_id: Option<DepartmentId>) -> Result<i64, AppError>;
}

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: EmployeeId) -> Result<Employee, AppError> {
        let query = format!("SELECT {}{} WHERE e.id = $1", SELECT_COLUMNS, FROM_CLAUSE);
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &EmployeeFilter) {
    let mut has_clause = false;
    if let Some(department_id) = filter.department_id {
        push_clause(builder, &mut has_clause);
        builder.push("e.department_id = ").push_bind(department_id);
    }
    if let Some(status) = filter.status {
        push_clause(builder, &mut has_clause);
        builder.push("e.status = ").push_bind(status.as_str());
    }
    if let Some(term) = filter.search.as_deref() {
        push_clause(builder, &mut has_clause);
        let pattern = contains_pattern(term);
        builder
            .push("(LOWER(e.name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(e.employee_code) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(e.position) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl EmployeeRepositoryTrait for EmployeeRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Employee>, AppError> {
        let query = format!(
            "SELECT {}{} WHERE e.employee_code = $1",
            SELECT_COLUMNS, FROM_CLAUSE
        );
        let employee = sqlx::query_as::<_, Employee>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn list(
        &self,
        filter: EmployeeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*){}", FROM_CLAUSE));
        push_filters(&mut count_builder, &filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {}{}", SELECT_COLUMNS, FROM_CLAUSE));
        push_filters(&mut builder, &filter);
        builder
            .push(" ORDER BY e.employee_code LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let employees = builder
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;

        Ok((employees, total))
    }

    async fn find_by_department(&self, id: DepartmentId) -> Result<Vec<Employee>, AppError> {
        let query = format!(
            "SELECT {}{} WHERE e.department_id = $1 ORDER BY e.employee_code",
            SELECT_COLUMNS, FROM_CLAUSE
        );
        let employees = sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn next_code(&self) -> Result<String, AppError> {
        let codes: Vec<String> =
            sqlx::query_scalar("SELECT employee_code FROM employees WHERE employee_code LIKE $1")
                .bind(format!("{}%", EMPLOYEE_CODE_PREFIX))
                .fetch_all(&self.pool)
                .await?;
        let highest = codes
            .iter()
            .filter_map(|code| employee_code_sequence(code))
            .max()
            .unwrap_or(0);
        Ok(format_employee_code(highest + 1))
    }

    async fn create_with_account(
        &self,
        employee: &Employee,
        account: &User,
    ) -> Result<Employee, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        sqlx::query(
            "INSERT INTO employees (id, employee_code, department_id, name, email, phone, \
             address, position, status, join_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(employee.id)
        .bind(&employee.employee_code)
        .bind(employee.department_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(&employee.position)
        .bind(employee.status.as_str())
        .bind(employee.join_date)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(tx.as_mut())
        .await?;

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, employee_code, \
             is_active, setup_token, setup_token_expires_at, last_login_at, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.employee_code)
        .bind(account.is_active)
        .bind(&account.setup_token)
        .bind(account.setup_token_expires_at)
        .bind(account.last_login_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(tx.as_mut())
        .await?;

        commit_transaction(tx).await?;
        self.find_by_id(employee.id).await
    }

    async fn update(
        &self,
        previous_code: &str,
        employee: &Employee,
    ) -> Result<Employee, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let result = sqlx::query(
            "UPDATE employees SET employee_code = $2, department_id = $3, name = $4, email = $5, \
             phone = $6, address = $7, position = $8, status = $9, join_date = $10, \
             updated_at = $11 WHERE id = $1",
        )
        .bind(employee.id)
        .bind(&employee.employee_code)
        .bind(employee.department_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(&employee.position)
        .bind(employee.status.as_str())
        .bind(employee.join_date)
        .bind(employee.updated_at)
        .execute(tx.as_mut())
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Employee not found".into()));
        }

        if previous_code != employee.employee_code {
            sqlx::query(
                "UPDATE users SET employee_code = $2, updated_at = $3 WHERE employee_code = $1",
            )
            .bind(previous_code)
            .bind(&employee.employee_code)
            .bind(employee.updated_at)
            .execute(tx.as_mut())
            .await?;
        }

        commit_transaction(tx).await?;
        self.find_by_id(employee.id).await
    }

    async fn deactivate(&self, code: &str) -> Result<Employee, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let id: Option<EmployeeId> = sqlx::query_scalar(
            "UPDATE employees SET status = $2, updated_at = NOW() WHERE employee_code = $1 \
             RETURNING id",
        )
        .bind(code)
        .bind(EmployeeStatus::Inactive.as_str())
        .fetch_optional(tx.as_mut())
        .await?;
        let id = id.ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

        sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE employee_code = $1",
        )
        .bind(code)
        .execute(tx.as_mut())
        .await?;

        commit_transaction(tx).await?;
        self.find_by_id(id).await
    }

    async fn count_active(&self, department_id: Option<DepartmentId>) -> Result<i64, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM employees e WHERE e.status = ");
        builder.push_bind(EmployeeStatus::Active.as_str());
        if let Some(department_id) = department_id {
            builder.push(" AND e.department_id = ").push_bind(department_id);
        }
        let total = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }
}

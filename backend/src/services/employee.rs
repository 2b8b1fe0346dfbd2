//! Employee administration and the pending accounts created alongside employees.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use super::notifier::Notifier;
use crate::{
    config::Config,
    error::AppError,
    models::{
        employee::{
            CreateEmployeeRequest, CreateEmployeeResponse, Employee, EmployeeListQuery,
            EmployeeFilter, EmployeeStatus, SetupTokenResponse, UpdateEmployeeRequest,
        },
        user::{User, UserRole},
        PageRequest, PaginatedResponse,
    },
    repositories::{
        department::DepartmentRepositoryTrait, employee::EmployeeRepositoryTrait,
        user::UserRepositoryTrait,
    },
    types::{DepartmentId, EmployeeId},
    utils::{
        password::generate_setup_token,
        time::{local_date, Clock},
    },
};

pub fn setup_url(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/setup-account?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}

#[derive(Clone)]
pub struct EmployeeService {
    employees: Arc<dyn EmployeeRepositoryTrait>,
    departments: Arc<dyn DepartmentRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl EmployeeService {
    pub fn new(
        employees: Arc<dyn EmployeeRepositoryTrait>,
        departments: Arc<dyn DepartmentRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        Self {
            employees,
            departments,
            users,
            notifier,
            clock,
            config,
        }
    }

    fn token_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.config.setup_token_ttl_days.max(1))
    }

    async fn ensure_department(&self, id: DepartmentId) -> Result<(), AppError> {
        match self.departments.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Department not found".into())),
        }
    }

    async fn ensure_code_unused(&self, code: &str) -> Result<(), AppError> {
        if self.employees.find_by_code(code).await?.is_some() {
            return Err(AppError::Conflict("Employee ID already exists".into()));
        }
        Ok(())
    }

    /// Creates the employee plus an inactive account with a setup token, then
    /// sends the setup e-mail. A failed e-mail only changes the message.
    pub async fn create(
        &self,
        request: CreateEmployeeRequest,
    ) -> Result<CreateEmployeeResponse, AppError> {
        request.validate()?;

        let code = match request
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => {
                self.ensure_code_unused(code).await?;
                code.to_string()
            }
            None => self.employees.next_code().await?,
        };
        self.ensure_department(request.department_id).await?;

        let now = self.clock.now();
        let email = request.email.trim().to_lowercase();
        let employee = Employee {
            id: EmployeeId::new(),
            employee_code: code.clone(),
            department_id: request.department_id,
            department_name: None,
            name: request.name.trim().to_string(),
            email: email.clone(),
            phone: request.phone.trim().to_string(),
            address: request.address.trim().to_string(),
            position: request.position.trim().to_string(),
            status: request.status.unwrap_or_default(),
            join_date: request
                .join_date
                .unwrap_or_else(|| local_date(now, &self.config.time_zone)),
            created_at: now,
            updated_at: now,
        };

        let token = generate_setup_token();
        let account = User::pending(
            code.to_lowercase(),
            email.clone(),
            UserRole::Employee,
            Some(code.clone()),
            token.clone(),
            self.token_expiry(now),
            now,
        );

        let created = self
            .employees
            .create_with_account(&employee, &account)
            .await?;
        tracing::info!(employee_id = %created.employee_code, "Employee created");

        let link = setup_url(&self.config.frontend_url, &token);
        let message = match self
            .notifier
            .send_account_setup(
                &email,
                &created.name,
                &link,
                self.config.setup_token_ttl_days,
            )
            .await
        {
            Ok(()) => format!(
                "Employee created. A setup e-mail has been sent to {}.",
                email
            ),
            Err(err) => {
                tracing::warn!(
                    employee_id = %created.employee_code,
                    error = %err,
                    "Failed to send account setup e-mail"
                );
                "Employee created, but the setup e-mail could not be sent. Share the setup link manually."
                    .to_string()
            }
        };

        Ok(CreateEmployeeResponse {
            employee: created,
            setup_token: token,
            setup_url: link,
            message,
        })
    }

    pub async fn list(
        &self,
        query: EmployeeListQuery,
    ) -> Result<PaginatedResponse<Employee>, AppError> {
        let page = PageRequest::new(query.page, query.limit);
        let filter = EmployeeFilter::from(&query);
        let (employees, total) = self.employees.list(filter, page).await?;
        Ok(PaginatedResponse::new(employees, page, total))
    }

    pub async fn get(&self, code: &str) -> Result<Employee, AppError> {
        self.employees
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))
    }

    /// Applies a partial update. A new code must be unused and is carried
    /// over to the linked account.
    pub async fn update(
        &self,
        code: &str,
        request: UpdateEmployeeRequest,
    ) -> Result<Employee, AppError> {
        request.validate()?;
        let mut employee = self.get(code).await?;

        if let Some(new_code) = request
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|new_code| !new_code.is_empty() && *new_code != code)
        {
            self.ensure_code_unused(new_code).await?;
            employee.employee_code = new_code.to_string();
        }
        if let Some(department_id) = request.department_id {
            if department_id != employee.department_id {
                self.ensure_department(department_id).await?;
                employee.department_id = department_id;
            }
        }
        if let Some(name) = request.name {
            employee.name = name.trim().to_string();
        }
        if let Some(email) = request.email {
            employee.email = email.trim().to_lowercase();
        }
        if let Some(phone) = request.phone {
            employee.phone = phone.trim().to_string();
        }
        if let Some(address) = request.address {
            employee.address = address.trim().to_string();
        }
        if let Some(position) = request.position {
            employee.position = position.trim().to_string();
        }
        if let Some(status) = request.status {
            employee.status = status;
        }
        if let Some(join_date) = request.join_date {
            employee.join_date = join_date;
        }
        employee.updated_at = self.clock.now();

        let updated = self.employees.update(code, &employee).await?;
        if updated.employee_code != code {
            tracing::info!(
                previous = %code,
                employee_id = %updated.employee_code,
                "Employee code changed"
            );
        }
        Ok(updated)
    }

    pub async fn update_status(
        &self,
        code: &str,
        status: EmployeeStatus,
    ) -> Result<Employee, AppError> {
        let mut employee = self.get(code).await?;
        employee.status = status;
        employee.updated_at = self.clock.now();
        self.employees.update(code, &employee).await
    }

    /// Soft delete: the employee becomes inactive and the account is disabled.
    pub async fn deactivate(&self, code: &str) -> Result<Employee, AppError> {
        let employee = self.employees.deactivate(code).await?;
        tracing::info!(employee_id = %code, "Employee deactivated");
        Ok(employee)
    }

    /// Returns the pending setup token, issuing a fresh one when it has expired.
    pub async fn setup_token(&self, code: &str) -> Result<SetupTokenResponse, AppError> {
        let employee = self.get(code).await?;
        let user = self
            .users
            .find_by_employee_code(&employee.employee_code)
            .await?
            .ok_or_else(|| AppError::NotFound("No user account linked to this employee".into()))?;
        if user.password_hash.is_some() {
            return Err(AppError::BadRequest(
                "Account setup has already been completed".into(),
            ));
        }

        let now = self.clock.now();
        let (token, expires_at) = match (user.setup_token.clone(), user.setup_token_expires_at) {
            (Some(token), Some(expires_at)) if expires_at > now => (token, expires_at),
            _ => {
                let token = generate_setup_token();
                let expires_at = self.token_expiry(now);
                self.users
                    .refresh_setup_token(user.id, &token, expires_at, now)
                    .await?;
                tracing::info!(employee_id = %code, "Setup token regenerated");
                (token, expires_at)
            }
        };

        Ok(SetupTokenResponse {
            employee_id: employee.employee_code,
            username: user.username,
            email: user.email,
            setup_url: setup_url(&self.config.frontend_url, &token),
            setup_token: token,
            expires_at,
        })
    }
}

use std::sync::Arc;

use validator::Validate;

use super::punctuality::parse_time_of_day;
use crate::{
    error::AppError,
    models::{
        department::{
            CreateDepartmentRequest, Department, DepartmentListQuery, UpdateDepartmentRequest,
            DEFAULT_EARLY_LEAVE_PENALTY, DEFAULT_LATE_TOLERANCE,
        },
        PageRequest, PaginatedResponse,
    },
    repositories::department::DepartmentRepositoryTrait,
    types::DepartmentId,
    utils::time::Clock,
};

/// Stores boundaries in one canonical `HH:MM:SS` form.
fn normalize_boundary(field: &str, raw: &str) -> Result<String, AppError> {
    parse_time_of_day(raw)
        .map(|time| time.format("%H:%M:%S").to_string())
        .ok_or_else(|| AppError::Validation(vec![format!("{}: time_of_day", field)]))
}

fn normalize_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation(vec!["name: length".into()]));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct DepartmentService {
    departments: Arc<dyn DepartmentRepositoryTrait>,
    clock: Arc<dyn Clock>,
}

impl DepartmentService {
    pub fn new(departments: Arc<dyn DepartmentRepositoryTrait>, clock: Arc<dyn Clock>) -> Self {
        Self { departments, clock }
    }

    pub async fn create(&self, request: CreateDepartmentRequest) -> Result<Department, AppError> {
        request.validate()?;
        let now = self.clock.now();
        let department = Department {
            id: DepartmentId::new(),
            name: normalize_name(&request.name)?,
            description: request.description.trim().to_string(),
            max_clock_in: normalize_boundary("max_clock_in", &request.max_clock_in)?,
            max_clock_out: normalize_boundary("max_clock_out", &request.max_clock_out)?,
            late_tolerance: request.late_tolerance.unwrap_or(DEFAULT_LATE_TOLERANCE),
            early_leave_penalty: request
                .early_leave_penalty
                .unwrap_or(DEFAULT_EARLY_LEAVE_PENALTY),
            status: request.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            employee_count: 0,
        };

        let created = self.departments.create(&department).await?;
        tracing::info!(department_id = %created.id, name = %created.name, "Department created");
        Ok(created)
    }

    pub async fn list(
        &self,
        query: DepartmentListQuery,
    ) -> Result<PaginatedResponse<Department>, AppError> {
        let page = PageRequest::new(query.page, query.limit);
        let search = query
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());
        let (departments, total) = self.departments.list(search, query.status, page).await?;
        Ok(PaginatedResponse::new(departments, page, total))
    }

    pub async fn get(&self, id: DepartmentId) -> Result<Department, AppError> {
        self.departments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".into()))
    }

    pub async fn update(
        &self,
        id: DepartmentId,
        request: UpdateDepartmentRequest,
    ) -> Result<Department, AppError> {
        request.validate()?;
        let mut department = self.get(id).await?;

        if let Some(name) = request.name.as_deref() {
            department.name = normalize_name(name)?;
        }
        if let Some(description) = request.description {
            department.description = description.trim().to_string();
        }
        if let Some(raw) = request.max_clock_in.as_deref() {
            department.max_clock_in = normalize_boundary("max_clock_in", raw)?;
        }
        if let Some(raw) = request.max_clock_out.as_deref() {
            department.max_clock_out = normalize_boundary("max_clock_out", raw)?;
        }
        if let Some(tolerance) = request.late_tolerance {
            department.late_tolerance = tolerance;
        }
        if let Some(penalty) = request.early_leave_penalty {
            department.early_leave_penalty = penalty;
        }
        if let Some(status) = request.status {
            department.status = status;
        }
        department.updated_at = self.clock.now();

        self.departments.update(&department).await
    }

    /// Refused while employees still belong to the department.
    pub async fn delete(&self, id: DepartmentId) -> Result<(), AppError> {
        let department = self.get(id).await?;
        if self.departments.count_employees(id).await? > 0 {
            return Err(AppError::Conflict("Department still has employees".into()));
        }
        self.departments.delete(id).await?;
        tracing::info!(department_id = %id, name = %department.name, "Department deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::department::DepartmentStatus, repositories::department::MockDepartmentRepositoryTrait,
        utils::time::FixedClock,
    };
    use chrono::{TimeZone, Utc};

    fn service(repo: MockDepartmentRepositoryTrait) -> DepartmentService {
        DepartmentService::new(
            Arc::new(repo),
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap(),
            )),
        )
    }

    fn request() -> CreateDepartmentRequest {
        CreateDepartmentRequest {
            name: " Engineering ".into(),
            description: String::new(),
            max_clock_in: "09:00".into(),
            max_clock_out: "17:00:00".into(),
            late_tolerance: None,
            early_leave_penalty: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_normalizes() {
        let mut repo = MockDepartmentRepositoryTrait::new();
        repo.expect_create()
            .withf(|department| {
                department.name == "Engineering"
                    && department.max_clock_in == "09:00:00"
                    && department.late_tolerance == 15
                    && department.early_leave_penalty == 30
                    && department.status == DepartmentStatus::Active
            })
            .returning(|department| Ok(department.clone()));

        let created = service(repo).create(request()).await.expect("create");
        assert_eq!(created.max_clock_out, "17:00:00");
    }

    #[tokio::test]
    async fn create_rejects_unparsable_boundary() {
        let mut repo = MockDepartmentRepositoryTrait::new();
        repo.expect_create().never();
        let mut bad = request();
        bad.max_clock_in = "25:00".into();

        let err = service(repo).create(bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_negative_tolerance() {
        let mut repo = MockDepartmentRepositoryTrait::new();
        repo.expect_create().never();
        let mut bad = request();
        bad.late_tolerance = Some(-5);

        let err = service(repo).create(bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_is_refused_while_employees_remain() {
        let mut repo = MockDepartmentRepositoryTrait::new();
        repo.expect_find_by_id().returning(|id| {
            Ok(Some(Department {
                id,
                name: "Sales".into(),
                description: String::new(),
                max_clock_in: "09:00:00".into(),
                max_clock_out: "17:00:00".into(),
                late_tolerance: 15,
                early_leave_penalty: 30,
                status: DepartmentStatus::Active,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                employee_count: 2,
            }))
        });
        repo.expect_count_employees().returning(|_| Ok(2));
        repo.expect_delete().never();

        let err = service(repo).delete(DepartmentId::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}

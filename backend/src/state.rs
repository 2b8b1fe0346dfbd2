use std::{sync::Arc, time::Instant};

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{
        AttendanceRepository, AttendanceRepositoryTrait, DepartmentRepository,
        DepartmentRepositoryTrait, EmployeeRepository, EmployeeRepositoryTrait, UserRepository,
        UserRepositoryTrait,
    },
    services::{
        AttendanceService, AuthService, DepartmentService, EmployeeService, Notifier,
        ReportService,
    },
    utils::time::{Clock, SystemClock},
};

/// Storage seams the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub departments: Arc<dyn DepartmentRepositoryTrait>,
    pub employees: Arc<dyn EmployeeRepositoryTrait>,
    pub attendance: Arc<dyn AttendanceRepositoryTrait>,
    pub users: Arc<dyn UserRepositoryTrait>,
}

impl Repositories {
    pub fn postgres(pool: &DbPool) -> Self {
        Self {
            departments: Arc::new(DepartmentRepository::new(pool.clone())),
            employees: Arc::new(EmployeeRepository::new(pool.clone())),
            attendance: Arc::new(AttendanceRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// `None` when running against in-memory repositories.
    pub pool: Option<DbPool>,
    pub config: Config,
    pub started_at: Instant,
    pub attendance: AttendanceService,
    pub reports: ReportService,
    pub departments: DepartmentService,
    pub employees: EmployeeService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let repositories = Repositories::postgres(&pool);
        Self::with_repositories(
            Some(pool),
            config,
            repositories,
            notifier,
            Arc::new(SystemClock),
        )
    }

    pub fn with_repositories(
        pool: Option<DbPool>,
        config: Config,
        repositories: Repositories,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let Repositories {
            departments,
            employees,
            attendance,
            users,
        } = repositories;
        let time_zone = config.time_zone;

        Self {
            attendance: AttendanceService::new(
                employees.clone(),
                departments.clone(),
                attendance.clone(),
                clock.clone(),
                time_zone,
            ),
            reports: ReportService::new(
                employees.clone(),
                departments.clone(),
                attendance,
                clock.clone(),
                time_zone,
            ),
            departments: DepartmentService::new(departments.clone(), clock.clone()),
            employees: EmployeeService::new(
                employees.clone(),
                departments,
                users.clone(),
                notifier.clone(),
                clock.clone(),
                config.clone(),
            ),
            auth: AuthService::new(users, employees, notifier, clock, config.clone()),
            pool,
            config,
            started_at: Instant::now(),
        }
    }
}

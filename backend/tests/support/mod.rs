#![allow(dead_code)]
//! Shared fixtures: an in-memory store implementing every repository trait,
//! request helpers for driving the router, and an optional Postgres pool.

use async_trait::async_trait;
use attendance_backend::{
    config::Config,
    error::AppError,
    models::{
        attendance::{Attendance, AttendanceDetail, AttendanceFilter},
        attendance_history::AttendanceHistory,
        department::{Department, DepartmentStatus},
        employee::{
            employee_code_sequence, format_employee_code, Employee, EmployeeFilter,
            EmployeeStatus,
        },
        user::{User, UserRole},
        PageRequest,
    },
    repositories::{
        AttendanceRepositoryTrait, DepartmentRepositoryTrait, EmployeeRepositoryTrait,
        UserRepositoryTrait,
    },
    routes,
    services::LogNotifier,
    state::{AppState, Repositories},
    types::{AttendanceId, DepartmentId, EmployeeId, UserId},
    utils::{
        jwt::{create_access_token, Claims},
        password::hash_password,
        time::FixedClock,
    },
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{
    env,
    sync::{Arc, Mutex, MutexGuard},
};
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/attendance_test".to_string(),
        database_max_connections: 5,
        port: 0,
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiration_hours: 1,
        time_zone: chrono_tz::UTC,
        cors_allow_origin: "*".to_string(),
        frontend_url: "http://frontend.test".to_string(),
        setup_token_ttl_days: 7,
        smtp: None,
    }
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Connects to `TEST_DATABASE_URL` and applies migrations; `None` when unset.
pub async fn test_pool() -> Option<PgPool> {
    let url = env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

#[derive(Default)]
struct Tables {
    departments: Vec<Department>,
    employees: Vec<Employee>,
    users: Vec<User>,
    attendance: Vec<Attendance>,
    history: Vec<AttendanceHistory>,
}

/// In-memory stand-in for the Postgres repositories with the same
/// uniqueness rules.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("lock memory store")
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            departments: Arc::new(self.clone()),
            employees: Arc::new(self.clone()),
            attendance: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
        }
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn attendance_rows(&self) -> Vec<Attendance> {
        self.lock().attendance.clone()
    }

    pub fn user_for_employee(&self, code: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|user| user.employee_code.as_deref() == Some(code))
            .cloned()
    }

    pub fn insert_attendance(&self, row: Attendance) {
        self.lock().attendance.push(row);
    }

    pub fn seed_department(&self, name: &str, max_clock_in: &str, max_clock_out: &str) -> Department {
        let now = Utc::now();
        let department = Department {
            id: DepartmentId::new(),
            name: name.to_string(),
            description: String::new(),
            max_clock_in: max_clock_in.to_string(),
            max_clock_out: max_clock_out.to_string(),
            late_tolerance: 15,
            early_leave_penalty: 30,
            status: DepartmentStatus::Active,
            created_at: now,
            updated_at: now,
            employee_count: 0,
        };
        self.lock().departments.push(department.clone());
        department
    }

    pub fn seed_employee(&self, code: &str, name: &str, department: &Department) -> Employee {
        let now = Utc::now();
        let employee = Employee {
            id: EmployeeId::new(),
            employee_code: code.to_string(),
            department_id: department.id,
            department_name: Some(department.name.clone()),
            name: name.to_string(),
            email: format!("{}@example.com", code.to_lowercase()),
            phone: String::new(),
            address: String::new(),
            position: "Engineer".to_string(),
            status: EmployeeStatus::Active,
            join_date: now.date_naive(),
            created_at: now,
            updated_at: now,
        };
        self.lock().employees.push(employee.clone());
        employee
    }

    pub fn seed_user(&self, username: &str, role: UserRole, employee_code: Option<&str>) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: Some(hash_password(TEST_PASSWORD).expect("hash password")),
            role,
            employee_code: employee_code.map(str::to_owned),
            is_active: true,
            setup_token: None,
            setup_token_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().users.push(user.clone());
        user
    }
}

fn conflict(message: &str) -> AppError {
    AppError::Conflict(message.to_string())
}

fn department_name(tables: &Tables, id: DepartmentId) -> Option<String> {
    tables
        .departments
        .iter()
        .find(|department| department.id == id)
        .map(|department| department.name.clone())
}

fn with_count(tables: &Tables, department: &Department) -> Department {
    let mut department = department.clone();
    department.employee_count = tables
        .employees
        .iter()
        .filter(|employee| employee.department_id == department.id)
        .count() as i64;
    department
}

fn detail(tables: &Tables, row: &Attendance) -> Option<AttendanceDetail> {
    let employee = tables.employees.iter().find(|e| e.id == row.employee_id)?;
    let department = tables
        .departments
        .iter()
        .find(|d| d.id == employee.department_id)?;
    Some(AttendanceDetail {
        id: row.id,
        employee_id: row.employee_id,
        employee_code: employee.employee_code.clone(),
        employee_name: employee.name.clone(),
        department_id: department.id,
        department_name: department.name.clone(),
        max_clock_in: department.max_clock_in.clone(),
        max_clock_out: department.max_clock_out.clone(),
        late_tolerance: department.late_tolerance,
        early_leave_penalty: department.early_leave_penalty,
        clock_in: row.clock_in,
        clock_in_date: row.clock_in_date,
        clock_out: row.clock_out,
        work_hours: row.work_hours,
        status: row.status,
        notes: row.notes.clone(),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn matching(tables: &Tables, filter: &AttendanceFilter) -> Vec<AttendanceDetail> {
    tables
        .attendance
        .iter()
        .filter_map(|row| detail(tables, row))
        .filter(|d| filter.start_date.map_or(true, |start| d.clock_in_date >= start))
        .filter(|d| filter.end_date.map_or(true, |end| d.clock_in_date <= end))
        .filter(|d| filter.department_id.map_or(true, |id| d.department_id == id))
        .filter(|d| {
            filter
                .employee_code
                .as_deref()
                .map_or(true, |code| d.employee_code == code)
        })
        .collect()
}

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl DepartmentRepositoryTrait for MemoryStore {
    async fn create(&self, department: &Department) -> Result<Department, AppError> {
        let mut tables = self.lock();
        if tables.departments.iter().any(|d| d.name == department.name) {
            return Err(conflict("Department name already exists"));
        }
        tables.departments.push(department.clone());
        Ok(department.clone())
    }

    async fn find_by_id(&self, id: DepartmentId) -> Result<Option<Department>, AppError> {
        let tables = self.lock();
        Ok(tables
            .departments
            .iter()
            .find(|d| d.id == id)
            .map(|d| with_count(&tables, d)))
    }

    async fn list(
        &self,
        search: Option<String>,
        status: Option<DepartmentStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Department>, i64), AppError> {
        let tables = self.lock();
        let needle = search.map(|term| term.to_lowercase());
        let mut rows: Vec<Department> = tables
            .departments
            .iter()
            .filter(|d| status.map_or(true, |status| d.status == status))
            .filter(|d| {
                needle.as_deref().map_or(true, |needle| {
                    d.name.to_lowercase().contains(needle)
                        || d.description.to_lowercase().contains(needle)
                })
            })
            .map(|d| with_count(&tables, d))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok((page_of(&rows, page), rows.len() as i64))
    }

    async fn update(&self, department: &Department) -> Result<Department, AppError> {
        let mut tables = self.lock();
        if tables
            .departments
            .iter()
            .any(|d| d.name == department.name && d.id != department.id)
        {
            return Err(conflict("Department name already exists"));
        }
        let slot = tables
            .departments
            .iter_mut()
            .find(|d| d.id == department.id)
            .ok_or_else(|| AppError::NotFound("Department not found".into()))?;
        *slot = department.clone();
        Ok(with_count(&tables, department))
    }

    async fn delete(&self, id: DepartmentId) -> Result<(), AppError> {
        let mut tables = self.lock();
        if tables.employees.iter().any(|e| e.department_id == id) {
            return Err(conflict("Department still has employees"));
        }
        tables.departments.retain(|d| d.id != id);
        Ok(())
    }

    async fn count_employees(&self, id: DepartmentId) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .employees
            .iter()
            .filter(|e| e.department_id == id)
            .count() as i64)
    }
}

#[async_trait]
impl EmployeeRepositoryTrait for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Employee>, AppError> {
        Ok(self
            .lock()
            .employees
            .iter()
            .find(|e| e.employee_code == code)
            .cloned())
    }

    async fn list(
        &self,
        filter: EmployeeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        let tables = self.lock();
        let needle = filter.search.map(|term| term.to_lowercase());
        let mut rows: Vec<Employee> = tables
            .employees
            .iter()
            .filter(|e| filter.department_id.map_or(true, |id| e.department_id == id))
            .filter(|e| filter.status.map_or(true, |status| e.status == status))
            .filter(|e| {
                needle.as_deref().map_or(true, |needle| {
                    e.name.to_lowercase().contains(needle)
                        || e.employee_code.to_lowercase().contains(needle)
                        || e.position.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok((page_of(&rows, page), rows.len() as i64))
    }

    async fn find_by_department(&self, id: DepartmentId) -> Result<Vec<Employee>, AppError> {
        let mut rows: Vec<Employee> = self
            .lock()
            .employees
            .iter()
            .filter(|e| e.department_id == id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok(rows)
    }

    async fn next_code(&self) -> Result<String, AppError> {
        let highest = self
            .lock()
            .employees
            .iter()
            .filter_map(|e| employee_code_sequence(&e.employee_code))
            .max()
            .unwrap_or(0);
        Ok(format_employee_code(highest + 1))
    }

    async fn create_with_account(
        &self,
        employee: &Employee,
        account: &User,
    ) -> Result<Employee, AppError> {
        let mut tables = self.lock();
        if tables
            .employees
            .iter()
            .any(|e| e.employee_code == employee.employee_code)
        {
            return Err(conflict("Employee ID already exists"));
        }
        if tables.employees.iter().any(|e| e.email == employee.email)
            || tables.users.iter().any(|u| u.email == account.email)
        {
            return Err(conflict("Email already in use"));
        }
        if tables.users.iter().any(|u| u.username == account.username) {
            return Err(conflict("Username already in use"));
        }
        let mut saved = employee.clone();
        saved.department_name = department_name(&tables, saved.department_id);
        tables.employees.push(saved.clone());
        tables.users.push(account.clone());
        Ok(saved)
    }

    async fn update(
        &self,
        previous_code: &str,
        employee: &Employee,
    ) -> Result<Employee, AppError> {
        let mut tables = self.lock();
        if tables
            .employees
            .iter()
            .any(|e| e.employee_code == employee.employee_code && e.id != employee.id)
        {
            return Err(conflict("Employee ID already exists"));
        }
        let mut saved = employee.clone();
        saved.department_name = department_name(&tables, saved.department_id);
        let slot = tables
            .employees
            .iter_mut()
            .find(|e| e.employee_code == previous_code)
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
        *slot = saved.clone();
        for user in tables
            .users
            .iter_mut()
            .filter(|u| u.employee_code.as_deref() == Some(previous_code))
        {
            user.employee_code = Some(saved.employee_code.clone());
        }
        Ok(saved)
    }

    async fn deactivate(&self, code: &str) -> Result<Employee, AppError> {
        let mut tables = self.lock();
        let employee = tables
            .employees
            .iter_mut()
            .find(|e| e.employee_code == code)
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
        employee.status = EmployeeStatus::Inactive;
        let saved = employee.clone();
        for user in tables
            .users
            .iter_mut()
            .filter(|u| u.employee_code.as_deref() == Some(code))
        {
            user.is_active = false;
        }
        Ok(saved)
    }

    async fn count_active(&self, department_id: Option<DepartmentId>) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .employees
            .iter()
            .filter(|e| e.is_active())
            .filter(|e| department_id.map_or(true, |id| e.department_id == id))
            .count() as i64)
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for MemoryStore {
    async fn find_for_day(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError> {
        Ok(self
            .lock()
            .attendance
            .iter()
            .find(|row| row.employee_id == employee_id && row.clock_in_date == date)
            .cloned())
    }

    async fn open_with_history(
        &self,
        attendance: &Attendance,
        history: &AttendanceHistory,
    ) -> Result<Attendance, AppError> {
        let mut tables = self.lock();
        if tables.attendance.iter().any(|row| {
            row.employee_id == attendance.employee_id
                && row.clock_in_date == attendance.clock_in_date
        }) {
            return Err(conflict("Already clocked in today"));
        }
        tables.attendance.push(attendance.clone());
        tables.history.push(history.clone());
        Ok(attendance.clone())
    }

    async fn close_with_history(
        &self,
        attendance: &Attendance,
        history: &AttendanceHistory,
    ) -> Result<Attendance, AppError> {
        let mut tables = self.lock();
        let slot = tables
            .attendance
            .iter_mut()
            .find(|row| row.id == attendance.id && row.clock_out.is_none())
            .ok_or_else(|| conflict("Already clocked out today"))?;
        *slot = attendance.clone();
        tables.history.push(history.clone());
        Ok(attendance.clone())
    }

    async fn find_detail(&self, id: AttendanceId) -> Result<Option<AttendanceDetail>, AppError> {
        let tables = self.lock();
        Ok(tables
            .attendance
            .iter()
            .find(|row| row.id == id)
            .and_then(|row| detail(&tables, row)))
    }

    async fn list_page(
        &self,
        filter: AttendanceFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttendanceDetail>, i64), AppError> {
        let tables = self.lock();
        let mut rows = matching(&tables, &filter);
        rows.sort_by(|a, b| b.clock_in.cmp(&a.clock_in));
        Ok((page_of(&rows, page), rows.len() as i64))
    }

    async fn scan(&self, filter: AttendanceFilter) -> Result<Vec<AttendanceDetail>, AppError> {
        let tables = self.lock();
        let mut rows = matching(&tables, &filter);
        rows.sort_by(|a, b| {
            (a.clock_in_date, &a.employee_code).cmp(&(b.clock_in_date, &b.employee_code))
        });
        Ok(rows)
    }

    async fn history_for(&self, id: AttendanceId) -> Result<Vec<AttendanceHistory>, AppError> {
        let mut entries: Vec<AttendanceHistory> = self
            .lock()
            .history
            .iter()
            .filter(|entry| entry.attendance_id == id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(entries)
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        let login = login.to_lowercase();
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username.to_lowercase() == login || u.email.to_lowercase() == login)
            .cloned())
    }

    async fn find_by_setup_token(&self, token: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.setup_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_employee_code(&self, code: &str) -> Result<Option<User>, AppError> {
        Ok(self.user_for_employee(code))
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(conflict("Username already in use"));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(conflict("Email already in use"));
        }
        tables.users.push(user.clone());
        Ok(user.clone())
    }

    async fn complete_setup(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.modify_user(id, |user| {
            user.password_hash = Some(password_hash.to_string());
            user.is_active = true;
            user.setup_token = None;
            user.setup_token_expires_at = None;
            user.updated_at = now;
        })
    }

    async fn set_password(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.modify_user(id, |user| {
            user.password_hash = Some(password_hash.to_string());
            user.updated_at = now;
        })
    }

    async fn refresh_setup_token(
        &self,
        id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.modify_user(id, |user| {
            user.setup_token = Some(token.to_string());
            user.setup_token_expires_at = Some(expires_at);
            user.updated_at = now;
        })
    }

    async fn touch_last_login(&self, id: UserId, now: DateTime<Utc>) -> Result<(), AppError> {
        self.modify_user(id, |user| user.last_login_at = Some(now))
    }
}

impl MemoryStore {
    fn modify_user(&self, id: UserId, apply: impl FnOnce(&mut User)) -> Result<(), AppError> {
        let mut tables = self.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        apply(user);
        Ok(())
    }
}

/// Router wired to a [`MemoryStore`] and a pinned clock.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub clock: FixedClock,
    pub config: Config,
}

impl TestApp {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_config(test_config(), now)
    }

    pub fn with_config(config: Config, now: DateTime<Utc>) -> Self {
        let store = MemoryStore::default();
        let clock = FixedClock::new(now);
        let state = AppState::with_repositories(
            None,
            config.clone(),
            store.repositories(),
            Arc::new(LogNotifier),
            Arc::new(clock.clone()),
        );
        Self {
            router: routes::router(state),
            store,
            clock,
            config,
        }
    }

    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(
            user.id.to_string(),
            user.username.clone(),
            user.role.as_str().to_string(),
            user.employee_code.clone(),
            self.config.jwt_expiration_hours,
        );
        create_access_token(&claims, &self.config.jwt_secret).expect("create token")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("call router");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

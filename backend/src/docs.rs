#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    error::ErrorResponse,
    handlers::{
        attendance::TodayQuery,
        auth::SetupTokenQuery,
        health::{DatabaseHealth, HealthResponse},
    },
    models::{
        attendance::{
            AttendanceLogQuery, AttendanceResponse, AttendanceStatus, ClockInRequest,
            ClockOutRequest, DayState, TodayStatusResponse,
        },
        attendance_history::{AttendanceHistory, HistoryEntryType},
        department::{
            CreateDepartmentRequest, Department, DepartmentListQuery, DepartmentStatus,
            UpdateDepartmentRequest,
        },
        employee::{
            CreateEmployeeRequest, CreateEmployeeResponse, Employee, EmployeeListQuery,
            EmployeeStatus, SetupTokenResponse, UpdateEmployeeRequest,
            UpdateEmployeeStatusRequest,
        },
        report::{
            AttendanceReportRow, CsvExport, DepartmentReport, DepartmentReportQuery,
            DepartmentSummary, EmployeeMonthlyStats, EmployeeReportEntry, ReportQuery,
            SummaryReport,
        },
        user::{
            ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
            SetupAccountRequest, SetupAccountResponse, UserResponse, UserRole,
            VerifySetupTokenResponse,
        },
        PageInfo,
    },
    services::punctuality::Punctuality,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_doc,
        login_doc,
        verify_setup_token_doc,
        setup_account_doc,
        profile_doc,
        change_password_doc,
        register_doc,
        clock_in_doc,
        clock_out_doc,
        attendance_logs_doc,
        attendance_today_doc,
        attendance_history_doc,
        list_departments_doc,
        create_department_doc,
        get_department_doc,
        update_department_doc,
        delete_department_doc,
        list_employees_doc,
        create_employee_doc,
        get_employee_doc,
        update_employee_doc,
        deactivate_employee_doc,
        update_employee_status_doc,
        employee_setup_token_doc,
        attendance_report_doc,
        summary_report_doc,
        department_report_doc,
        export_attendance_doc,
        export_summary_doc,
        export_department_doc
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            DatabaseHealth,
            PageInfo,
            // auth
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            ChangePasswordRequest,
            SetupAccountRequest,
            SetupAccountResponse,
            VerifySetupTokenResponse,
            UserResponse,
            UserRole,
            // attendance
            ClockInRequest,
            ClockOutRequest,
            AttendanceResponse,
            AttendanceStatus,
            Punctuality,
            DayState,
            TodayStatusResponse,
            AttendanceHistory,
            HistoryEntryType,
            // departments
            Department,
            DepartmentStatus,
            CreateDepartmentRequest,
            UpdateDepartmentRequest,
            // employees
            Employee,
            EmployeeStatus,
            CreateEmployeeRequest,
            CreateEmployeeResponse,
            UpdateEmployeeRequest,
            UpdateEmployeeStatusRequest,
            SetupTokenResponse,
            // reports
            AttendanceReportRow,
            SummaryReport,
            EmployeeMonthlyStats,
            EmployeeReportEntry,
            DepartmentSummary,
            DepartmentReport,
            CsvExport
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login, account setup and passwords"),
        (name = "Attendance", description = "Clock-in / clock-out and attendance logs"),
        (name = "Departments", description = "Departments and their shift policy"),
        (name = "Employees", description = "Employee administration"),
        (name = "Reports", description = "Attendance reports and CSV export"),
        (name = "Health", description = "Service health")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());

        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, body = HealthResponse)),
    tag = "Health",
    security(())
)]
fn health_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/verify-setup-token",
    params(SetupTokenQuery),
    responses(
        (status = 200, body = VerifySetupTokenResponse),
        (status = 400, description = "Token expired", body = ErrorResponse),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    ),
    tag = "Auth",
    security(())
)]
fn verify_setup_token_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/setup-account",
    request_body = SetupAccountRequest,
    responses((status = 200, body = SetupAccountResponse)),
    tag = "Auth",
    security(())
)]
fn setup_account_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses((status = 200, body = UserResponse)),
    tag = "Auth"
)]
fn profile_doc() {}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses((status = 200, description = "Password updated", body = serde_json::Value)),
    tag = "Auth"
)]
fn change_password_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses((status = 201, body = UserResponse)),
    tag = "Auth"
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    request_body = ClockInRequest,
    responses(
        (status = 201, body = AttendanceResponse),
        (status = 409, description = "Already clocked in today", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
fn clock_in_doc() {}

#[utoipa::path(
    put,
    path = "/api/attendance/clock-out",
    request_body = ClockOutRequest,
    responses(
        (status = 200, body = AttendanceResponse),
        (status = 404, description = "No clock-in today", body = ErrorResponse),
        (status = 409, description = "Already clocked out today", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
fn clock_out_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    params(AttendanceLogQuery),
    responses((status = 200, description = "Paginated attendance rows", body = serde_json::Value)),
    tag = "Attendance"
)]
fn attendance_logs_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    params(TodayQuery),
    responses((status = 200, body = TodayStatusResponse)),
    tag = "Attendance"
)]
fn attendance_today_doc() {}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}/history",
    params(("id" = String, Path, description = "Attendance record ID")),
    responses((status = 200, body = [AttendanceHistory])),
    tag = "Attendance"
)]
fn attendance_history_doc() {}

#[utoipa::path(
    get,
    path = "/api/departments",
    params(DepartmentListQuery),
    responses((status = 200, description = "Paginated departments", body = serde_json::Value)),
    tag = "Departments"
)]
fn list_departments_doc() {}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, body = Department),
        (status = 409, description = "Duplicate name", body = ErrorResponse)
    ),
    tag = "Departments"
)]
fn create_department_doc() {}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = String, Path, description = "Department ID")),
    responses((status = 200, body = Department)),
    tag = "Departments"
)]
fn get_department_doc() {}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = String, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses((status = 200, body = Department)),
    tag = "Departments"
)]
fn update_department_doc() {}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = String, Path, description = "Department ID")),
    responses(
        (status = 200, body = serde_json::Value),
        (status = 409, description = "Department still has employees", body = ErrorResponse)
    ),
    tag = "Departments"
)]
fn delete_department_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeListQuery),
    responses((status = 200, description = "Paginated employees", body = serde_json::Value)),
    tag = "Employees"
)]
fn list_employees_doc() {}

#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployeeRequest,
    responses((status = 201, body = CreateEmployeeResponse)),
    tag = "Employees"
)]
fn create_employee_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses((status = 200, body = Employee)),
    tag = "Employees"
)]
fn get_employee_doc() {}

#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee code")),
    request_body = UpdateEmployeeRequest,
    responses((status = 200, body = Employee)),
    tag = "Employees"
)]
fn update_employee_doc() {}

#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses((status = 200, description = "Employee deactivated", body = serde_json::Value)),
    tag = "Employees"
)]
fn deactivate_employee_doc() {}

#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/status",
    params(("employee_id" = String, Path, description = "Employee code")),
    request_body = UpdateEmployeeStatusRequest,
    responses((status = 200, body = Employee)),
    tag = "Employees"
)]
fn update_employee_status_doc() {}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/setup-token",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses((status = 200, body = SetupTokenResponse)),
    tag = "Employees"
)]
fn employee_setup_token_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/attendance",
    params(ReportQuery),
    responses((status = 200, body = [AttendanceReportRow])),
    tag = "Reports"
)]
fn attendance_report_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/summary",
    params(ReportQuery),
    responses((status = 200, body = SummaryReport)),
    tag = "Reports"
)]
fn summary_report_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/department/{id}",
    params(("id" = String, Path, description = "Department ID"), DepartmentReportQuery),
    responses((status = 200, body = DepartmentReport)),
    tag = "Reports"
)]
fn department_report_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/export/attendance",
    params(ReportQuery),
    responses((status = 200, description = "CSV wrapped in JSON", body = CsvExport)),
    tag = "Reports"
)]
fn export_attendance_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/export/summary",
    params(ReportQuery),
    responses((status = 200, description = "CSV wrapped in JSON", body = CsvExport)),
    tag = "Reports"
)]
fn export_summary_doc() {}

#[utoipa::path(
    get,
    path = "/api/reports/export/department/{id}",
    params(("id" = String, Path, description = "Department ID"), DepartmentReportQuery),
    responses((status = 200, description = "CSV wrapped in JSON", body = CsvExport)),
    tag = "Reports"
)]
fn export_department_doc() {}

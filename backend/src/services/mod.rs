pub mod attendance;
pub mod auth;
pub mod department;
pub mod employee;
pub mod notifier;
pub mod punctuality;
pub mod report;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use department::DepartmentService;
pub use employee::EmployeeService;
pub use notifier::{LogNotifier, Notifier, SmtpNotifier};
pub use report::ReportService;

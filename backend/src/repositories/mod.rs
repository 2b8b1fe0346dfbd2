pub mod attendance;
pub mod common;
pub mod department;
pub mod employee;
pub mod transaction;
pub mod user;

pub use attendance::{AttendanceRepository, AttendanceRepositoryTrait};
pub use department::{DepartmentRepository, DepartmentRepositoryTrait};
pub use employee::{EmployeeRepository, EmployeeRepositoryTrait};
pub use transaction::*;
pub use user::{UserRepository, UserRepositoryTrait};

pub mod attendance;
pub mod auth;
pub mod departments;
pub mod employees;
pub mod health;
pub mod reports;

//! Models that represent users, authentication payloads, and role metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::UnknownVariant;
use crate::{types::UserId, validation::rules::validate_username};

#[derive(Debug, Clone, FromRow)]
/// Database representation of a user account.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Login name; employees get their employee code lower-cased.
    pub username: String,
    pub email: String,
    /// Argon2 hash; `None` until the account completes setup.
    pub password_hash: Option<String>,
    /// Role describing the user's privileges.
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    /// Code of the employee this account belongs to.
    pub employee_code: Option<String>,
    /// False until setup completes or after the employee is deactivated.
    pub is_active: bool,
    pub setup_token: Option<String>,
    pub setup_token_expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema, Default)]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Clocks in/out and reads own attendance.
    #[default]
    Employee,
    /// Reads employees, departments, logs and reports.
    Manager,
    /// Full administrative access.
    Admin,
}

impl UserRole {
    /// Returns the canonical snake_case representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "employee" | "Employee" | "EMPLOYEE" => Some(UserRole::Employee),
            "manager" | "Manager" | "MANAGER" => Some(UserRole::Manager),
            "admin" | "Admin" | "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserRole::parse(&value).ok_or(UnknownVariant {
            kind: "user role",
            value,
        })
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserRole::parse(&s).ok_or_else(|| {
            serde::de::Error::unknown_variant(&s, &["employee", "manager", "admin"])
        })
    }
}

impl User {
    /// Builds an account that still has to go through setup.
    pub fn pending(
        username: String,
        email: String,
        role: UserRole,
        employee_code: Option<String>,
        setup_token: String,
        setup_token_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            password_hash: None,
            role,
            employee_code,
            is_active: false,
            setup_token: Some(setup_token),
            setup_token_expires_at: Some(setup_token_expires_at),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` when the user holds the `Admin` role.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Returns `true` for managers and admins.
    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self.role, UserRole::Manager | UserRole::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for creating an account directly (admin only).
pub struct RegisterRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: UserRole,
    /// Employee code to link the account to.
    pub employee_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    /// Username or email address.
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Access token returned after a successful login.
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Payload submitted when a user requests to change their password.
pub struct ChangePasswordRequest {
    /// Existing password that will be verified before applying the change.
    pub current_password: String,
    /// Replacement password that will be stored if verification succeeds.
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Completes first-time setup for an account created with an employee.
pub struct SetupAccountRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetupAccountResponse {
    pub message: String,
    pub login_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifySetupTokenResponse {
    pub valid: bool,
    pub username: String,
    pub email: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub employee_id: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            role: user.role,
            employee_id: user.employee_code,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_deserializes_legacy_casings() {
        let role: UserRole = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, UserRole::Manager);
        assert!(serde_json::from_str::<UserRole>("\"root\"").is_err());
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn manager_and_admin_share_read_access() {
        let now = Utc::now();
        let mut user = User::pending(
            "emp001".into(),
            "emp001@example.com".into(),
            UserRole::Employee,
            Some("EMP001".into()),
            "token".into(),
            now,
            now,
        );
        assert!(!user.is_manager_or_admin());
        user.role = UserRole::Manager;
        assert!(user.is_manager_or_admin());
        assert!(!user.is_admin());
    }
}

//! Login, account setup and password changes.
//!
//! Passwords are hashed inside the operation that sets them; nothing is
//! hashed implicitly on save.

use std::sync::Arc;

use validator::Validate;

use super::notifier::Notifier;
use crate::{
    config::Config,
    error::AppError,
    models::user::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, SetupAccountRequest,
        SetupAccountResponse, User, UserResponse, VerifySetupTokenResponse,
    },
    repositories::{employee::EmployeeRepositoryTrait, user::UserRepositoryTrait},
    types::UserId,
    utils::{
        jwt::{create_access_token, verify_access_token, Claims},
        password::{hash_password, verify_password},
        time::Clock,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn login_url(frontend_url: &str) -> String {
    format!("{}/login", frontend_url.trim_end_matches('/'))
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepositoryTrait>,
    employees: Arc<dyn EmployeeRepositoryTrait>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        employees: Arc<dyn EmployeeRepositoryTrait>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        Self {
            users,
            employees,
            notifier,
            clock,
            config,
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let claims = Claims::new(
            user.id.to_string(),
            user.username.clone(),
            user.role.as_str().to_string(),
            user.employee_code.clone(),
            self.config.jwt_expiration_hours,
        );
        create_access_token(&claims, &self.config.jwt_secret).map_err(AppError::Internal)
    }

    /// Resolves a bearer token to its claims and the still-active account.
    pub async fn authenticate(&self, token: &str) -> Result<(Claims, User), AppError> {
        let claims = verify_access_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("Account is not active".into()))?;
        Ok((claims, user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;
        let user = self
            .users
            .find_by_login(request.username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::Unauthorized(
                "Account setup has not been completed".into(),
            ));
        };
        if !verify_password(&request.password, hash)? {
            tracing::warn!(username = %user.username, "Failed login attempt");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        if !user.is_active {
            return Err(AppError::Unauthorized("Account is disabled".into()));
        }

        let now = self.clock.now();
        self.users.touch_last_login(user.id, now).await?;
        let access_token = self.issue_token(&user)?;
        tracing::info!(username = %user.username, role = user.role.as_str(), "User logged in");

        let mut user = user;
        user.last_login_at = Some(now);
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: (self.config.jwt_expiration_hours as i64) * 3600,
            user: UserResponse::from(user),
        })
    }

    /// Creates an active account directly; used by administrators.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate()?;
        let employee_code = match request
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => {
                let employee = self
                    .employees
                    .find_by_code(code)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
                Some(employee.employee_code)
            }
            None => None,
        };

        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            username: request.username.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password_hash: Some(hash_password(&request.password)?),
            role: request.role,
            employee_code,
            is_active: true,
            setup_token: None,
            setup_token_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.users.create(&user).await?;
        tracing::info!(username = %created.username, role = created.role.as_str(), "User registered");
        Ok(UserResponse::from(created))
    }

    async fn pending_account(&self, token: &str) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_setup_token(token.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid setup token".into()))?;
        match user.setup_token_expires_at {
            Some(expires_at) if expires_at > self.clock.now() => Ok(user),
            _ => Err(AppError::BadRequest("Setup token has expired".into())),
        }
    }

    pub async fn verify_setup_token(
        &self,
        token: &str,
    ) -> Result<VerifySetupTokenResponse, AppError> {
        let user = self.pending_account(token).await?;
        Ok(VerifySetupTokenResponse {
            valid: true,
            username: user.username,
            email: user.email,
            expires_at: user.setup_token_expires_at,
        })
    }

    /// Sets the first password and activates the account.
    pub async fn complete_setup(
        &self,
        request: SetupAccountRequest,
    ) -> Result<SetupAccountResponse, AppError> {
        request.validate()?;
        let user = self.pending_account(&request.token).await?;
        let hash = hash_password(&request.new_password)?;
        self.users
            .complete_setup(user.id, &hash, self.clock.now())
            .await?;
        tracing::info!(username = %user.username, "Account setup completed");

        let name = match user.employee_code.as_deref() {
            Some(code) => self
                .employees
                .find_by_code(code)
                .await?
                .map(|employee| employee.name)
                .unwrap_or_else(|| user.username.clone()),
            None => user.username.clone(),
        };
        let login_url = login_url(&self.config.frontend_url);
        if let Err(err) = self
            .notifier
            .send_welcome(&user.email, &name, &login_url)
            .await
        {
            tracing::warn!(username = %user.username, error = %err, "Failed to send welcome e-mail");
        }

        Ok(SetupAccountResponse {
            message: "Account setup completed. You can now log in.".to_string(),
            login_url,
        })
    }

    pub async fn change_password(
        &self,
        user: &User,
        request: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        request.validate()?;
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::BadRequest("Account has no password set".into()));
        };
        if !verify_password(&request.current_password, hash)? {
            return Err(AppError::BadRequest("Current password is incorrect".into()));
        }
        if request.current_password == request.new_password {
            return Err(AppError::BadRequest(
                "New password must differ from the current password".into(),
            ));
        }

        let new_hash = hash_password(&request.new_password)?;
        self.users
            .set_password(user.id, &new_hash, self.clock.now())
            .await?;
        tracing::info!(username = %user.username, "Password changed");
        Ok(())
    }
}

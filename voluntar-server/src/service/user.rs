//! User Service
//!
//! Registration, login and account management.

use chrono::Utc;
use voluntar_core::domain::user::User;
use voluntar_core::dto::user::{CreateUser, LoginRequest, LoginResponse};

use crate::repository::{NewUser, RepoError};
use crate::service::auth::{self, AuthError};
use crate::service::policy::{self, PolicyError, Principal};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 3;

/// Service error type
#[derive(Debug)]
pub enum UserError {
    NotFound(String),
    EmailTaken(String),
    WrongPassword,
    ValidationError(String),
    Policy(PolicyError),
    Auth(AuthError),
    Repository(RepoError),
}

impl From<RepoError> for UserError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => UserError::EmailTaken(msg),
            other => UserError::Repository(other),
        }
    }
}

impl From<PolicyError> for UserError {
    fn from(err: PolicyError) -> Self {
        UserError::Policy(err)
    }
}

impl From<AuthError> for UserError {
    fn from(err: AuthError) -> Self {
        UserError::Auth(err)
    }
}

pub type Result<T> = std::result::Result<T, UserError>;

/// Register a new account
///
/// `actor` is the caller, if any; only an admin may create another admin.
pub async fn register(state: &AppState, actor: Option<&Principal>, req: CreateUser) -> Result<User> {
    let role = req.role.unwrap_or_default();
    policy::ensure_can_grant_role(actor, role)?;

    let name = req.name.trim().to_uppercase();
    let email = req.email.trim().to_string();
    validate_registration(&name, &email, &req.password)?;

    // Login matches emails ignoring case, so uniqueness must too
    if state.store.users.find_by_email_ci(&email).await?.is_some() {
        return Err(UserError::EmailTaken(email));
    }

    let password_hash = auth::hash_password(&req.password).await?;

    let user = state
        .store
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!("User registered: {} ({}, {})", user.email, user.id, user.role);

    Ok(user)
}

/// A verified login: the signed token and the full account
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        LoginResponse {
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Check credentials and issue an access token
pub async fn login(state: &AppState, req: LoginRequest) -> Result<Session> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(UserError::ValidationError(
            "email and password are required".to_string(),
        ));
    }

    let user = state
        .store
        .users
        .find_by_email_ci(email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))?;

    if !auth::verify_password(&req.password, &user.password_hash).await? {
        tracing::info!("Failed login for {}", user.email);
        return Err(UserError::WrongPassword);
    }

    let token = state.tokens.issue(&user)?;

    tracing::info!("User logged in: {} ({})", user.email, user.role);

    Ok(Session { token, user })
}

/// List the users visible to the caller: everyone for an admin, only
/// themselves otherwise
pub async fn list_users(state: &AppState, principal: &Principal) -> Result<Vec<User>> {
    if principal.is_admin() {
        return Ok(state.store.users.list_all().await?);
    }

    let own = state.store.users.find_by_email(&principal.email).await?;
    Ok(own.into_iter().collect())
}

/// Get a user by email (self or admin)
pub async fn get_user(state: &AppState, principal: &Principal, email: &str) -> Result<User> {
    policy::ensure_can_view_user(principal, email)?;

    state
        .store
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))
}

/// Delete a user by email (admin only)
pub async fn delete_user(state: &AppState, principal: &Principal, email: &str) -> Result<()> {
    policy::require_admin(principal)?;

    let deleted = state.store.users.delete_by_email(email).await?;

    if !deleted {
        return Err(UserError::NotFound(email.to_string()));
    }

    tracing::info!("User deleted: {} (by {})", email, principal.email);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_registration(name: &str, email: &str, password: &str) -> Result<()> {
    if name.is_empty() {
        return Err(UserError::ValidationError(
            "name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > 255 {
        return Err(UserError::ValidationError(
            "name is too long (max 255 characters)".to_string(),
        ));
    }

    if !is_valid_email(email) {
        return Err(UserError::ValidationError(format!(
            "invalid email '{}'",
            email
        )));
    }

    if email.chars().count() > 255 {
        return Err(UserError::ValidationError(
            "email is too long (max 255 characters)".to_string(),
        ));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

/// Something, an `@`, something, a `.`, something; no whitespace anywhere
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some(at) = email.find('@') else {
        return false;
    };
    if at == 0 {
        return false;
    }

    let domain = &email[at + 1..];
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

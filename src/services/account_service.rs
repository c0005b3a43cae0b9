//! Domain service for account creation, elevation, credential checks and
//! self-service updates.

use thiserror::Error;

use crate::domain::{Account, AccountId, AccountPatch, NewAccount, ValidationError};

/// Authentication failures. Messages are deliberately uniform so callers
/// cannot tell an unknown email from a wrong password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("Given token not valid for any token type")]
    InvalidToken,
}

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("user with this email already exists.")]
    DuplicateEmail,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Request field the error is scoped to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(err) => Some(err.field()),
            Self::DuplicateEmail => Some("email"),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Validates and persists a new, non-privileged account.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingEmail`] or
    /// [`ValidationError::InvalidEmailType`] before touching the database,
    /// and [`AccountError::DuplicateEmail`] if the normalized email exists.
    async fn create(&self, new: NewAccount) -> Result<Account, AccountError>;

    /// Creates an account through [`AccountService::create`], then grants it
    /// staff and superuser status.
    async fn create_superuser(&self, new: NewAccount) -> Result<Account, AccountError>;

    /// Checks an email/password pair.
    ///
    /// # Errors
    ///
    /// Every credential failure (unknown email, wrong password, inactive
    /// account) is reported as [`AuthError::InvalidCredentials`].
    async fn verify_credentials(&self, email: &str, password: &str)
    -> Result<Account, AccountError>;

    async fn get(&self, id: AccountId) -> Result<Account, AccountError>;

    /// Looks an account up by email, normalized the same way as on create.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Applies a name and/or password change. Length rules on the password
    /// belong to the caller.
    async fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, AccountError>;

    async fn list(&self) -> Result<Vec<Account>, AccountError>;

    async fn record_login(&self, id: AccountId) -> Result<(), AccountError>;
}

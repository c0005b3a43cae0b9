//! Domain service for issuing and checking bearer tokens.
//!
//! Tokens are stateless HS256 JWTs. Both halves of a pair carry the
//! account's email and display name as custom claims.

use serde::{Deserialize, Serialize};

use crate::domain::Account;
use crate::services::account_service::AccountError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub user_id: i32,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Verifies the credentials and mints an access/refresh pair.
    ///
    /// # Errors
    ///
    /// Any credential failure is reported as
    /// [`AuthError::InvalidCredentials`](crate::services::AuthError::InvalidCredentials).
    async fn issue(&self, email: &str, password: &str) -> Result<TokenPair, AccountError>;

    /// Mints a new access token from a valid refresh token. The refresh
    /// token itself is not rotated.
    async fn refresh(&self, refresh_token: &str) -> Result<String, AccountError>;

    /// Resolves an access token to the active account it was issued for.
    async fn authenticate(&self, access_token: &str) -> Result<Account, AccountError>;

    /// Checks signature and expiry and returns the claims.
    fn decode(&self, token: &str) -> Result<Claims, AccountError>;
}

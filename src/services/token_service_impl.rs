//! `jsonwebtoken` implementation of the `TokenService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::domain::{Account, AccountId};
use crate::services::account_service::{AccountError, AccountService, AuthError};
use crate::services::token_service::{Claims, TokenPair, TokenService, TokenType};

pub struct JwtTokenService {
    accounts: Arc<dyn AccountService>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: TimeDelta,
    refresh_lifetime: TimeDelta,
}

impl JwtTokenService {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountService>, config: &TokenConfig) -> Self {
        let secret = if config.signing_key.is_empty() {
            warn!("tokens.signing_key is not set; tokens will not survive a restart");
            generate_signing_key()
        } else {
            config.signing_key.clone()
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            accounts,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_lifetime: lifetime(config.access_lifetime_minutes),
            refresh_lifetime: lifetime(config.refresh_lifetime_minutes),
        }
    }

    fn mint(&self, account: &Account, token_type: TokenType) -> Result<String, AccountError> {
        let now = chrono::Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };

        let expires = now.checked_add_signed(lifetime).ok_or_else(|| {
            AccountError::Internal(format!("{token_type:?} token lifetime overflows"))
        })?;

        let claims = Claims {
            token_type,
            exp: expires.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id: account.id.value(),
            email: account.email.clone(),
            name: account.name.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccountError::Internal(format!("Failed to sign token: {e}")))
    }

    fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, AccountError> {
        let claims = self.decode(token)?;
        if claims.token_type != expected {
            debug!(
                expected = ?expected,
                actual = ?claims.token_type,
                "Rejected token of wrong type"
            );
            return Err(AuthError::InvalidToken.into());
        }
        Ok(claims)
    }

    async fn active_account_for(&self, claims: &Claims) -> Result<Account, AccountError> {
        match self.accounts.get(AccountId::new(claims.user_id)).await {
            Ok(account) if account.is_active => Ok(account),
            Ok(_) | Err(AccountError::NotFound(_)) => Err(AuthError::InvalidToken.into()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TokenService for JwtTokenService {
    async fn issue(&self, email: &str, password: &str) -> Result<TokenPair, AccountError> {
        let account = self.accounts.verify_credentials(email, password).await?;

        let pair = TokenPair {
            access: self.mint(&account, TokenType::Access)?,
            refresh: self.mint(&account, TokenType::Refresh)?,
        };

        self.accounts.record_login(account.id).await?;
        metrics::counter!("tokens_issued_total").increment(1);
        info!(account_id = %account.id, "Issued token pair");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, AccountError> {
        let claims = self.decode_as(refresh_token, TokenType::Refresh)?;
        // Claims come from the current account row, not the refresh token
        let account = self.active_account_for(&claims).await?;
        self.mint(&account, TokenType::Access)
    }

    async fn authenticate(&self, access_token: &str) -> Result<Account, AccountError> {
        let claims = self.decode_as(access_token, TokenType::Access)?;
        self.active_account_for(&claims).await
    }

    fn decode(&self, token: &str) -> Result<Claims, AccountError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected token");
                AuthError::InvalidToken.into()
            })
    }
}

/// Out-of-range minute counts saturate instead of panicking; `mint` then
/// reports the overflow.
fn lifetime(minutes: i64) -> TimeDelta {
    TimeDelta::try_minutes(minutes).unwrap_or(TimeDelta::MAX)
}

/// Generate a random signing key (64 character hex string)
#[must_use]
pub fn generate_signing_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountPatch, NewAccount};
    use crate::services::SeaOrmAccountService;
    use crate::services::testing::{fast_security, temp_store};

    const SECRET: &str = "test-signing-secret";

    async fn services() -> (Arc<dyn AccountService>, JwtTokenService) {
        let accounts: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(temp_store().await, fast_security()));
        let config = TokenConfig {
            signing_key: SECRET.to_string(),
            ..TokenConfig::default()
        };
        let tokens = JwtTokenService::new(accounts.clone(), &config);
        (accounts, tokens)
    }

    #[test]
    fn signing_key_is_random_hex() {
        let first = generate_signing_key();
        let second = generate_signing_key();

        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn issued_tokens_carry_email_and_name() {
        let (accounts, tokens) = services().await;
        let account = accounts
            .create(NewAccount::new("test@example.com", "testpass123").with_name("Test Name"))
            .await
            .unwrap();

        let pair = tokens.issue("test@example.com", "testpass123").await.unwrap();

        let access = tokens.decode(&pair.access).unwrap();
        let refresh = tokens.decode(&pair.refresh).unwrap();

        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(refresh.token_type, TokenType::Refresh);
        for claims in [&access, &refresh] {
            assert_eq!(claims.user_id, account.id.value());
            assert_eq!(claims.email, "test@example.com");
            assert_eq!(claims.name, "Test Name");
        }
        assert!(refresh.exp > access.exp);
        assert_ne!(access.jti, refresh.jti);
    }

    #[tokio::test]
    async fn issue_with_bad_credentials_is_uniform() {
        let (accounts, tokens) = services().await;
        accounts
            .create(NewAccount::new("test@example.com", "testpass123"))
            .await
            .unwrap();

        let wrong = tokens.issue("test@example.com", "nope1234").await.unwrap_err();
        let unknown = tokens.issue("who@example.com", "testpass123").await.unwrap_err();

        assert!(matches!(
            wrong,
            AccountError::Auth(AuthError::InvalidCredentials)
        ));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(
            wrong.to_string(),
            "No active account found with the given credentials"
        );
    }

    #[tokio::test]
    async fn authenticate_resolves_access_token() {
        let (accounts, tokens) = services().await;
        let account = accounts
            .create(NewAccount::new("test@example.com", "testpass123"))
            .await
            .unwrap();
        let pair = tokens.issue("test@example.com", "testpass123").await.unwrap();

        let resolved = tokens.authenticate(&pair.access).await.unwrap();
        assert_eq!(resolved.id, account.id);

        let err = tokens.authenticate(&pair.refresh).await.unwrap_err();
        assert!(matches!(err, AccountError::Auth(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn refresh_reinjects_current_claims() {
        let (accounts, tokens) = services().await;
        let account = accounts
            .create(NewAccount::new("test@example.com", "testpass123").with_name("Before"))
            .await
            .unwrap();
        let pair = tokens.issue("test@example.com", "testpass123").await.unwrap();

        accounts
            .update(
                account.id,
                AccountPatch {
                    name: Some("After".to_string()),
                    password: None,
                },
            )
            .await
            .unwrap();

        let access = tokens.refresh(&pair.refresh).await.unwrap();
        let claims = tokens.decode(&access).unwrap();

        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.name, "After");
        assert_eq!(claims.email, "test@example.com");

        let err = tokens.refresh(&pair.access).await.unwrap_err();
        assert!(matches!(err, AccountError::Auth(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_and_tampered_tokens_are_rejected() {
        let (_, tokens) = services().await;
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            token_type: TokenType::Access,
            exp: now - 10,
            iat: now - 310,
            jti: "expired".to_string(),
            user_id: 1,
            email: "test@example.com".to_string(),
            name: String::new(),
        };
        let expired = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            tokens.decode(&expired),
            Err(AccountError::Auth(AuthError::InvalidToken))
        ));

        let forged = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                exp: now + 300,
                ..claims
            },
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        assert!(matches!(
            tokens.decode(&forged),
            Err(AccountError::Auth(AuthError::InvalidToken))
        ));
        assert!(tokens.decode("not.a.token").is_err());
    }

    #[tokio::test]
    async fn oversized_lifetime_fails_without_panicking() {
        let accounts: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(temp_store().await, fast_security()));
        let config = TokenConfig {
            signing_key: SECRET.to_string(),
            refresh_lifetime_minutes: i64::MAX,
            ..TokenConfig::default()
        };
        let tokens = JwtTokenService::new(accounts.clone(), &config);
        accounts
            .create(NewAccount::new("long@example.com", "testpass123"))
            .await
            .unwrap();

        let result = tokens.issue("long@example.com", "testpass123").await;

        assert!(matches!(result, Err(AccountError::Internal(_))));
    }
}

//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::SecurityConfig;
use crate::db::repositories::account::{hash_password_blocking, verify_password_blocking};
use crate::db::{Store, is_unique_violation};
use crate::domain::{Account, AccountId, AccountPatch, Email, NewAccount};
use crate::services::account_service::{AccountError, AccountService, AuthError};

#[derive(Debug)]
enum CredentialFailure {
    UnknownEmail,
    BadPassword,
    Inactive,
}

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn check_credentials(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Result<Account, CredentialFailure>, AccountError> {
        let Some((account, password_hash)) = self.store.get_account_with_password(email).await?
        else {
            // Unknown emails still pay the Argon2 cost
            hash_password_blocking(password, &self.security).await?;
            return Ok(Err(CredentialFailure::UnknownEmail));
        };

        if !verify_password_blocking(password, password_hash).await? {
            return Ok(Err(CredentialFailure::BadPassword));
        }

        if !account.is_active {
            return Ok(Err(CredentialFailure::Inactive));
        }

        Ok(Ok(account))
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create(&self, new: NewAccount) -> Result<Account, AccountError> {
        let email = Email::from_value(&new.email)?;

        match self
            .store
            .create_account(&email, &new.password, &new.attributes, &self.security)
            .await
        {
            Ok(account) => {
                info!(account_id = %account.id, "Account created");
                metrics::counter!("accounts_created_total").increment(1);
                Ok(account)
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(email = %email, "Rejected duplicate email");
                Err(AccountError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_superuser(&self, new: NewAccount) -> Result<Account, AccountError> {
        let account = self.create(new).await?;
        let account = self.store.elevate_account(account.id).await?;

        info!(account_id = %account.id, "Account elevated to superuser");
        Ok(account)
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::InvalidCredentials.into());
        };

        match self.check_credentials(&email, password).await? {
            Ok(account) => Ok(account),
            Err(reason) => {
                debug!(?reason, "Credential verification failed");
                metrics::counter!("auth_failures_total").increment(1);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    async fn get(&self, id: AccountId) -> Result<Account, AccountError> {
        self.store
            .get_account(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let email = Email::parse(email)?;
        Ok(self.store.get_account_by_email(&email).await?)
    }

    async fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, AccountError> {
        let account = self.get(id).await?;
        if patch.is_empty() {
            return Ok(account);
        }

        let password_changed = patch.password.is_some();
        let account = self
            .store
            .update_account(id, patch.name, patch.password.as_deref(), &self.security)
            .await?;

        if password_changed {
            info!(account_id = %id, "Password changed");
        }

        Ok(account)
    }

    async fn list(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.store.list_accounts().await?)
    }

    async fn record_login(&self, id: AccountId) -> Result<(), AccountError> {
        Ok(self.store.record_login(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use crate::services::testing::{fast_security, temp_store};
    use serde_json::json;

    async fn service() -> SeaOrmAccountService {
        SeaOrmAccountService::new(temp_store().await, fast_security())
    }

    #[tokio::test]
    async fn create_user_with_email_successful() {
        let service = service().await;

        let account = service
            .create(NewAccount::new("test@example.com", "testpass123"))
            .await
            .unwrap();

        assert_eq!(account.email, "test@example.com");
        assert!(account.is_active);
        assert!(!account.is_staff);
        assert!(!account.is_superuser);
        assert!(
            service
                .verify_credentials("test@example.com", "testpass123")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn new_user_email_is_normalized() {
        let service = service().await;
        let cases = [
            ("test1@EXAMPLE.com", "test1@example.com"),
            ("Test2@Example.com", "Test2@example.com"),
            ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
            ("test4@example.COM", "test4@example.com"),
        ];

        for (raw, expected) in cases {
            let account = service.create(NewAccount::new(raw, "sample123")).await.unwrap();
            assert_eq!(account.email, expected);
        }
    }

    #[tokio::test]
    async fn new_user_without_email_raises_error() {
        let service = service().await;

        let err = service
            .create(NewAccount::new("", "test123").with_name("Someone"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::Validation(ValidationError::MissingEmail)
        ));

        let mut missing = NewAccount::new("", "test123");
        missing.email = serde_json::Value::Null;
        let err = service.create(missing).await.unwrap_err();
        assert!(matches!(
            err,
            AccountError::Validation(ValidationError::MissingEmail)
        ));

        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_user_with_numeric_email_raises_error() {
        let service = service().await;

        let mut numeric = NewAccount::new("", "test123");
        numeric.email = json!(12345);
        let err = service.create(numeric).await.unwrap_err();

        assert!(matches!(
            err,
            AccountError::Validation(ValidationError::InvalidEmailType)
        ));
        assert_eq!(err.field(), Some("email"));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let service = service().await;
        service
            .create(NewAccount::new("dup@example.com", "testpass123"))
            .await
            .unwrap();

        let err = service
            .create(NewAccount::new("dup@EXAMPLE.com", "otherpass"))
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::DuplicateEmail));
        assert_eq!(err.field(), Some("email"));
        assert_eq!(err.to_string(), "user with this email already exists.");
    }

    #[tokio::test]
    async fn create_superuser_sets_both_flags() {
        let service = service().await;

        let account = service
            .create_superuser(NewAccount::new("admin@example.com", "testpass123"))
            .await
            .unwrap();

        assert!(account.is_staff);
        assert!(account.is_superuser);

        let reloaded = service.get(account.id).await.unwrap();
        assert!(reloaded.is_staff && reloaded.is_superuser);
    }

    #[tokio::test]
    async fn credential_failures_are_indistinguishable() {
        let service = service().await;
        service
            .create(NewAccount::new("user@example.com", "testpass123"))
            .await
            .unwrap();

        let mut inactive = NewAccount::new("gone@example.com", "testpass123");
        inactive.attributes.is_active = false;
        service.create(inactive).await.unwrap();

        let wrong_password = service
            .verify_credentials("user@example.com", "wrongpass")
            .await
            .unwrap_err();
        let unknown_email = service
            .verify_credentials("nobody@example.com", "testpass123")
            .await
            .unwrap_err();
        let inactive = service
            .verify_credentials("gone@example.com", "testpass123")
            .await
            .unwrap_err();

        for err in [&wrong_password, &unknown_email, &inactive] {
            assert!(matches!(
                err,
                AccountError::Auth(AuthError::InvalidCredentials)
            ));
        }
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(unknown_email.to_string(), inactive.to_string());
    }

    #[tokio::test]
    async fn verify_looks_up_by_normalized_email() {
        let service = service().await;
        service
            .create(NewAccount::new("Mixed@Example.com", "testpass123"))
            .await
            .unwrap();

        assert!(
            service
                .verify_credentials("Mixed@EXAMPLE.COM", "testpass123")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn password_update_replaces_old_password() {
        let service = service().await;
        let account = service
            .create(NewAccount::new("user@example.com", "oldpass123").with_name("Old Name"))
            .await
            .unwrap();

        let updated = service
            .update(
                account.id,
                AccountPatch {
                    name: Some("New Name".to_string()),
                    password: Some("newpass123".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "New Name");
        assert!(
            service
                .verify_credentials("user@example.com", "newpass123")
                .await
                .is_ok()
        );
        assert!(
            service
                .verify_credentials("user@example.com", "oldpass123")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn update_unknown_account_is_not_found() {
        let service = service().await;

        let err = service
            .update(AccountId::new(999), AccountPatch::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn record_login_sets_timestamp() {
        let service = service().await;
        let account = service
            .create(NewAccount::new("user@example.com", "testpass123"))
            .await
            .unwrap();
        assert!(account.last_login.is_none());

        service.record_login(account.id).await.unwrap();

        assert!(service.get(account.id).await.unwrap().last_login.is_some());
    }

    #[tokio::test]
    async fn find_by_email_normalizes_the_domain() {
        let service = service().await;
        let created = service
            .create(NewAccount::new("Finder@example.com", "testpass123"))
            .await
            .unwrap();

        let found = service.find_by_email("Finder@EXAMPLE.COM").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));

        assert!(
            service
                .find_by_email("finder@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn concurrent_creates_of_one_email_yield_one_account() {
        let service = std::sync::Arc::new(service().await);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                let email = if i % 2 == 0 {
                    "race@example.com"
                } else {
                    "race@EXAMPLE.com"
                };
                tokio::spawn(async move {
                    service.create(NewAccount::new(email, "testpass123")).await
                })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AccountError::DuplicateEmail) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }
}

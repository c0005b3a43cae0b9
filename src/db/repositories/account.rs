use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::{Account, AccountAttributes, AccountId, Email};
use crate::entities::accounts;

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new account, hashing the password first.
    /// A duplicate email surfaces as a `DbErr` unique-constraint violation,
    /// see [`is_unique_violation`].
    pub async fn create(
        &self,
        email: &Email,
        password: &str,
        attributes: &AccountAttributes,
        config: &SecurityConfig,
    ) -> Result<Account> {
        let password_hash = hash_password_blocking(password, config).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            email: Set(email.as_str().to_string()),
            name: Set(attributes.name.clone()),
            password_hash: Set(password_hash),
            is_active: Set(attributes.is_active),
            is_staff: Set(false),
            is_superuser: Set(false),
            last_login: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert account")?;

        Ok(Account::from(model))
    }

    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    /// Get account by email together with its password hash (for verification)
    pub async fn get_by_email_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        Ok(account.map(|a| {
            let password_hash = a.password_hash.clone();
            (Account::from(a), password_hash)
        }))
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        let accounts = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(accounts.into_iter().map(Account::from).collect())
    }

    /// Grant staff and superuser status.
    pub async fn elevate(&self, id: AccountId) -> Result<Account> {
        let mut active: accounts::ActiveModel = self.find_model(id).await?.into();
        active.is_staff = Set(true);
        active.is_superuser = Set(true);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Account::from(model))
    }

    /// Apply a name and/or password change. The password is re-hashed.
    pub async fn update(
        &self,
        id: AccountId,
        name: Option<String>,
        password: Option<&str>,
        config: &SecurityConfig,
    ) -> Result<Account> {
        let model = self.find_model(id).await?;

        let new_hash = match password {
            Some(password) => Some(hash_password_blocking(password, config).await?),
            None => None,
        };

        let mut active: accounts::ActiveModel = model.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(hash) = new_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Account::from(model))
    }

    pub async fn record_login(&self, id: AccountId) -> Result<()> {
        let mut active: accounts::ActiveModel = self.find_model(id).await?.into();
        active.last_login = Set(Some(chrono::Utc::now().to_rfc3339()));
        active.update(&self.conn).await?;

        Ok(())
    }

    async fn find_model(&self, id: AccountId) -> Result<accounts::Model> {
        accounts::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query account for update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))
    }
}

/// Whether an error returned by [`AccountRepository::create`] is the
/// email unique constraint firing.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash string. The params are read
/// from the hash itself.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Argon2 is CPU-intensive and would stall the async runtime if run inline.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

pub async fn verify_password_blocking(password: &str, password_hash: String) -> Result<bool> {
    let password = password.to_string();
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let config = fast_config();
        let first = hash_password("testpass123", &config).unwrap();
        let second = hash_password("testpass123", &config).unwrap();

        assert_ne!(first, second);
        assert!(!first.contains("testpass123"));
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_accepts_only_the_original_password() {
        let hash = hash_password("testpass123", &fast_config()).unwrap();

        assert!(verify_password("testpass123", &hash).unwrap());
        assert!(!verify_password("testpass124", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn unrelated_errors_are_not_unique_violations() {
        let err = anyhow::Error::new(DbErr::Custom("boom".to_string()));
        assert!(!is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("plain")));
    }
}

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{Account, AccountAttributes, AccountId, Email};

pub mod migrator;
pub mod repositories;

pub use repositories::account::is_unique_violation;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Connect without running migrations. Used by `wait-for-db`, which
    /// only cares whether the database answers.
    pub async fn connect_only(db_url: &str) -> Result<Self> {
        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(1)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(5))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    pub async fn create_account(
        &self,
        email: &Email,
        password: &str,
        attributes: &AccountAttributes,
        config: &SecurityConfig,
    ) -> Result<Account> {
        self.account_repo()
            .create(email, password, attributes, config)
            .await
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &Email) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>> {
        self.account_repo().get_by_email_with_password(email).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list().await
    }

    pub async fn elevate_account(&self, id: AccountId) -> Result<Account> {
        self.account_repo().elevate(id).await
    }

    pub async fn update_account(
        &self,
        id: AccountId,
        name: Option<String>,
        password: Option<&str>,
        config: &SecurityConfig,
    ) -> Result<Account> {
        self.account_repo().update(id, name, password, config).await
    }

    pub async fn record_login(&self, id: AccountId) -> Result<()> {
        self.account_repo().record_login(id).await
    }
}

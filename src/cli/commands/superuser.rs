//! Create-superuser command handler

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::domain::NewAccount;
use crate::services::{AccountError, AccountService, SeaOrmAccountService};

pub async fn cmd_create_superuser(
    config: &Config,
    email: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let service: Arc<dyn AccountService> =
        Arc::new(SeaOrmAccountService::new(store, config.security.clone()));

    let new = NewAccount::new(email, password).with_name(name);

    match service.create_superuser(new).await {
        Ok(account) => {
            println!("✓ Superuser created: {} (id {})", account.email, account.id);
            Ok(())
        }
        Err(e @ (AccountError::Validation(_) | AccountError::DuplicateEmail)) => {
            anyhow::bail!("Could not create superuser: {e}")
        }
        Err(e) => Err(anyhow::anyhow!(e).context("Failed to create superuser")),
    }
}

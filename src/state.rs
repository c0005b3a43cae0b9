use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, JwtTokenService, SeaOrmAccountService, SelfService, TokenService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub account_service: Arc<dyn AccountService>,

    pub token_service: Arc<dyn TokenService>,

    pub self_service: SelfService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AccountService + Send + Sync + 'static>;

        let token_service = Arc::new(JwtTokenService::new(
            account_service.clone(),
            &config.tokens,
        )) as Arc<dyn TokenService + Send + Sync + 'static>;

        let self_service = SelfService::new(account_service.clone());

        Self {
            config: Arc::new(config),
            store,
            account_service,
            token_service,
            self_service,
        }
    }
}

//! Operations an authenticated account performs on its own record.
//!
//! Authentication happens upstream (HTTP middleware); everything here
//! takes the already-resolved identity.

use std::sync::Arc;

use crate::domain::{AccountId, AccountPatch, AccountProfile};
use crate::services::account_service::{AccountError, AccountService};

#[derive(Clone)]
pub struct SelfService {
    accounts: Arc<dyn AccountService>,
}

impl SelfService {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountService>) -> Self {
        Self { accounts }
    }

    pub async fn get_self(&self, identity: AccountId) -> Result<AccountProfile, AccountError> {
        Ok(self.accounts.get(identity).await?.into())
    }

    pub async fn update_self(
        &self,
        identity: AccountId,
        patch: AccountPatch,
    ) -> Result<AccountProfile, AccountError> {
        Ok(self.accounts.update(identity, patch).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewAccount;
    use crate::services::SeaOrmAccountService;
    use crate::services::testing::{fast_security, temp_store};

    #[tokio::test]
    async fn profile_exposes_only_name_and_email() {
        let accounts: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(temp_store().await, fast_security()));
        let account = accounts
            .create(NewAccount::new("me@example.com", "testpass123").with_name("Me"))
            .await
            .unwrap();
        let service = SelfService::new(accounts);

        let profile = service.get_self(account.id).await.unwrap();
        assert_eq!(
            profile,
            AccountProfile {
                email: "me@example.com".to_string(),
                name: "Me".to_string(),
            }
        );

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_self_returns_refreshed_profile() {
        let accounts: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(temp_store().await, fast_security()));
        let account = accounts
            .create(NewAccount::new("me@example.com", "testpass123").with_name("Me"))
            .await
            .unwrap();
        let service = SelfService::new(accounts.clone());

        let profile = service
            .update_self(
                account.id,
                AccountPatch {
                    name: Some("Renamed".to_string()),
                    password: Some("newpass123".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.name, "Renamed");
        assert!(
            accounts
                .verify_credentials("me@example.com", "newpass123")
                .await
                .is_ok()
        );
    }
}

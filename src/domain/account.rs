use serde::Serialize;

use super::AccountId;
use crate::entities::accounts;

/// Account data returned from the store. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::new(model.id),
            email: model.email,
            name: model.name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Attributes besides email and password that may be set at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAttributes {
    pub name: String,
    pub is_active: bool,
}

impl Default for AccountAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_active: true,
        }
    }
}

/// Input to account creation.
///
/// The email stays an untyped JSON value until the account service
/// validates it, so a numeric or missing email surfaces as a validation
/// error instead of a deserialization failure.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: serde_json::Value,
    pub password: String,
    pub attributes: AccountAttributes,
}

impl NewAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: serde_json::Value::String(email.into()),
            password: password.into(),
            attributes: AccountAttributes::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.attributes.name = name.into();
        self
    }
}

/// Partial update applied through self-service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl AccountPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.password.is_none()
    }
}

/// The projection an account owner sees of their own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProfile {
    pub email: String,
    pub name: String,
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        Self {
            email: account.email,
            name: account.name,
        }
    }
}

//! Domain types for account management with strong typing.
//!
//! Identifiers and emails are wrapped in newtypes so a raw `i32` or an
//! un-normalized string cannot reach the store by accident.

pub mod account;

pub use account::{Account, AccountAttributes, AccountPatch, AccountProfile, NewAccount};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for an account.
///
/// # Examples
///
/// ```rust
/// use accounts::domain::AccountId;
///
/// let id = AccountId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId(i32);

impl AccountId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AccountId> for i32 {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl From<i32> for AccountId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Field-scoped input errors, raised before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("This field is required.")]
    MissingEmail,

    #[error("Not a valid string.")]
    InvalidEmailType,

    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("Ensure this field has at least {min} characters.")]
    SecretTooShort { min: usize },

    #[error("Ensure this field has no more than {max} characters.")]
    TooLong { field: &'static str, max: usize },

    #[error("This field may not be blank.")]
    BlankField(&'static str),

    #[error("This field is required.")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Name of the request field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingEmail | Self::InvalidEmailType | Self::InvalidEmail => "email",
            Self::SecretTooShort { .. } => "password",
            Self::TooLong { field, .. } | Self::BlankField(field) | Self::MissingField(field) => {
                field
            }
        }
    }
}

/// A normalized email address: the domain part is lower-cased, the local
/// part is kept exactly as supplied.
///
/// # Examples
///
/// ```rust
/// use accounts::domain::Email;
///
/// let email = Email::parse("Test2@Example.com").unwrap();
/// assert_eq!(email.as_str(), "Test2@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingEmail);
        }

        let normalized = match trimmed.rsplit_once('@') {
            Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
            None => trimmed.to_string(),
        };

        Ok(Self(normalized))
    }

    /// Parses an email out of an untyped JSON value as it arrives at the
    /// HTTP boundary. `null` counts as absent; any non-string is rejected.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ValidationError> {
        match value {
            serde_json::Value::Null => Err(ValidationError::MissingEmail),
            serde_json::Value::String(raw) => Self::parse(raw),
            _ => Err(ValidationError::InvalidEmailType),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

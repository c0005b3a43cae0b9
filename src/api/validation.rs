use serde_json::Value;

use crate::domain::ValidationError;

/// Longest email or display name the accounts table accepts.
pub const MAX_FIELD_LENGTH: usize = 255;

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-";

/// Registration email rules. The store normalizes but does not check format.
pub fn validate_new_email(email: &Value) -> Result<(), ValidationError> {
    let raw = match email {
        Value::Null => return Err(ValidationError::MissingEmail),
        Value::String(raw) => raw.trim(),
        _ => return Err(ValidationError::InvalidEmailType),
    };

    if raw.is_empty() {
        return Err(ValidationError::BlankField("email"));
    }

    if raw.chars().count() > MAX_FIELD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email",
            max: MAX_FIELD_LENGTH,
        });
    }

    if !is_valid_email(raw) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Display name rules, applied on create and whenever an update carries a name.
pub fn validate_name(name: Option<&str>) -> Result<&str, ValidationError> {
    let name = require_field(name, "name")?.trim();

    if name.chars().count() > MAX_FIELD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name",
            max: MAX_FIELD_LENGTH,
        });
    }

    Ok(name)
}

/// Password rules applied at registration and on profile update.
pub fn validate_new_password(
    password: Option<&str>,
    min_length: usize,
) -> Result<&str, ValidationError> {
    let password = require_field(password, "password")?;

    if password.chars().count() < min_length {
        return Err(ValidationError::SecretTooShort { min: min_length });
    }

    Ok(password)
}

/// Absent and whitespace-only values get different messages.
pub fn require_field<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;

    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }

    Ok(value)
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        return true;
    }

    !local.is_empty()
        && local.split('.').all(|atom| {
            !atom.is_empty()
                && atom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
        })
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

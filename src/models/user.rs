use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{Lifecycle, Role, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};

const MIN_PASSWORD_LEN: usize = 6;

/// Basic email format validation.
///
/// Validates that email has:
/// - Exactly one @ symbol
/// - Non-empty local part (before @)
/// - Non-empty domain part (after @) with at least one inner dot
///
/// Intentionally permissive; a sanity check rather than RFC 5322.
fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();
    let invalid = || AppError::BadRequest(format!("Invalid email format: {}", email));

    let Some((local_part, domain_part)) = email.split_once('@') else {
        return Err(invalid());
    };

    if local_part.is_empty() || local_part.contains(' ') || domain_part.contains('@') {
        return Err(invalid());
    }

    if !domain_part.contains('.') || domain_part.starts_with('.') || domain_part.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(msg::PASSWORD_TOO_SHORT.into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Enable,
    Disable,
}

/// Employee account. Source of truth for identity, role and team affiliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub real_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// None when the stored role is not a recognized role
    pub role: Option<Role>,
    pub department_id: Option<String>,
    pub team_id: Option<String>,
    pub status: UserStatus,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
}

impl User {
    pub fn is_enabled(&self) -> bool {
        self.status == UserStatus::Enable && self.lifecycle.is_active()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub real_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.username).is_none() {
            return Err(AppError::BadRequest(msg::USERNAME_EMPTY.into()));
        }
        if non_blank(&self.real_name).is_none() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        validate_password(&self.password)?;
        if let Some(ref email) = self.email {
            validate_email_format(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub real_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub email: Option<Option<String>>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub department_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub team_id: Option<Option<String>>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.real_name
            && non_blank(name).is_none()
        {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if let Some(Some(ref email)) = self.email {
            validate_email_format(email)?;
        }
        if let Some(ref password) = self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

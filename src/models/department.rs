use serde::{Deserialize, Serialize};

use super::{Lifecycle, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    /// Short unique code, e.g. SALES_01
    pub code: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartment {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateDepartment {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.name).is_none() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if non_blank(&self.code).is_none() {
            return Err(AppError::BadRequest(msg::CODE_EMPTY.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub description: Option<Option<String>>,
}

impl UpdateDepartment {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| non_blank(n).is_none()) {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if self.code.as_deref().is_some_and(|c| non_blank(c).is_none()) {
            return Err(AppError::BadRequest(msg::CODE_EMPTY.into()));
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use super::{Lifecycle, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};

/// A sales team. Belongs to exactly one department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub department_id: String,
    pub leader_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    pub department_id: String,
    #[serde(default)]
    pub leader_id: Option<String>,
}

impl CreateTeam {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.name).is_none() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub leader_id: Option<Option<String>>,
}

impl UpdateTeam {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| non_blank(n).is_none()) {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use super::{Lifecycle, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};
use crate::policy::Owned;

/// Background record on a prospect's company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub industry: Option<String>,
    /// Years in business
    pub years: Option<i64>,
    pub capital: Option<String>,
    pub main_business: Option<String>,
    pub screenshot_url: Option<String>,
    pub creator_id: String,
    pub team_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
}

impl Owned for Company {
    fn creator_id(&self) -> &str {
        &self.creator_id
    }

    fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Company {
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.industry.as_deref().is_some_and(|i| i.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub years: Option<i64>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub main_business: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
}

impl CreateCompany {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.name).is_none() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if self.years.is_some_and(|y| y < 0) {
            return Err(AppError::BadRequest("years must not be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompany {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub years: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub capital: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub main_business: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub screenshot_url: Option<Option<String>>,
}

impl UpdateCompany {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| non_blank(n).is_none()) {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if matches!(self.years, Some(Some(y)) if y < 0) {
            return Err(AppError::BadRequest("years must not be negative".into()));
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use super::{Lifecycle, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};
use crate::policy::Owned;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub email: Option<String>,
    pub demand_preference: Option<String>,
    pub cooperation_stage: Option<String>,
    pub follow_up_status: Option<String>,
    pub assignee_id: Option<String>,
    pub creator_id: String,
    pub team_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
}

impl Owned for Customer {
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

impl Customer {
    /// Case-insensitive match against name, company and contact person.
    pub fn matches(&self, needle: &str) -> bool {
        [
            Some(self.name.as_str()),
            self.company_name.as_deref(),
            self.contact_person.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub demand_preference: Option<String>,
    #[serde(default)]
    pub cooperation_stage: Option<String>,
    #[serde(default)]
    pub follow_up_status: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

impl CreateCustomer {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.name).is_none() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

/// Patch body. Ownership columns are deliberately absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub company_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub contact_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub demand_preference: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub cooperation_stage: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub follow_up_status: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub assignee_id: Option<Option<String>>,
}

impl UpdateCustomer {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| non_blank(n).is_none()) {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

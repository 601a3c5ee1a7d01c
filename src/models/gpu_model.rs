use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{Lifecycle, deserialize_optional_nullable, non_blank};
use crate::error::{AppError, Result, msg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    #[default]
    Available,
    Shortage,
    Unavailable,
}

/// Catalog entry for a GPU server configuration. Not owned by anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuModel {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub memory_gb: Option<i64>,
    pub cpu: Option<String>,
    pub ram_gb: Option<i64>,
    pub ib_card: Option<String>,
    pub nvme_ssd: Option<String>,
    pub network_adapter: Option<String>,
    pub power_supply: Option<String>,
    pub rental_price_min: Option<f64>,
    pub rental_price_max: Option<f64>,
    pub sale_price_min: Option<f64>,
    pub sale_price_max: Option<f64>,
    pub availability: Availability,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Lifecycle::is_active")]
    pub lifecycle: Lifecycle,
}

impl GpuModel {
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.brand.to_lowercase().contains(needle)
    }
}

fn validate_range(min: Option<f64>, max: Option<f64>) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(AppError::BadRequest(msg::PRICE_RANGE_INVALID.into()));
    }
    if min.is_some_and(|v| v < 0.0) || max.is_some_and(|v| v < 0.0) {
        return Err(AppError::BadRequest(msg::PRICE_RANGE_INVALID.into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateGpuModel {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub memory_gb: Option<i64>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub ram_gb: Option<i64>,
    #[serde(default)]
    pub ib_card: Option<String>,
    #[serde(default)]
    pub nvme_ssd: Option<String>,
    #[serde(default)]
    pub network_adapter: Option<String>,
    #[serde(default)]
    pub power_supply: Option<String>,
    #[serde(default)]
    pub rental_price_min: Option<f64>,
    #[serde(default)]
    pub rental_price_max: Option<f64>,
    #[serde(default)]
    pub sale_price_min: Option<f64>,
    #[serde(default)]
    pub sale_price_max: Option<f64>,
    #[serde(default)]
    pub availability: Availability,
}

impl CreateGpuModel {
    pub fn validate(&self) -> Result<()> {
        if non_blank(&self.name).is_none() || non_blank(&self.brand).is_none() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        validate_range(self.rental_price_min, self.rental_price_max)?;
        validate_range(self.sale_price_min, self.sale_price_max)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGpuModel {
    pub name: Option<String>,
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub memory_gb: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub cpu: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub ram_gb: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub ib_card: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub nvme_ssd: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub network_adapter: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub power_supply: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub rental_price_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub rental_price_max: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub sale_price_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub sale_price_max: Option<Option<f64>>,
    pub availability: Option<Availability>,
}

impl UpdateGpuModel {
    /// Validate the patch against the stored row so ranges stay ordered
    /// when only one bound changes.
    pub fn validate_against(&self, current: &GpuModel) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| non_blank(n).is_none())
            || self.brand.as_deref().is_some_and(|b| non_blank(b).is_none())
        {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        validate_range(
            self.rental_price_min.unwrap_or(current.rental_price_min),
            self.rental_price_max.unwrap_or(current.rental_price_max),
        )?;
        validate_range(
            self.sale_price_min.unwrap_or(current.sale_price_min),
            self.sale_price_max.unwrap_or(current.sale_price_max),
        )
    }
}

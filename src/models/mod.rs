mod actor;
mod company;
mod customer;
mod demand;
mod department;
mod gpu_model;
mod lifecycle;
mod operation_log;
mod role;
mod team;
mod user;

pub use actor::*;
pub use company::*;
pub use customer::*;
pub use demand::*;
pub use department::*;
pub use gpu_model::*;
pub use lifecycle::*;
pub use operation_log::*;
pub use role::*;
pub use team::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Distinguishes "field absent" from "field explicitly null" in PATCH-style bodies.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_optional_nullable")]`:
/// absent => `None`, `null` => `Some(None)`, value => `Some(Some(value))`.
pub(crate) fn deserialize_optional_nullable<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(Some(value))
}

/// Trim a required text field, returning None when it is blank.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

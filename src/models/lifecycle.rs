use serde::{Deserialize, Serialize};

/// Lifecycle state of a soft-deletable record.
///
/// Stored as a nullable `deleted_at` column; there is no transition back
/// from `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted {
        deleted_at: i64,
    },
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<i64>) -> Self {
        match deleted_at {
            Some(deleted_at) => Lifecycle::Deleted { deleted_at },
            None => Lifecycle::Active,
        }
    }

    pub fn deleted_at(&self) -> Option<i64> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::Deleted { deleted_at } => Some(*deleted_at),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn is_deleted(&self) -> bool {
        !self.is_active()
    }
}

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// Closed set of sales-organization roles.
///
/// Declared in privilege order, but access rules are always expressed as
/// role-set membership, never as threshold comparisons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Sales,
    SalesManager,
    SalesDirector,
    Admin,
}

/// How much of the company's owned data a role sees by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataScope {
    Company,
    Team,
    Own,
}

impl Role {
    pub fn data_scope(&self) -> DataScope {
        match self {
            Role::Admin | Role::SalesDirector => DataScope::Company,
            Role::SalesManager => DataScope::Team,
            Role::Sales => DataScope::Own,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "System Administrator",
            Role::SalesDirector => "Sales Director",
            Role::SalesManager => "Sales Manager",
            Role::Sales => "Sales Representative",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "All permissions, including employees, roles, departments and the operation log",
            Role::SalesDirector => "Company-wide data, manages demand status, reads the operation log",
            Role::SalesManager => "Team-wide data, sets demand categories, cannot change demand status",
            Role::Sales => "Own records only, business-sensitive fields hidden",
        }
    }
}

/// Role descriptor served by the roles module.
#[derive(Debug, Clone, Serialize)]
pub struct RoleInfo {
    pub code: Role,
    pub name: &'static str,
    pub description: &'static str,
    pub data_scope: DataScope,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            code: role,
            name: role.display_name(),
            description: role.description(),
            data_scope: role.data_scope(),
        }
    }
}

//! Access policy: row visibility, field visibility and field editability.
//!
//! Every decision is a pure function of the actor and an entity, module or
//! field name. Nothing here touches storage, and nothing here errors: an
//! actor without a recognized role is denied everything.
//!
//! Row rule (first match wins):
//! 1. deleted records are never visible
//! 2. ADMIN and SALES_DIRECTOR see every record
//! 3. SALES_MANAGER sees records of their own team (records without a team fall through)
//! 4. anyone sees records they created
//! 5. otherwise hidden
//!
//! Handlers must apply these checks at the API boundary; a client-side copy
//! of the same rules is a rendering hint only.

use std::str::FromStr;

use serde::Serialize;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::models::{Actor, Lifecycle, Role};

const ALL_ROLES: &[Role] = &[Role::Sales, Role::SalesManager, Role::SalesDirector, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const DIRECTOR_AND_UP: &[Role] = &[Role::Admin, Role::SalesDirector];
const MANAGER_AND_UP: &[Role] = &[Role::Admin, Role::SalesDirector, Role::SalesManager];

pub const CATEGORY_FIELD: &str = "category";
pub const STATUS_FIELD: &str = "status";
pub const PAYMENT_METHOD_FIELD: &str = "payment_method";

/// Shape shared by every record that is scoped by creator and team.
pub trait Owned {
    fn creator_id(&self) -> &str;
    fn team_id(&self) -> Option<&str>;
    fn lifecycle(&self) -> Lifecycle;
}

/// Logical modules of the application, keyed the same way as the UI menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Module {
    Dashboard,
    Employees,
    Roles,
    Departments,
    Logs,
    GpuModels,
    Customers,
    Companies,
    Demands,
    DemandCategories,
    DemandStatus,
    PaymentMethods,
}

struct FieldRule {
    module: Module,
    /// None restricts the whole module
    field: Option<&'static str>,
    roles: &'static [Role],
}

const FIELD_RULES: &[FieldRule] = &[
    FieldRule { module: Module::Employees, field: None, roles: ADMIN_ONLY },
    FieldRule { module: Module::Roles, field: None, roles: ADMIN_ONLY },
    FieldRule { module: Module::Departments, field: None, roles: ADMIN_ONLY },
    FieldRule { module: Module::Logs, field: None, roles: DIRECTOR_AND_UP },
    FieldRule { module: Module::DemandCategories, field: Some(CATEGORY_FIELD), roles: MANAGER_AND_UP },
    FieldRule { module: Module::DemandStatus, field: Some(STATUS_FIELD), roles: DIRECTOR_AND_UP },
    FieldRule { module: Module::PaymentMethods, field: Some(PAYMENT_METHOD_FIELD), roles: MANAGER_AND_UP },
    FieldRule { module: Module::GpuModels, field: None, roles: ALL_ROLES },
];

struct EditRule {
    field: &'static str,
    roles: &'static [Role],
}

const EDIT_RULES: &[EditRule] = &[
    EditRule { field: CATEGORY_FIELD, roles: MANAGER_AND_UP },
    EditRule { field: STATUS_FIELD, roles: DIRECTOR_AND_UP },
];

/// Row visibility for owned records.
pub fn can_see_row<E: Owned + ?Sized>(actor: &Actor, entity: &E) -> bool {
    if entity.lifecycle().is_deleted() {
        return false;
    }

    let Some(role) = actor.role else {
        return false;
    };

    if matches!(role, Role::Admin | Role::SalesDirector) {
        return true;
    }

    if role == Role::SalesManager
        && let (Some(entity_team), Some(actor_team)) = (entity.team_id(), actor.team_id.as_deref())
        && entity_team == actor_team
    {
        return true;
    }

    entity.creator_id() == actor.id
}

/// Keep only the records `actor` may see, preserving order.
pub fn visible_rows<E: Owned>(actor: &Actor, rows: Vec<E>) -> Vec<E> {
    rows.into_iter().filter(|row| can_see_row(actor, row)).collect()
}

/// Field visibility by module and field name.
///
/// ADMIN sees everything. A module or field absent from the table is
/// visible to every role. Names match regardless of ASCII case.
pub fn can_see_field(actor: &Actor, module: &str, field: &str) -> bool {
    let Some(role) = actor.role else {
        return false;
    };
    if role == Role::Admin {
        return true;
    }
    let Ok(module) = Module::from_str(module) else {
        return true;
    };

    FIELD_RULES
        .iter()
        .find(|rule| rule.module == module && rule.field.is_none_or(|f| f.eq_ignore_ascii_case(field)))
        .is_none_or(|rule| rule.roles.contains(&role))
}

/// Module-level visibility (menu gating). Uses the same table as
/// [`can_see_field`], regardless of which field a rule restricts.
pub fn can_see_module(actor: &Actor, module: Module) -> bool {
    let Some(role) = actor.role else {
        return false;
    };
    if role == Role::Admin {
        return true;
    }

    FIELD_RULES
        .iter()
        .find(|rule| rule.module == module)
        .is_none_or(|rule| rule.roles.contains(&role))
}

/// Field editability. Only `category` and `status` are restricted.
pub fn can_edit_field(actor: &Actor, field: &str) -> bool {
    let Some(role) = actor.role else {
        return false;
    };

    EDIT_RULES
        .iter()
        .find(|rule| rule.field == field)
        .is_none_or(|rule| rule.roles.contains(&role))
}

/// Adding, changing or removing GPU catalog entries.
pub fn can_edit_gpu_catalog(actor: &Actor) -> bool {
    actor.has_any_role(MANAGER_AND_UP)
}

pub fn can_clear_logs(actor: &Actor) -> bool {
    actor.has_any_role(ADMIN_ONLY)
}

/// Module and field decisions for one actor, served to the UI so it can
/// hide columns and disable controls.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSummary {
    pub role: Option<Role>,
    pub modules: Vec<Module>,
    pub visible_fields: Vec<FieldAccess>,
    pub editable_fields: Vec<&'static str>,
    pub can_edit_gpu_catalog: bool,
    pub can_clear_logs: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldAccess {
    pub module: Module,
    pub field: &'static str,
    pub visible: bool,
}

impl PermissionSummary {
    pub fn for_actor(actor: &Actor) -> Self {
        let modules = Module::iter().filter(|m| can_see_module(actor, *m)).collect();

        let visible_fields = FIELD_RULES
            .iter()
            .filter_map(|rule| {
                rule.field.map(|field| FieldAccess {
                    module: rule.module,
                    field,
                    visible: can_see_field(actor, rule.module.as_ref(), field),
                })
            })
            .collect();

        let editable_fields = EDIT_RULES
            .iter()
            .map(|rule| rule.field)
            .filter(|field| can_edit_field(actor, field))
            .collect();

        Self {
            role: actor.role,
            modules,
            visible_fields,
            editable_fields,
            can_edit_gpu_catalog: can_edit_gpu_catalog(actor),
            can_clear_logs: can_clear_logs(actor),
        }
    }
}

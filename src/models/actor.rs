use serde::Serialize;

use super::{Role, User};

/// The authenticated user performing an operation.
///
/// Snapshot taken at login and stored with the session; immutable until the
/// user logs in again.
/// `role` is `None` when the stored role is not one of the known roles, and
/// every policy check for such an actor denies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: String,
    pub role: Option<Role>,
    pub team_id: Option<String>,
    pub department_id: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role: Some(role),
            team_id: None,
            department_id: None,
        }
    }

    /// An actor whose stored role could not be recognized.
    pub fn without_role(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: None,
            team_id: None,
            department_id: None,
        }
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// True if the actor holds one of `roles`. Always false without a role.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role.is_some_and(|role| roles.contains(&role))
    }
}

/// A live session: the actor as captured at login plus the current user row.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub user: User,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
            team_id: user.team_id.clone(),
            department_id: user.department_id.clone(),
        }
    }
}

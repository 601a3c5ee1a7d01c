use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::identity;
use crate::models::{Actor, User};
use crate::policy::{self, Module};
use crate::util::extract_bearer_token;

/// The authenticated caller, inserted by [`actor_auth`] for every protected route.
#[derive(Clone)]
pub struct ActorContext {
    pub actor: Actor,
    pub user: User,
    /// Raw bearer token, kept so logout can revoke exactly this session
    pub token: String,
    /// Request method and path, for the operation log
    pub method: String,
    pub path: String,
}

impl ActorContext {
    pub fn require_module(&self, module: Module) -> Result<()> {
        if policy::can_see_module(&self.actor, module) {
            Ok(())
        } else {
            Err(AppError::Forbidden(msg::MODULE_FORBIDDEN.into()))
        }
    }

    pub fn require_gpu_catalog_write(&self) -> Result<()> {
        if policy::can_edit_gpu_catalog(&self.actor) {
            Ok(())
        } else {
            Err(AppError::Forbidden(msg::CATALOG_WRITE_FORBIDDEN.into()))
        }
    }

    pub fn require_log_clear(&self) -> Result<()> {
        if policy::can_clear_logs(&self.actor) {
            Ok(())
        } else {
            Err(AppError::Forbidden(msg::LOG_CLEAR_FORBIDDEN.into()))
        }
    }
}

/// Resolve the bearer session token to an actor. Unknown, revoked and stale
/// sessions get a JSON 401.
pub async fn actor_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    // Connection is released before the handler runs
    let (actor, user) = {
        let conn = state.db.get()?;
        identity::resolve_actor(&conn, &token)?.ok_or(AppError::Unauthorized)?
    };

    tracing::debug!(user_id = %actor.id, role = ?actor.role, "request authenticated");

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(ActorContext {
        actor,
        user,
        token,
        method,
        path,
    });
    Ok(next.run(request).await)
}

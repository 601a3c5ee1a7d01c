use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::{CurrentActor, Json};
use crate::identity::{self, AuthError};
use crate::models::{Actor, OperationType, User};
use crate::policy::PermissionSummary;
use crate::util::OperationLogBuilder;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests. Shown only once.
    pub token: String,
    pub user: User,
    pub permissions: PermissionSummary,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub actor: Actor,
    pub permissions: PermissionSummary,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    match identity::login(&conn, state.verifier.as_ref(), &input.username, &input.password) {
        Ok(login) => {
            tracing::info!(user_id = %login.user.id, "login succeeded");

            OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
                .user(&login.user)
                .operation("auth", OperationType::Login)
                .request("POST", "/auth/login")
                .description("signed in")
                .save()?;

            Ok(Json(LoginResponse {
                permissions: PermissionSummary::for_actor(&login.actor),
                token: login.token,
                user: login.user,
            }))
        }
        Err(AuthError::Storage(e)) => Err(e),
        Err(e) => {
            tracing::info!(username = %input.username, "login rejected: {}", e);

            OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
                .operation("auth", OperationType::Login)
                .request("POST", "/auth/login")
                .description(format!("sign-in attempt for {}", input.username))
                .failed(e.to_string())
                .save()?;

            Err(AppError::Unauthorized)
        }
    }
}

/// Revoke the calling session.
pub async fn logout(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    identity::logout(&conn, &ctx.token)?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation("auth", OperationType::Logout)
        .description("signed out")
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn me(CurrentActor(ctx): CurrentActor) -> Result<Json<MeResponse>> {
    Ok(Json(MeResponse {
        permissions: PermissionSummary::for_actor(&ctx.actor),
        actor: ctx.actor,
        user: ctx.user,
    }))
}

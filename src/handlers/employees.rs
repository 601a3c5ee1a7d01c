use axum::{extract::State, http::HeaderMap};
use strum::IntoEnumIterator;

use crate::crypto::hash_password;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{CurrentActor, Json, Path, Query};
use crate::models::{CreateUser, OperationType, Role, RoleInfo, UpdateUser, User};
use crate::pagination::{ListQuery, Paginated};
use crate::policy::Module;
use crate::util::OperationLogBuilder;

fn user_matches(user: &User, needle: &str) -> bool {
    user.username.to_lowercase().contains(needle) || user.real_name.to_lowercase().contains(needle)
}

pub async fn list_employees(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<User>>> {
    ctx.require_module(Module::Employees)?;

    let conn = state.db.get()?;
    let users = queries::list_users(&conn)?;
    Ok(Json(query.apply(users, user_matches)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    ctx.require_module(Module::Employees)?;

    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::EMPLOYEE_NOT_FOUND.into()))?;
    Ok(Json(user))
}

pub async fn create_employee(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
    Json(input): Json<CreateUser>,
) -> Result<Json<User>> {
    ctx.require_module(Module::Employees)?;
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    queries::ensure_department_exists(&conn, input.department_id.as_deref())?;
    queries::ensure_team_exists(&conn, input.team_id.as_deref())?;

    let user = queries::create_user(&conn, &input, &hash_password(&input.password))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Employees.as_ref(), OperationType::Add)
        .target(&user.id)
        .description(format!("created employee {}", user.username))
        .new_value(serde_json::to_value(&user)?)
        .save()?;

    Ok(Json(user))
}

pub async fn update_employee(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>> {
    ctx.require_module(Module::Employees)?;
    input.validate()?;

    // Prevent changing your own role
    if id == ctx.actor.id && input.role.is_some_and(|r| Some(r) != ctx.actor.role) {
        return Err(AppError::BadRequest(msg::CANNOT_CHANGE_OWN_ROLE.into()));
    }

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_user_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::EMPLOYEE_NOT_FOUND.into()))?;

    if let Some(ref department_id) = input.department_id {
        queries::ensure_department_exists(&conn, department_id.as_deref())?;
    }
    if let Some(ref team_id) = input.team_id {
        queries::ensure_team_exists(&conn, team_id.as_deref())?;
    }

    let password_hash = input.password.as_deref().map(hash_password);
    let user = queries::update_user(&conn, &id, &input, password_hash.as_deref())?
        .ok_or_else(|| AppError::NotFound(msg::EMPLOYEE_NOT_FOUND.into()))?;

    // Sessions carry the actor as of login; disabling or reassigning the
    // account ends them so the next login picks up the change
    let reassigned = user.role != existing.role
        || user.team_id != existing.team_id
        || user.department_id != existing.department_id;
    if !user.is_enabled() || reassigned {
        queries::delete_sessions_for_user(&conn, &user.id)?;
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Employees.as_ref(), OperationType::Update)
        .target(&user.id)
        .description(format!("updated employee {}", user.username))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&user)?)
        .save()?;

    Ok(Json(user))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    ctx.require_module(Module::Employees)?;

    if id == ctx.actor.id {
        return Err(AppError::BadRequest(msg::CANNOT_DELETE_SELF.into()));
    }

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_user_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::EMPLOYEE_NOT_FOUND.into()))?;

    if !queries::soft_delete_user(&conn, &id)? {
        return Err(AppError::NotFound(msg::EMPLOYEE_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Employees.as_ref(), OperationType::Delete)
        .target(&id)
        .description(format!("deleted employee {}", existing.username))
        .old_value(serde_json::to_value(&existing)?)
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// The fixed role set with descriptions.
pub async fn list_roles(CurrentActor(ctx): CurrentActor) -> Result<Json<Vec<RoleInfo>>> {
    ctx.require_module(Module::Roles)?;
    Ok(Json(Role::iter().map(RoleInfo::from).collect()))
}

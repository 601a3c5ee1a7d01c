//! Departments and teams. Both sit behind the departments module gate.

use axum::{extract::State, http::HeaderMap};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{CurrentActor, Json, Path, Query};
use crate::models::{CreateDepartment, CreateTeam, Department, OperationType, Team, UpdateDepartment, UpdateTeam};
use crate::pagination::{ListQuery, Paginated};
use crate::policy::Module;
use crate::util::OperationLogBuilder;

const TEAMS_MODULE: &str = "teams";

pub async fn list_departments(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Department>>> {
    ctx.require_module(Module::Departments)?;

    let conn = state.db.get()?;
    let departments = queries::list_departments(&conn)?;
    Ok(Json(query.apply(departments, |d, needle| {
        d.name.to_lowercase().contains(needle) || d.code.to_lowercase().contains(needle)
    })))
}

pub async fn create_department(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
    Json(input): Json<CreateDepartment>,
) -> Result<Json<Department>> {
    ctx.require_module(Module::Departments)?;
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let department = queries::create_department(&conn, &input, Some(&ctx.actor.id))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Departments.as_ref(), OperationType::Add)
        .target(&department.id)
        .description(format!("created department {}", department.name))
        .new_value(serde_json::to_value(&department)?)
        .save()?;

    Ok(Json(department))
}

pub async fn update_department(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateDepartment>,
) -> Result<Json<Department>> {
    ctx.require_module(Module::Departments)?;
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_department_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::DEPARTMENT_NOT_FOUND.into()))?;
    let department = queries::update_department(&conn, &id, &input)?
        .ok_or_else(|| AppError::NotFound(msg::DEPARTMENT_NOT_FOUND.into()))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Departments.as_ref(), OperationType::Update)
        .target(&id)
        .description(format!("updated department {}", department.name))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&department)?)
        .save()?;

    Ok(Json(department))
}

pub async fn delete_department(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    ctx.require_module(Module::Departments)?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_department_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::DEPARTMENT_NOT_FOUND.into()))?;

    if queries::list_teams(&conn)?.iter().any(|t| t.department_id == id) {
        return Err(AppError::Conflict("Department still has teams".into()));
    }

    if !queries::soft_delete_department(&conn, &id)? {
        return Err(AppError::NotFound(msg::DEPARTMENT_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Departments.as_ref(), OperationType::Delete)
        .target(&id)
        .description(format!("deleted department {}", existing.name))
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn list_teams(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Team>>> {
    ctx.require_module(Module::Departments)?;

    let conn = state.db.get()?;
    let teams = queries::list_teams(&conn)?;
    Ok(Json(query.apply(teams, |t, needle| t.name.to_lowercase().contains(needle))))
}

pub async fn create_team(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
    Json(input): Json<CreateTeam>,
) -> Result<Json<Team>> {
    ctx.require_module(Module::Departments)?;
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    queries::ensure_department_exists(&conn, Some(&input.department_id))?;
    let team = queries::create_team(&conn, &input)?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(TEAMS_MODULE, OperationType::Add)
        .target(&team.id)
        .description(format!("created team {}", team.name))
        .new_value(serde_json::to_value(&team)?)
        .save()?;

    Ok(Json(team))
}

pub async fn update_team(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateTeam>,
) -> Result<Json<Team>> {
    ctx.require_module(Module::Departments)?;
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_team_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::TEAM_NOT_FOUND.into()))?;
    queries::ensure_department_exists(&conn, input.department_id.as_deref())?;

    let team = queries::update_team(&conn, &id, &input)?
        .ok_or_else(|| AppError::NotFound(msg::TEAM_NOT_FOUND.into()))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(TEAMS_MODULE, OperationType::Update)
        .target(&id)
        .description(format!("updated team {}", team.name))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&team)?)
        .save()?;

    Ok(Json(team))
}

pub async fn delete_team(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    ctx.require_module(Module::Departments)?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_team_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::TEAM_NOT_FOUND.into()))?;

    if !queries::soft_delete_team(&conn, &id)? {
        return Err(AppError::NotFound(msg::TEAM_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(TEAMS_MODULE, OperationType::Delete)
        .target(&id)
        .description(format!("deleted team {}", existing.name))
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

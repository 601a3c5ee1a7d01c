//! Company profiles. Same row scoping as customers.

use axum::{extract::State, http::HeaderMap};

use super::require_visible;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{CurrentActor, Json, Path, Query};
use crate::models::{Company, CreateCompany, OperationType, UpdateCompany};
use crate::pagination::{ListQuery, Paginated};
use crate::policy::{self, Module};
use crate::util::OperationLogBuilder;

pub async fn list_companies(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Company>>> {
    let conn = state.db.get()?;
    let rows = policy::visible_rows(&ctx.actor, queries::list_companies(&conn)?);
    Ok(Json(query.apply(rows, Company::matches)))
}

pub async fn get_company(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Company>> {
    let conn = state.db.get()?;
    let company = require_visible(
        &ctx.actor,
        queries::get_company_by_id(&conn, &id)?,
        msg::COMPANY_NOT_FOUND,
    )?;
    Ok(Json(company))
}

pub async fn create_company(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
    Json(input): Json<CreateCompany>,
) -> Result<Json<Company>> {
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let company = queries::create_company(&conn, &input, &ctx.actor)?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Companies.as_ref(), OperationType::Add)
        .target(&company.id)
        .description(format!("created company {}", company.name))
        .new_value(serde_json::to_value(&company)?)
        .save()?;

    Ok(Json(company))
}

pub async fn update_company(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateCompany>,
) -> Result<Json<Company>> {
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = require_visible(
        &ctx.actor,
        queries::get_company_by_id(&conn, &id)?,
        msg::COMPANY_NOT_FOUND,
    )?;
    let company = queries::update_company(&conn, &id, &input)?
        .ok_or_else(|| AppError::NotFound(msg::COMPANY_NOT_FOUND.into()))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Companies.as_ref(), OperationType::Update)
        .target(&id)
        .description(format!("updated company {}", company.name))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&company)?)
        .save()?;

    Ok(Json(company))
}

pub async fn delete_company(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = require_visible(
        &ctx.actor,
        queries::get_company_by_id(&conn, &id)?,
        msg::COMPANY_NOT_FOUND,
    )?;

    if !queries::soft_delete_company(&conn, &id)? {
        return Err(AppError::NotFound(msg::COMPANY_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Companies.as_ref(), OperationType::Delete)
        .target(&id)
        .description(format!("deleted company {}", existing.name))
        .old_value(serde_json::to_value(&existing)?)
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

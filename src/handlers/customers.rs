//! Customer records, scoped per row by creator and team.

use axum::{extract::State, http::HeaderMap};

use super::require_visible;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{CurrentActor, Json, Path, Query};
use crate::models::{CreateCustomer, Customer, OperationType, UpdateCustomer};
use crate::pagination::{ListQuery, Paginated};
use crate::policy::{self, Module};
use crate::util::OperationLogBuilder;

pub async fn list_customers(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Customer>>> {
    let conn = state.db.get()?;
    let rows = policy::visible_rows(&ctx.actor, queries::list_customers(&conn)?);
    Ok(Json(query.apply(rows, Customer::matches)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Customer>> {
    let conn = state.db.get()?;
    let customer = require_visible(
        &ctx.actor,
        queries::get_customer_by_id(&conn, &id)?,
        msg::CUSTOMER_NOT_FOUND,
    )?;
    Ok(Json(customer))
}

pub async fn create_customer(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
    Json(input): Json<CreateCustomer>,
) -> Result<Json<Customer>> {
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let customer = queries::create_customer(&conn, &input, &ctx.actor)?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Customers.as_ref(), OperationType::Add)
        .target(&customer.id)
        .description(format!("created customer {}", customer.name))
        .new_value(serde_json::to_value(&customer)?)
        .save()?;

    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateCustomer>,
) -> Result<Json<Customer>> {
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = require_visible(
        &ctx.actor,
        queries::get_customer_by_id(&conn, &id)?,
        msg::CUSTOMER_NOT_FOUND,
    )?;
    let customer = queries::update_customer(&conn, &id, &input)?
        .ok_or_else(|| AppError::NotFound(msg::CUSTOMER_NOT_FOUND.into()))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Customers.as_ref(), OperationType::Update)
        .target(&id)
        .description(format!("updated customer {}", customer.name))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&customer)?)
        .save()?;

    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = require_visible(
        &ctx.actor,
        queries::get_customer_by_id(&conn, &id)?,
        msg::CUSTOMER_NOT_FOUND,
    )?;

    if !queries::soft_delete_customer(&conn, &id)? {
        return Err(AppError::NotFound(msg::CUSTOMER_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Customers.as_ref(), OperationType::Delete)
        .target(&id)
        .description(format!("deleted customer {}", existing.name))
        .old_value(serde_json::to_value(&existing)?)
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

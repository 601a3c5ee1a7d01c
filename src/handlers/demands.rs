//! Rental, purchase and project demands under `/demands/{kind}`.
//!
//! Reads go through [`DemandView::for_actor`] so category, status and
//! payment method are withheld from roles that cannot see them.

use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap};
use rusqlite::Connection;

use super::require_visible;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{CurrentActor, Json, Path, Query};
use crate::models::{Actor, CreateDemand, Demand, DemandKind, DemandView, OperationType, UpdateDemand};
use crate::pagination::{ListQuery, Paginated};
use crate::policy::{self, Module};
use crate::util::OperationLogBuilder;

/// Resolve display names for a single demand. A customer the actor cannot
/// see resolves to no name, like a dangling reference.
fn view(conn: &Connection, actor: &Actor, demand: Demand) -> Result<DemandView> {
    let customer_name = match demand.customer_id.as_deref() {
        Some(id) => queries::get_customer_by_id(conn, id)?
            .filter(|c| policy::can_see_row(actor, c))
            .map(|c| c.name),
        None => None,
    };
    let gpu_model_name = match demand.details.gpu_model_id() {
        Some(id) => queries::get_gpu_model_by_id(conn, id)?.map(|m| m.name),
        None => None,
    };
    Ok(DemandView::for_actor(actor, demand, customer_name, gpu_model_name))
}

/// Names of the customers the actor can see, keyed by id.
fn visible_customer_names(conn: &Connection, actor: &Actor) -> Result<HashMap<String, String>> {
    let customers = policy::visible_rows(actor, queries::list_customers(conn)?);
    Ok(customers.into_iter().map(|c| (c.id, c.name)).collect())
}

/// A demand may only reference a customer the actor can see.
fn check_customer_link(conn: &Connection, actor: &Actor, customer_id: Option<&str>) -> Result<()> {
    if let Some(id) = customer_id {
        require_visible(actor, queries::get_customer_by_id(conn, id)?, msg::CUSTOMER_NOT_FOUND)?;
    }
    Ok(())
}

/// Parse a create body, taking the kind from the path. A body that names a
/// different kind is rejected.
fn parse_create(kind: DemandKind, mut body: serde_json::Value) -> Result<CreateDemand> {
    let object = body
        .as_object_mut()
        .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".into()))?;

    match object.get("kind").and_then(|v| v.as_str()) {
        Some(given) if given != kind.as_ref() => {
            return Err(AppError::BadRequest(msg::DEMAND_KIND_MISMATCH.into()));
        }
        _ => {}
    }
    object.insert("kind".into(), serde_json::Value::String(kind.as_ref().into()));

    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

pub async fn list_demands(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(kind): Path<DemandKind>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<DemandView>>> {
    let conn = state.db.get()?;
    let customers = visible_customer_names(&conn, &ctx.actor)?;
    let gpu_models = queries::gpu_model_names(&conn)?;

    let rows = policy::visible_rows(&ctx.actor, queries::list_demands(&conn, kind)?);
    let page = query
        .apply(rows, |demand, needle| {
            let customer_name = demand.customer_id.as_ref().and_then(|id| customers.get(id));
            demand.matches(needle, customer_name.map(String::as_str))
        })
        .map(|demand| {
            let customer_name = demand.customer_id.as_ref().and_then(|id| customers.get(id).cloned());
            let gpu_model_name = demand.details.gpu_model_id().and_then(|id| gpu_models.get(id).cloned());
            DemandView::for_actor(&ctx.actor, demand, customer_name, gpu_model_name)
        });

    Ok(Json(page))
}

pub async fn get_demand(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((kind, id)): Path<(DemandKind, String)>,
) -> Result<Json<DemandView>> {
    let conn = state.db.get()?;
    let demand = require_visible(
        &ctx.actor,
        queries::get_demand_by_id(&conn, kind, &id)?,
        msg::DEMAND_NOT_FOUND,
    )?;
    Ok(Json(view(&conn, &ctx.actor, demand)?))
}

pub async fn create_demand(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(kind): Path<DemandKind>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<DemandView>> {
    let input = parse_create(kind, body)?;
    input.validate()?;
    input.check_editable(&ctx.actor)?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    check_customer_link(&conn, &ctx.actor, input.customer_id.as_deref())?;
    let demand = queries::create_demand(&conn, &input, &ctx.actor)?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Demands.as_ref(), OperationType::Add)
        .target(&demand.id)
        .description(format!("created {} demand {}", kind.as_ref(), demand.title))
        .new_value(serde_json::to_value(&demand)?)
        .save()?;

    Ok(Json(view(&conn, &ctx.actor, demand)?))
}

pub async fn update_demand(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((kind, id)): Path<(DemandKind, String)>,
    headers: HeaderMap,
    Json(input): Json<UpdateDemand>,
) -> Result<Json<DemandView>> {
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = require_visible(
        &ctx.actor,
        queries::get_demand_by_id(&conn, kind, &id)?,
        msg::DEMAND_NOT_FOUND,
    )?;
    input.check_editable(&ctx.actor)?;
    if let Some(Some(ref customer_id)) = input.customer_id {
        check_customer_link(&conn, &ctx.actor, Some(customer_id))?;
    }

    let demand = queries::update_demand(&conn, kind, &id, &input)?
        .ok_or_else(|| AppError::NotFound(msg::DEMAND_NOT_FOUND.into()))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Demands.as_ref(), OperationType::Update)
        .target(&id)
        .description(format!("updated {} demand {}", kind.as_ref(), demand.title))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&demand)?)
        .save()?;

    Ok(Json(view(&conn, &ctx.actor, demand)?))
}

pub async fn delete_demand(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path((kind, id)): Path<(DemandKind, String)>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = require_visible(
        &ctx.actor,
        queries::get_demand_by_id(&conn, kind, &id)?,
        msg::DEMAND_NOT_FOUND,
    )?;

    if !queries::soft_delete_demand(&conn, kind, &id)? {
        return Err(AppError::NotFound(msg::DEMAND_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Demands.as_ref(), OperationType::Delete)
        .target(&id)
        .description(format!("deleted {} demand {}", kind.as_ref(), existing.title))
        .old_value(serde_json::to_value(&existing)?)
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

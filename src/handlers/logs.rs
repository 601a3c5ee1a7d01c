use axum::{extract::State, http::HeaderMap};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{CurrentActor, Json, Query};
use crate::models::{OperationLogQuery, OperationLogResponse, OperationType};
use crate::pagination::Paginated;
use crate::policy::Module;
use crate::util::OperationLogBuilder;

/// Newest first, filtered by user, module, operation type and time range.
pub async fn list_logs(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Query(query): Query<OperationLogQuery>,
) -> Result<Json<Paginated<OperationLogResponse>>> {
    ctx.require_module(Module::Logs)?;

    let conn = state.log.get()?;
    let (items, total) = queries::query_operation_logs(&conn, &query)?;
    let page = Paginated::new(items, total, query.limit(), query.offset());
    Ok(Json(page.map(OperationLogResponse::from)))
}

/// Wipe the log. The clear itself is recorded as the first new entry.
pub async fn clear_logs(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    ctx.require_log_clear()?;

    let conn = state.log.get()?;
    let deleted = queries::clear_operation_logs(&conn)?;

    tracing::info!(user_id = %ctx.actor.id, deleted, "operation log cleared");

    OperationLogBuilder::new(&conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::Logs.as_ref(), OperationType::Clear)
        .description(format!("cleared {} log entries", deleted))
        .save()?;

    Ok(Json(serde_json::json!({ "success": true, "deleted": deleted })))
}

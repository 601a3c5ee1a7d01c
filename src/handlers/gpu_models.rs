//! GPU catalog. Readable by every authenticated role; writes need the
//! catalog write gate. No row-level scoping applies.

use axum::{extract::State, http::HeaderMap};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::extractors::{CurrentActor, Json, Path, Query};
use crate::models::{CreateGpuModel, GpuModel, OperationType, UpdateGpuModel};
use crate::pagination::{ListQuery, Paginated};
use crate::policy::Module;
use crate::util::OperationLogBuilder;

pub async fn list_gpu_models(
    State(state): State<AppState>,
    CurrentActor(_ctx): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<GpuModel>>> {
    let conn = state.db.get()?;
    let models = queries::list_gpu_models(&conn)?;
    Ok(Json(query.apply(models, GpuModel::matches)))
}

pub async fn get_gpu_model(
    State(state): State<AppState>,
    CurrentActor(_ctx): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<GpuModel>> {
    let conn = state.db.get()?;
    let model = queries::get_gpu_model_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::GPU_MODEL_NOT_FOUND.into()))?;
    Ok(Json(model))
}

pub async fn create_gpu_model(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    headers: HeaderMap,
    Json(input): Json<CreateGpuModel>,
) -> Result<Json<GpuModel>> {
    ctx.require_gpu_catalog_write()?;
    input.validate()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let model = queries::create_gpu_model(&conn, &input, Some(&ctx.actor.id))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::GpuModels.as_ref(), OperationType::Add)
        .target(&model.id)
        .description(format!("added GPU model {} {}", model.brand, model.name))
        .new_value(serde_json::to_value(&model)?)
        .save()?;

    Ok(Json(model))
}

pub async fn update_gpu_model(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateGpuModel>,
) -> Result<Json<GpuModel>> {
    ctx.require_gpu_catalog_write()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_gpu_model_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::GPU_MODEL_NOT_FOUND.into()))?;
    input.validate_against(&existing)?;

    let model = queries::update_gpu_model(&conn, &id, &input)?
        .ok_or_else(|| AppError::NotFound(msg::GPU_MODEL_NOT_FOUND.into()))?;

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::GpuModels.as_ref(), OperationType::Update)
        .target(&id)
        .description(format!("updated GPU model {} {}", model.brand, model.name))
        .old_value(serde_json::to_value(&existing)?)
        .new_value(serde_json::to_value(&model)?)
        .save()?;

    Ok(Json(model))
}

pub async fn delete_gpu_model(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    ctx.require_gpu_catalog_write()?;

    let conn = state.db.get()?;
    let log_conn = state.log.get()?;

    let existing = queries::get_gpu_model_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(msg::GPU_MODEL_NOT_FOUND.into()))?;

    if !queries::soft_delete_gpu_model(&conn, &id)? {
        return Err(AppError::NotFound(msg::GPU_MODEL_NOT_FOUND.into()));
    }

    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .context(&ctx)
        .operation(Module::GpuModels.as_ref(), OperationType::Delete)
        .target(&id)
        .description(format!("removed GPU model {} {}", existing.brand, existing.name))
        .old_value(serde_json::to_value(&existing)?)
        .save()?;

    Ok(Json(serde_json::json!({ "success": true })))
}

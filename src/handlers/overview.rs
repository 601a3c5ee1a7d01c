use std::collections::BTreeMap;

use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{CurrentActor, Json};
use crate::models::DemandKind;
use crate::policy::{self, PermissionSummary, STATUS_FIELD};

/// Field and module decisions for the caller, used by the UI to hide
/// columns and disable controls.
pub async fn my_permissions(CurrentActor(ctx): CurrentActor) -> Result<Json<PermissionSummary>> {
    Ok(Json(PermissionSummary::for_actor(&ctx.actor)))
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub customers: usize,
    pub companies: usize,
    pub rental_demands: usize,
    pub purchase_demands: usize,
    pub project_demands: usize,
    pub gpu_models: usize,
    /// Visible demands per status; omitted for roles that cannot see status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demands_by_status: Option<BTreeMap<String, usize>>,
}

/// Counts over the rows the caller can see.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentActor(ctx): CurrentActor,
) -> Result<Json<DashboardStats>> {
    let conn = state.db.get()?;
    let actor = &ctx.actor;

    let customers = policy::visible_rows(actor, queries::list_customers(&conn)?).len();
    let companies = policy::visible_rows(actor, queries::list_companies(&conn)?).len();
    let gpu_models = queries::list_gpu_models(&conn)?.len();

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut count_kind = |kind| -> Result<usize> {
        let demands = policy::visible_rows(actor, queries::list_demands(&conn, kind)?);
        for demand in &demands {
            *by_status.entry(demand.status.as_ref().to_string()).or_default() += 1;
        }
        Ok(demands.len())
    };
    let rental_demands = count_kind(DemandKind::Rental)?;
    let purchase_demands = count_kind(DemandKind::Purchase)?;
    let project_demands = count_kind(DemandKind::Project)?;

    let show_status = policy::can_see_field(actor, "demand_status", STATUS_FIELD);

    Ok(Json(DashboardStats {
        customers,
        companies,
        rental_demands,
        purchase_demands,
        project_demands,
        gpu_models,
        demands_by_status: show_status.then_some(by_status),
    }))
}

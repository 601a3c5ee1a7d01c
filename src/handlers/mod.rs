mod auth;
mod companies;
mod customers;
mod demands;
mod employees;
mod gpu_models;
mod logs;
mod org_structure;
mod overview;

pub use auth::*;
pub use companies::*;
pub use customers::*;
pub use demands::*;
pub use employees::*;
pub use gpu_models::*;
pub use logs::*;
pub use org_structure::*;
pub use overview::*;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::middleware::actor_auth;
use crate::models::Actor;
use crate::policy::{self, Owned};

pub fn router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new().route("/auth/login", post(login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/me/permissions", get(my_permissions))
        .route("/dashboard", get(dashboard))
        // Employees and roles
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/{id}", get(get_employee).put(update_employee).delete(delete_employee))
        .route("/roles", get(list_roles))
        // Org structure
        .route("/departments", get(list_departments).post(create_department))
        .route("/departments/{id}", put(update_department).delete(delete_department))
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", put(update_team).delete(delete_team))
        // GPU catalog
        .route("/gpu-models", get(list_gpu_models).post(create_gpu_model))
        .route("/gpu-models/{id}", get(get_gpu_model).put(update_gpu_model).delete(delete_gpu_model))
        // Owned records
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", get(get_customer).put(update_customer).delete(delete_customer))
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/{id}", get(get_company).put(update_company).delete(delete_company))
        .route("/demands/{kind}", get(list_demands).post(create_demand))
        .route("/demands/{kind}/{id}", get(get_demand).put(update_demand).delete(delete_demand))
        // Operation log
        .route("/logs", get(list_logs).delete(clear_logs))
        .layer(middleware::from_fn_with_state(state, actor_auth));

    public_routes.merge(protected_routes)
}

/// Return the record if the actor may see it. Missing, deleted and
/// invisible records all look the same to the caller.
pub(crate) fn require_visible<E: Owned>(actor: &Actor, record: Option<E>, not_found: &str) -> Result<E> {
    match record {
        Some(record) if policy::can_see_row(actor, &record) => Ok(record),
        _ => Err(AppError::NotFound(not_found.into())),
    }
}

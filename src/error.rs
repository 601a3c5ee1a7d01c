use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared across handlers.
pub mod msg {
    pub const CUSTOMER_NOT_FOUND: &str = "Customer not found";
    pub const COMPANY_NOT_FOUND: &str = "Company not found";
    pub const DEMAND_NOT_FOUND: &str = "Demand not found";
    pub const EMPLOYEE_NOT_FOUND: &str = "Employee not found";
    pub const DEPARTMENT_NOT_FOUND: &str = "Department not found";
    pub const TEAM_NOT_FOUND: &str = "Team not found";
    pub const GPU_MODEL_NOT_FOUND: &str = "GPU model not found";

    pub const MODULE_FORBIDDEN: &str = "Your role cannot access this module";
    pub const CATALOG_WRITE_FORBIDDEN: &str = "Your role cannot modify the GPU catalog";
    pub const CATEGORY_EDIT_FORBIDDEN: &str = "Your role cannot set the demand category";
    pub const STATUS_EDIT_FORBIDDEN: &str = "Your role cannot set the demand status";
    pub const LOG_CLEAR_FORBIDDEN: &str = "Only administrators can clear the operation log";

    pub const NAME_EMPTY: &str = "Name cannot be empty";
    pub const TITLE_EMPTY: &str = "Title cannot be empty";
    pub const USERNAME_EMPTY: &str = "Username cannot be empty";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
    pub const CODE_EMPTY: &str = "Department code cannot be empty";
    pub const PRICE_RANGE_INVALID: &str = "Minimum price cannot exceed maximum price";
    pub const CANNOT_DELETE_SELF: &str = "Cannot delete yourself";
    pub const CANNOT_CHANGE_OWN_ROLE: &str = "Cannot change your own role";
    pub const UNKNOWN_DEPARTMENT: &str = "Department does not exist";
    pub const UNKNOWN_TEAM: &str = "Team does not exist";
    pub const DEMAND_KIND_MISMATCH: &str = "Details do not match the demand kind";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// Map SQLite unique-constraint violations to a 409 with the given message.
    pub fn conflict_on_unique(err: rusqlite::Error, message: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::Conflict(message.to_string())
            }
            other => AppError::Database(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

//! Shared request helpers and the operation log builder.

use axum::http::HeaderMap;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::error::Result;
use crate::middleware::ActorContext;
use crate::models::{OperationLog, OperationType, User};

/// Extract client IP address and user-agent from request headers.
///
/// Tries `x-forwarded-for` first (for proxied requests), then `x-real-ip`.
pub fn extract_request_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    (ip, user_agent)
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Builder for operation log entries.
///
/// # Example
/// ```ignore
/// OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
///     .context(&ctx)
///     .operation("customers", OperationType::Add)
///     .target(&customer.id)
///     .description(format!("created customer {}", customer.name))
///     .new_value(serde_json::to_value(&customer)?)
///     .save()?;
/// ```
pub struct OperationLogBuilder<'a> {
    conn: &'a Connection,
    enabled: bool,
    headers: &'a HeaderMap,
    user: Option<&'a User>,
    module: &'a str,
    operation_type: OperationType,
    description: String,
    target_id: Option<&'a str>,
    request: Option<(&'a str, &'a str)>,
    error_message: Option<String>,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
}

impl<'a> OperationLogBuilder<'a> {
    pub fn new(conn: &'a Connection, enabled: bool, headers: &'a HeaderMap) -> Self {
        Self {
            conn,
            enabled,
            headers,
            user: None,
            module: "",
            operation_type: OperationType::Update,
            description: String::new(),
            target_id: None,
            request: None,
            error_message: None,
            old_value: None,
            new_value: None,
        }
    }

    pub fn user(mut self, user: &'a User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn operation(mut self, module: &'a str, operation_type: OperationType) -> Self {
        self.module = module;
        self.operation_type = operation_type;
        self
    }

    pub fn target(mut self, target_id: &'a str) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// HTTP method and path of the request being logged.
    pub fn request(mut self, method: &'a str, path: &'a str) -> Self {
        self.request = Some((method, path));
        self
    }

    /// Attribute the entry to the authenticated caller and their request.
    pub fn context(self, ctx: &'a ActorContext) -> Self {
        self.user(&ctx.user).request(&ctx.method, &ctx.path)
    }

    /// Record the entry as a failed operation.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }

    pub fn old_value(mut self, value: serde_json::Value) -> Self {
        self.old_value = Some(value);
        self
    }

    pub fn new_value(mut self, value: serde_json::Value) -> Self {
        self.new_value = Some(value);
        self
    }

    /// Write the entry, or only build it when logging is disabled.
    pub fn save(self) -> Result<OperationLog> {
        let (ip_address, user_agent) = extract_request_info(self.headers);
        let entry = OperationLog {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp(),
            user_id: self.user.map(|u| u.id.clone()),
            username: self.user.map(|u| u.username.clone()),
            real_name: self.user.map(|u| u.real_name.clone()),
            module: self.module.to_string(),
            operation_type: self.operation_type,
            description: self.description,
            target_id: self.target_id.map(String::from),
            request_method: self.request.map(|(m, _)| m.to_string()),
            request_path: self.request.map(|(_, p)| p.to_string()),
            ip_address,
            user_agent,
            success: self.error_message.is_none(),
            error_message: self.error_message,
            old_value: self.old_value,
            new_value: self.new_value,
        };

        if self.enabled {
            queries::create_operation_log(self.conn, &entry)?;
        }
        Ok(entry)
    }
}

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Add,
    Update,
    Delete,
    Login,
    Logout,
    Clear,
}

/// One entry of the operation log. Append-only; the only removal path is a
/// full clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    pub id: String,
    pub timestamp: i64,
    pub user_id: Option<String>,
    /// Username at the time of the action.
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    pub module: String,
    pub operation_type: OperationType,
    pub description: String,
    pub target_id: Option<String>,
    pub request_method: Option<String>,
    pub request_path: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OperationLogQuery {
    pub user_id: Option<String>,
    pub module: Option<String>,
    pub operation_type: Option<OperationType>,
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    /// Maximum number of items to return (default: 50, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl OperationLogQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

impl OperationLog {
    /// Human-readable one-liner, e.g.
    /// `[2026-01-15 14:32:05] "sales_li" UPDATE customers c-42: updated customer "Acme"`
    pub fn formatted(&self) -> String {
        use chrono::{TimeZone, Utc};

        let timestamp = Utc
            .timestamp_opt(self.timestamp, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string());

        let who = match (&self.username, &self.user_id) {
            (Some(name), _) => format!("\"{}\"", name),
            (None, Some(id)) => format!("({})", id),
            (None, None) => "(anonymous)".to_string(),
        };

        let target = self
            .target_id
            .as_deref()
            .map(|id| format!(" {}", id))
            .unwrap_or_default();

        let outcome = if self.success { "" } else { " [FAILED]" };

        format!(
            "[{}] {} {} {}{}: {}{}",
            timestamp,
            who,
            self.operation_type.as_ref(),
            self.module,
            target,
            self.description,
            outcome
        )
    }
}

/// Log entry with its one-line rendering, as returned by `GET /logs`.
#[derive(Debug, Clone, Serialize)]
pub struct OperationLogResponse {
    #[serde(flatten)]
    pub log: OperationLog,
    pub formatted: String,
}

impl From<OperationLog> for OperationLogResponse {
    fn from(log: OperationLog) -> Self {
        let formatted = log.formatted();
        Self { log, formatted }
    }
}

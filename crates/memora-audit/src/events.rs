use std::fmt;

use serde::Serialize;
use tracing::info;

/// Subject recorded for requests made through the public endpoints.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
    Approve,
    EditItem,
    Judge,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Patient,
    User,
    TestResult,
    Audio,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::EditItem => "edit_item",
            Action::Judge => "judge",
            Action::Upload => "upload",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Patient => "patient",
            ResourceType::User => "user",
            ResourceType::TestResult => "test_result",
            ResourceType::Audio => "audio",
        };
        f.write_str(s)
    }
}

/// A structured audit event for a change made through the API.
///
/// Logged via `tracing`, so it lands in CloudWatch Logs next to the request
/// log line it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: Action,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub user_sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: Action,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
        user_sub: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource_type,
            resource_id: resource_id.into(),
            user_sub: user_sub.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Emit this audit event via tracing.
    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(serde_json::Value::to_string)
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = %self.resource_type,
            audit.resource_id = %self.resource_id,
            audit.user_sub = %self.user_sub,
            audit.details = %details,
            "audit event"
        );
    }
}

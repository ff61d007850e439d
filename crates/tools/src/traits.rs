use crate::descriptor::AuditRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decision returned by the external human-approval collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Denied(String),
    /// Not decided yet; the invocation is rejected with `ApprovalRequired`.
    Pending(String),
}

#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub user_id: String,
    pub tool_name: String,
    pub input: Value,
    pub timestamp: DateTime<Utc>,
}

/// Gate consulted for capabilities flagged `requires_approval`.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn check(&self, request: ApprovalRequest) -> ApprovalDecision;
}

/// One line of the compliance trail, written after every execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub audit_ref: String,
    pub user_id: String,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub success: bool,
    pub approved: bool,
    pub record: AuditRecord,
}

/// Sink for audit entries. Implementations must not fail the caller.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log(&self, entry: AuditEntry);
}

/// Audit sink that forwards entries to `tracing`.
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditEntry) {
        tracing::info!(
            target: "zena::audit",
            tool = %entry.tool,
            user = %entry.user_id,
            success = entry.success,
            "{}",
            entry.record.summary
        );
    }
}

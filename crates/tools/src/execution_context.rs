use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-invocation context handed to a capability's `execute` body.
///
/// Built by the caller's authentication layer; the core only reads the
/// user identity and the granted permission set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub user_id: String,
    pub permissions: BTreeSet<String>,
    pub timeout_ms: u64,
    pub audit_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl ExecutionContext {
    pub fn new(user_id: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            user_id: user_id.into(),
            permissions: BTreeSet::new(),
            timeout_ms,
            audit_ref: uuid::Uuid::new_v4().to_string(),
            job_id: None,
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Required permissions that this context was not granted, in input order.
    pub fn missing_permissions<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|p| !self.has_permission(p))
            .map(String::as_str)
            .collect()
    }
}

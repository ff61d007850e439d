use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::info;
use zena_tools::{ApprovalDecision, ApprovalGate, ApprovalRequest};

/// Approves capabilities listed in the config and leaves the rest pending.
pub struct ConfigApprovalGate {
    auto_approve: BTreeSet<String>,
}

impl ConfigApprovalGate {
    pub fn new<I, S>(auto_approve: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            auto_approve: auto_approve.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ApprovalGate for ConfigApprovalGate {
    async fn check(&self, request: ApprovalRequest) -> ApprovalDecision {
        if self.auto_approve.contains(&request.tool_name) {
            info!("Auto-approved {} for {}", request.tool_name, request.user_id);
            ApprovalDecision::Approved
        } else {
            ApprovalDecision::Pending(format!(
                "{} needs approval for user {}",
                request.tool_name, request.user_id
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(tool: &str) -> ApprovalRequest {
        ApprovalRequest {
            user_id: "u1".into(),
            tool_name: tool.into(),
            input: json!({}),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_listed_tool_is_approved() {
        let gate = ConfigApprovalGate::new(["export.contacts"]);
        assert_eq!(gate.check(request("export.contacts")).await, ApprovalDecision::Approved);
    }

    #[tokio::test]
    async fn test_unlisted_tool_stays_pending() {
        let gate = ConfigApprovalGate::new(Vec::<String>::new());
        assert!(matches!(
            gate.check(request("export.contacts")).await,
            ApprovalDecision::Pending(_)
        ));
    }
}

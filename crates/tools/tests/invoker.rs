mod common;

use async_trait::async_trait;
use common::{registry_with, Behavior, RecordingAuditLogger, StubTool};
use serde_json::{json, Value};
use std::sync::Arc;
use zena_tools::*;

struct FixedGate(ApprovalDecision);

#[async_trait]
impl ApprovalGate for FixedGate {
    async fn check(&self, _request: ApprovalRequest) -> ApprovalDecision {
        self.0.clone()
    }
}

fn invoker_with(tools: Vec<Arc<dyn Tool>>) -> (ToolInvoker, Arc<RecordingAuditLogger>) {
    let audit = Arc::new(RecordingAuditLogger::default());
    (ToolInvoker::new(registry_with(tools), audit.clone()), audit)
}

fn ctx() -> ExecutionContext {
    ExecutionContext::new("user-1", 1000)
}

#[tokio::test]
async fn test_invoke_success_is_audited() {
    let (invoker, audit) = invoker_with(vec![StubTool::new("task.search").arc()]);
    let input = json!({"query": "overdue"});

    let output = invoker.invoke(ctx(), "task.search", input.clone()).await.unwrap();
    assert_eq!(output, input);

    let entries = audit.wait_for(1).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].success);
    assert_eq!(entries[0].tool, "task.search");
    assert_eq!(entries[0].user_id, "user-1");
    assert_eq!(entries[0].record.fields["input"], input);
    assert_eq!(entries[0].record.fields["output"], input);
}

#[tokio::test]
async fn test_unknown_capability() {
    let (invoker, _audit) = invoker_with(vec![]);
    let err = invoker.invoke(ctx(), "task.search", json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::CapabilityNotFound("task.search".into()));
}

#[tokio::test]
async fn test_schema_validation() {
    let (invoker, audit) = invoker_with(vec![StubTool::new("task.search").arc()]);
    let err = invoker.invoke(ctx(), "task.search", json!("not an object")).await.unwrap_err();
    assert!(matches!(err, ToolError::Validation(_)));

    let entries = audit.wait_for(1).await;
    assert!(!entries[0].success);
}

#[tokio::test]
async fn test_missing_permission_denied() {
    let (invoker, _audit) = invoker_with(vec![StubTool::new("contact.create")
        .permission("contacts:write")
        .arc()]);

    let err = invoker.invoke(ctx(), "contact.create", json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::PermissionDenied("missing contacts:write".into()));

    let granted = ctx().with_permissions(["contacts:write"]);
    assert!(invoker.invoke(granted, "contact.create", json!({})).await.is_ok());
}

#[tokio::test]
async fn test_approval_without_gate() {
    let (invoker, _audit) = invoker_with(vec![StubTool::new("export.contacts").approval().arc()]);
    let err = invoker.invoke(ctx(), "export.contacts", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::ApprovalRequired(_)));
}

#[tokio::test]
async fn test_approval_gate_decisions() {
    let tools = || vec![StubTool::new("export.contacts").approval().arc()];

    let (invoker, audit) = invoker_with(tools());
    let invoker = invoker.with_approval_gate(Arc::new(FixedGate(ApprovalDecision::Approved)));
    assert!(invoker.invoke(ctx(), "export.contacts", json!({})).await.is_ok());
    assert!(audit.wait_for(1).await[0].approved);

    let (invoker, _) = invoker_with(tools());
    let invoker = invoker.with_approval_gate(Arc::new(FixedGate(ApprovalDecision::Denied("not today".into()))));
    let err = invoker.invoke(ctx(), "export.contacts", json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::PermissionDenied("not today".into()));

    let (invoker, _) = invoker_with(tools());
    let invoker = invoker.with_approval_gate(Arc::new(FixedGate(ApprovalDecision::Pending("queued".into()))));
    let err = invoker.invoke(ctx(), "export.contacts", json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::ApprovalRequired("queued".into()));
}

#[tokio::test]
async fn test_execution_failure_propagates() {
    let (invoker, audit) = invoker_with(vec![StubTool::new("export.contacts")
        .behavior(Behavior::Fail("quota exceeded"))
        .arc()]);

    let err = invoker.invoke(ctx(), "export.contacts", json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::ExecutionFailed("quota exceeded".into()));

    let entries = audit.wait_for(1).await;
    assert!(!entries[0].success);
    assert!(entries[0].record.summary.contains("quota exceeded"));
}

#[tokio::test]
async fn test_timeout() {
    let (invoker, _audit) = invoker_with(vec![StubTool::new("task.search")
        .behavior(Behavior::Sleep(500))
        .arc()]);
    let ctx = ExecutionContext::new("user-1", 20);
    let err = invoker.invoke(ctx, "task.search", json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::Timeout(20));
}

#[tokio::test]
async fn test_panic_is_isolated() {
    let (invoker, _audit) = invoker_with(vec![StubTool::new("task.search").behavior(Behavior::Panic).arc()]);
    let err = invoker.invoke(ctx(), "task.search", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::Internal(_)));
}

struct PanickingFormatter;

#[async_trait]
impl Tool for PanickingFormatter {
    fn name(&self) -> &str {
        "task.archive"
    }

    fn description(&self) -> &str {
        "formatter always panics"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn audit_log_format(&self, _input: &Value, _outcome: Outcome<'_>) -> AuditRecord {
        panic!("formatter bug")
    }

    async fn execute(&self, _ctx: &ExecutionContext, _params: Value) -> Result<Value, ToolError> {
        Ok(json!({"archived": 3}))
    }
}

#[tokio::test]
async fn test_panicking_audit_formatter_falls_back() {
    let (invoker, audit) = invoker_with(vec![Arc::new(PanickingFormatter) as Arc<dyn Tool>]);
    let output = invoker.invoke(ctx(), "task.archive", json!({})).await.unwrap();
    assert_eq!(output, json!({"archived": 3}));

    let entries = audit.wait_for(1).await;
    assert_eq!(entries[0].record.summary, "task.archive succeeded");
}

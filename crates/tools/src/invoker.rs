use crate::descriptor::{default_audit_record, Outcome, Tool};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::registry::CapabilityRegistry;
use crate::schema;
use crate::traits::{ApprovalDecision, ApprovalGate, ApprovalRequest, AuditEntry, AuditLogger};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

/// Executes registered capabilities on behalf of a caller.
///
/// This is the boundary between the catalog and a capability's business
/// logic: schema, permission and approval checks happen here, execution is
/// isolated from panics and bounded by the context timeout, and every
/// attempt that reached a registered tool is handed to the audit sink.
pub struct ToolInvoker {
    registry: Arc<CapabilityRegistry>,
    audit: Arc<dyn AuditLogger>,
    approval: Option<Arc<dyn ApprovalGate>>,
}

impl ToolInvoker {
    pub fn new(registry: Arc<CapabilityRegistry>, audit: Arc<dyn AuditLogger>) -> Self {
        Self {
            registry,
            audit,
            approval: None,
        }
    }

    pub fn with_approval_gate(mut self, gate: Arc<dyn ApprovalGate>) -> Self {
        self.approval = Some(gate);
        self
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub async fn invoke(
        &self,
        ctx: ExecutionContext,
        tool_name: &str,
        input: Value,
    ) -> Result<Value, ToolError> {
        info!("Invoking tool: {} for user: {}", tool_name, ctx.user_id);

        let tool = self
            .registry
            .get_tool(tool_name)
            .ok_or_else(|| ToolError::CapabilityNotFound(tool_name.to_string()))?;

        let (result, approved) = self.authorize_and_execute(&tool, &ctx, &input).await;

        self.log_audit_isolated(tool.as_ref(), &ctx, &input, &result, approved);

        result
    }

    async fn authorize_and_execute(
        &self,
        tool: &Arc<dyn Tool>,
        ctx: &ExecutionContext,
        input: &Value,
    ) -> (Result<Value, ToolError>, bool) {
        if let Err(reason) = schema::validate(&tool.input_schema(), input) {
            return (Err(ToolError::Validation(reason)), false);
        }

        let required = tool.permissions();
        let missing = ctx.missing_permissions(&required);
        if !missing.is_empty() {
            warn!(tool = tool.name(), user = %ctx.user_id, "missing permissions: {}", missing.join(", "));
            return (
                Err(ToolError::PermissionDenied(format!("missing {}", missing.join(", ")))),
                false,
            );
        }

        let approved = if tool.requires_approval() {
            if let Err(e) = self.check_approval(tool.as_ref(), ctx, input).await {
                return (Err(e), false);
            }
            true
        } else {
            false
        };

        let result = self
            .execute_with_protection(tool.clone(), ctx.clone(), input.clone())
            .await;
        (result, approved)
    }

    async fn check_approval(
        &self,
        tool: &dyn Tool,
        ctx: &ExecutionContext,
        input: &Value,
    ) -> Result<(), ToolError> {
        let Some(gate) = &self.approval else {
            return Err(ToolError::ApprovalRequired(format!(
                "{} requires approval and no approval gate is configured",
                tool.name()
            )));
        };

        let request = ApprovalRequest {
            user_id: ctx.user_id.clone(),
            tool_name: tool.name().to_string(),
            input: input.clone(),
            timestamp: chrono::Utc::now(),
        };

        match gate.check(request).await {
            ApprovalDecision::Approved => Ok(()),
            ApprovalDecision::Denied(reason) => {
                warn!("Approval denied for {}: {}", tool.name(), reason);
                Err(ToolError::PermissionDenied(reason))
            }
            ApprovalDecision::Pending(message) => Err(ToolError::ApprovalRequired(message)),
        }
    }

    async fn execute_with_protection(
        &self,
        tool: Arc<dyn Tool>,
        ctx: ExecutionContext,
        input: Value,
    ) -> Result<Value, ToolError> {
        let timeout_ms = ctx.timeout_ms;

        // Spawned so a panicking tool cannot take the caller down with it
        let handle = tokio::spawn(async move { tool.execute(&ctx, input).await });
        let abort = handle.abort_handle();

        match timeout(Duration::from_millis(timeout_ms), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    error!("Tool execution panicked");
                    Err(ToolError::Internal("tool execution panicked".into()))
                } else {
                    error!("Tool execution cancelled");
                    Err(ToolError::Internal("tool execution cancelled".into()))
                }
            }
            Err(_) => {
                abort.abort();
                warn!("Tool execution timed out after {}ms", timeout_ms);
                Err(ToolError::Timeout(timeout_ms))
            }
        }
    }

    fn log_audit_isolated(
        &self,
        tool: &dyn Tool,
        ctx: &ExecutionContext,
        input: &Value,
        result: &Result<Value, ToolError>,
        approved: bool,
    ) {
        let outcome = match result {
            Ok(output) => Outcome::Success(output),
            Err(e) => Outcome::Failure(e),
        };

        let record = std::panic::catch_unwind(AssertUnwindSafe(|| tool.audit_log_format(input, outcome)))
            .unwrap_or_else(|_| {
                error!("Audit formatter for {} panicked, using default record", tool.name());
                default_audit_record(tool.name(), input, outcome)
            });

        let entry = AuditEntry {
            timestamp: chrono::Utc::now(),
            audit_ref: ctx.audit_ref.clone(),
            user_id: ctx.user_id.clone(),
            tool: tool.name().to_string(),
            job_id: ctx.job_id.clone(),
            success: result.is_ok(),
            approved,
            record,
        };

        // Fire and forget
        let audit = self.audit.clone();
        tokio::spawn(async move {
            audit.log(entry).await;
        });
    }
}

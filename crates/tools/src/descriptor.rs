use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Result of one execution, as seen by the audit formatter.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Success(&'a Value),
    Failure(&'a ToolError),
}

impl Outcome<'_> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Human-readable summary plus structured fields for compliance logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

/// A registered capability.
///
/// Everything except `execute` is passive metadata: it is read by the
/// registry, the alias resolver and the notification layer, and must be
/// stable for the lifetime of the process.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Canonical dotted identifier, e.g. `calendar.create_event`.
    fn name(&self) -> &str;

    fn domain(&self) -> &str {
        domain_of(self.name())
    }

    /// Display label used in user-facing notifications.
    fn label(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str;

    fn input_schema(&self) -> Value;

    fn output_schema(&self) -> Value {
        json!({})
    }

    /// Permission tokens the caller must hold.
    fn permissions(&self) -> Vec<String> {
        Vec::new()
    }

    /// When true the invocation must pass an external approval gate.
    fn requires_approval(&self) -> bool {
        false
    }

    /// Legacy identifiers and colloquial phrases that should resolve here.
    fn aliases(&self) -> Vec<String> {
        Vec::new()
    }

    /// Pure formatter; must not panic and must not mutate its arguments.
    fn audit_log_format(&self, input: &Value, outcome: Outcome<'_>) -> AuditRecord {
        default_audit_record(self.name(), input, outcome)
    }

    async fn execute(&self, ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError>;
}

/// Prefix before the first `.`, or the whole name when there is none.
pub fn domain_of(name: &str) -> &str {
    name.split_once('.').map(|(domain, _)| domain).unwrap_or(name)
}

/// Everything after the first `.`, or the whole name when there is none.
pub fn action_of(name: &str) -> &str {
    name.split_once('.').map(|(_, action)| action).unwrap_or(name)
}

pub fn default_audit_record(name: &str, input: &Value, outcome: Outcome<'_>) -> AuditRecord {
    let mut fields = Map::new();
    fields.insert("input".to_string(), input.clone());
    let summary = match outcome {
        Outcome::Success(output) => {
            fields.insert("output".to_string(), output.clone());
            format!("{} succeeded", name)
        }
        Outcome::Failure(error) => {
            fields.insert("error".to_string(), Value::String(error.to_string()));
            format!("{} failed: {}", name, error)
        }
    };
    AuditRecord { summary, fields }
}

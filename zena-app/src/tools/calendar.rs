use super::store::DemoStore;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use zena_tools::{AuditRecord, ExecutionContext, Outcome, Tool, ToolError};

const DEFAULT_DURATION_MINUTES: u64 = 30;

pub struct CreateEventTool {
    store: Arc<DemoStore>,
}

impl CreateEventTool {
    pub fn new(store: Arc<DemoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn name(&self) -> &str {
        "calendar.create_event"
    }

    fn label(&self) -> &str {
        "Calendar event"
    }

    fn description(&self) -> &str {
        "Create an event on the user's calendar"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "start": {"type": "string"},
                "duration_minutes": {"type": "integer"}
            },
            "required": ["title", "start"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "title": {"type": "string"},
                "start": {"type": "string"},
                "duration_minutes": {"type": "integer"}
            }
        })
    }

    fn permissions(&self) -> Vec<String> {
        vec!["calendar:write".to_string()]
    }

    fn aliases(&self) -> Vec<String> {
        vec!["book_appointment".to_string(), "schedule_meeting".to_string()]
    }

    fn audit_log_format(&self, input: &Value, outcome: Outcome<'_>) -> AuditRecord {
        let title = input.get("title").and_then(Value::as_str).unwrap_or("untitled");
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("start".to_string(), input.get("start").cloned().unwrap_or(Value::Null));
        let summary = match outcome {
            Outcome::Success(_) => format!("Scheduled '{}'", title),
            Outcome::Failure(e) => format!("Could not schedule '{}': {}", title, e),
        };
        AuditRecord { summary, fields }
    }

    async fn execute(&self, _ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        let title = required_str(&params, "title")?;
        let start = required_str(&params, "start")?;
        let duration = params
            .get("duration_minutes")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration == 0 {
            return Err(ToolError::Validation(
                "duration_minutes must be positive".to_string(),
            ));
        }

        let event = self.store.add_event(title, start, duration);
        serde_json::to_value(event).map_err(|e| ToolError::Internal(e.to_string()))
    }
}

pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::Validation(format!("missing string field '{}'", key)))
}

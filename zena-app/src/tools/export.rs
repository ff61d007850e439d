use super::store::DemoStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;
use zena_tools::{ExecutionContext, Tool, ToolError};

pub const QUOTA_EXCEEDED: &str = "quota exceeded";

pub struct ExportContactsTool {
    store: Arc<DemoStore>,
}

impl ExportContactsTool {
    pub fn new(store: Arc<DemoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ExportContactsTool {
    fn name(&self) -> &str {
        "export.contacts"
    }

    fn label(&self) -> &str {
        "Contact export"
    }

    fn description(&self) -> &str {
        "Export the address book as CSV or JSON"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": {"type": "string", "enum": ["csv", "json"]}
            }
        })
    }

    fn permissions(&self) -> Vec<String> {
        vec!["contacts:export".to_string()]
    }

    fn requires_approval(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        if !self.store.take_export_quota() {
            warn!("Export quota spent for {}", ctx.user_id);
            return Err(ToolError::ExecutionFailed(QUOTA_EXCEEDED.to_string()));
        }

        let contacts = self.store.contacts();
        let format = params.get("format").and_then(Value::as_str).unwrap_or("csv");
        let data = match format {
            "json" => serde_json::to_string(&contacts).map_err(|e| ToolError::Internal(e.to_string()))?,
            _ => {
                let mut csv = String::from("id,name,email\n");
                for c in &contacts {
                    csv.push_str(&format!(
                        "{},{},{}\n",
                        c.id,
                        c.name,
                        c.email.as_deref().unwrap_or("")
                    ));
                }
                csv
            }
        };

        Ok(json!({
            "format": format,
            "count": contacts.len(),
            "data": data,
        }))
    }
}

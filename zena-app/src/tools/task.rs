use super::calendar::required_str;
use super::store::DemoStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use zena_tools::{ExecutionContext, Tool, ToolError};

pub struct SearchTasksTool {
    store: Arc<DemoStore>,
}

impl SearchTasksTool {
    pub fn new(store: Arc<DemoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchTasksTool {
    fn name(&self) -> &str {
        "task.search"
    }

    fn label(&self) -> &str {
        "Task search"
    }

    fn description(&self) -> &str {
        "Search the user's tasks by title"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "status": {"type": "string", "enum": ["open", "done", "any"]}
            },
            "required": ["query"]
        })
    }

    fn permissions(&self) -> Vec<String> {
        vec!["tasks:read".to_string()]
    }

    fn aliases(&self) -> Vec<String> {
        vec!["find_todos".to_string()]
    }

    async fn execute(&self, _ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        let query = required_str(&params, "query")?;
        let done = match params.get("status").and_then(Value::as_str) {
            Some("open") => Some(false),
            Some("done") => Some(true),
            _ => None,
        };
        let hits = self.store.search_tasks(query, done);
        Ok(json!({
            "count": hits.len(),
            "tasks": hits,
        }))
    }
}

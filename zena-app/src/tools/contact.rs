use super::calendar::required_str;
use super::store::DemoStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use zena_tools::{ExecutionContext, Tool, ToolError};

pub struct CreateContactTool {
    store: Arc<DemoStore>,
}

impl CreateContactTool {
    pub fn new(store: Arc<DemoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateContactTool {
    fn name(&self) -> &str {
        "contact.create"
    }

    fn label(&self) -> &str {
        "New contact"
    }

    fn description(&self) -> &str {
        "Add a person to the address book"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "email": {"type": "string"}
            },
            "required": ["name"]
        })
    }

    fn permissions(&self) -> Vec<String> {
        vec!["contacts:write".to_string()]
    }

    fn aliases(&self) -> Vec<String> {
        vec!["save_contact".to_string()]
    }

    async fn execute(&self, _ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        let name = required_str(&params, "name")?;
        if name.trim().is_empty() {
            return Err(ToolError::Validation("name cannot be empty".to_string()));
        }
        let email = params.get("email").and_then(Value::as_str);

        let contact = self.store.add_contact(name.trim(), email);
        serde_json::to_value(contact).map_err(|e| ToolError::Internal(e.to_string()))
    }
}

pub struct SearchContactsTool {
    store: Arc<DemoStore>,
}

impl SearchContactsTool {
    pub fn new(store: Arc<DemoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchContactsTool {
    fn name(&self) -> &str {
        "contact.search"
    }

    fn label(&self) -> &str {
        "Contact search"
    }

    fn description(&self) -> &str {
        "Find contacts by name or email"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"}
            },
            "required": ["query"]
        })
    }

    fn permissions(&self) -> Vec<String> {
        vec!["contacts:read".to_string()]
    }

    async fn execute(&self, _ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        let query = required_str(&params, "query")?;
        let matches = self.store.search_contacts(query);
        Ok(json!({
            "count": matches.len(),
            "contacts": matches,
        }))
    }
}

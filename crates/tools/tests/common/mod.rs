#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use zena_tools::*;

pub enum Behavior {
    Echo,
    Fail(&'static str),
    Sleep(u64),
    Panic,
}

pub struct StubTool {
    pub name: &'static str,
    pub label: &'static str,
    pub permissions: Vec<String>,
    pub approval: bool,
    pub aliases: Vec<String>,
    pub behavior: Behavior,
}

impl StubTool {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            label: name,
            permissions: Vec::new(),
            approval: false,
            aliases: Vec::new(),
            behavior: Behavior::Echo,
        }
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn permission(mut self, permission: &str) -> Self {
        self.permissions.push(permission.to_string());
        self
    }

    pub fn approval(mut self) -> Self {
        self.approval = true;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn arc(self) -> Arc<dyn Tool> {
        Arc::new(self)
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    fn label(&self) -> &str {
        self.label
    }

    fn description(&self) -> &str {
        "stub capability"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    fn permissions(&self) -> Vec<String> {
        self.permissions.clone()
    }

    fn requires_approval(&self) -> bool {
        self.approval
    }

    fn aliases(&self) -> Vec<String> {
        self.aliases.clone()
    }

    async fn execute(&self, _ctx: &ExecutionContext, params: Value) -> Result<Value, ToolError> {
        match self.behavior {
            Behavior::Echo => Ok(params),
            Behavior::Fail(message) => Err(ToolError::ExecutionFailed(message.to_string())),
            Behavior::Sleep(ms) => {
                tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
                Ok(params)
            }
            Behavior::Panic => panic!("stub tool panicked"),
        }
    }
}

pub fn registry_with(tools: Vec<Arc<dyn Tool>>) -> Arc<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    for tool in tools {
        registry.register(tool).unwrap();
    }
    Arc::new(registry)
}

#[derive(Default)]
pub struct RecordingAuditLogger {
    pub entries: Mutex<Vec<AuditEntry>>,
}

#[async_trait]
impl AuditLogger for RecordingAuditLogger {
    async fn log(&self, entry: AuditEntry) {
        self.entries.lock().await.push(entry);
    }
}

impl RecordingAuditLogger {
    /// Audit writes are spawned; poll until `count` entries have landed.
    pub async fn wait_for(&self, count: usize) -> Vec<AuditEntry> {
        for _ in 0..100 {
            {
                let entries = self.entries.lock().await;
                if entries.len() >= count {
                    return entries.clone();
                }
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        }
        self.entries.lock().await.clone()
    }
}

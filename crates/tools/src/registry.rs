use crate::descriptor::Tool;
use crate::error::RegistryError;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Catalog of every capability the process can invoke.
///
/// Registration takes `&mut self` and therefore only happens while the
/// registry is still owned by bootstrap code. Once it is wrapped in an
/// `Arc` and handed to the resolver, invoker and dispatcher, it is
/// read-only and safe to share across workers.
pub struct CapabilityRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a capability. Duplicate names are rejected and the existing
    /// registration is left untouched.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, RegistryError> {
        let name = tool.name().to_string();
        if !is_canonical_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateCapability(name));
        }
        debug!(tool = %name, domain = %tool.domain(), "registered capability");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(self)
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All capabilities in registration order.
    pub fn get_all_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    pub fn get_tools_by_domain(&self, domain: &str) -> Vec<Arc<dyn Tool>> {
        self.tools
            .iter()
            .filter(|tool| tool.domain() == domain)
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    pub fn domains(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|tool| tool.domain().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function-calling export of every capability.
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.input_schema()
                    }
                })
            })
            .collect()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `segment(.segment)+` where every segment is non-empty `[a-z0-9_]`.
pub fn is_canonical_name(name: &str) -> bool {
    let mut segments = 0;
    for segment in name.split('.') {
        if segment.is_empty()
            || !segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

use std::sync::Arc;

use serde_json::Value;

use super::traits::{Tool, ToolError, ToolResult};

/// Ordered collection of tool groups exposed to one reasoning loop.
///
/// Dispatch is by function name with first-owner-wins semantics: the first
/// registered tool claiming a function receives the call.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// All function schemas, flattened across groups, for the LLM request.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().flat_map(|t| t.functions()).collect()
    }

    /// Locate the tool owning `function_name`.
    pub fn resolve(&self, function_name: &str) -> Result<&Arc<dyn Tool>, ToolError> {
        self.tools
            .iter()
            .find(|t| t.has_function(function_name))
            .ok_or_else(|| ToolError::UnknownFunction(function_name.to_owned()))
    }

    /// Resolve and invoke in one step.
    pub async fn dispatch(
        &self,
        function_name: &str,
        args: &Value,
    ) -> Result<ToolResult, ToolError> {
        self.resolve(function_name)?.invoke(function_name, args).await
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

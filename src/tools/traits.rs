use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// The outcome of one tool function invocation.
///
/// `data` is opaque to the kernel: it is serialised back to the LLM verbatim
/// and forwarded to clients through the event stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Errors raised while dispatching or executing a tool function.
///
/// A failed invocation is distinct from a [`ToolResult`] with
/// `success: false`: the latter is a normal answer handed back to the model,
/// the former counts against the reasoning loop's retry budget.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("invalid arguments for {function}: {message}")]
    InvalidArguments { function: String, message: String },

    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn invalid_args(function: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidArguments {
            function: function.to_owned(),
            message: err.to_string(),
        }
    }
}

/// A named bundle of functions the reasoning loop can invoke.
///
/// Implementations must be `Send + Sync` so they can be held in a shared
/// `Arc<dyn Tool>` registry.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable group identifier (snake_case), e.g. `"shell"`.
    fn name(&self) -> &str;

    /// Full function schemas in the chat completions tool format.
    fn functions(&self) -> Vec<Value>;

    /// Whether this tool owns the named function.
    fn has_function(&self, function_name: &str) -> bool;

    /// Execute the named function with a JSON argument object.
    async fn invoke(&self, function_name: &str, args: &Value) -> Result<ToolResult, ToolError>;
}

/// Build one function schema in the shape the LLM's function-calling
/// protocol expects.
pub fn function_schema(
    name: &str,
    description: &str,
    properties: Value,
    required: &[&str],
) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        }
    })
}

/// Deserialize a function's argument object into its typed form.
pub fn parse_args<T: serde::de::DeserializeOwned>(
    function: &str,
    args: &Value,
) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::invalid_args(function, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_serialization_skips_absent_fields() {
        let json = serde_json::to_value(ToolResult::ok(json!("hi"))).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": "hi"}));

        let json = serde_json::to_value(ToolResult::err("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "boom"}));
    }

    #[test]
    fn function_schema_shape() {
        let schema = function_schema(
            "shell_view",
            "View a shell session.",
            json!({"id": {"type": "string", "description": "Session id"}}),
            &["id"],
        );
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "shell_view");
        assert_eq!(schema["function"]["parameters"]["required"][0], "id");
    }

    #[test]
    fn parse_args_reports_function_name() {
        #[derive(Debug, serde::Deserialize)]
        struct Args {
            #[allow(dead_code)]
            id: String,
        }
        let err = parse_args::<Args>("shell_view", &json!({})).unwrap_err();
        match err {
            ToolError::InvalidArguments { function, .. } => assert_eq!(function, "shell_view"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

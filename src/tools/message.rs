//! User-notification tool group.
//!
//! `message_notify_user` has no effect inside the kernel; the text travels
//! through the tool-calling event and the SSE projection surfaces it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::traits::{Tool, ToolError, ToolResult, function_schema, parse_args};

#[derive(Default)]
pub struct MessageTool;

#[derive(Deserialize)]
struct NotifyArgs {
    text: String,
}

#[async_trait]
impl Tool for MessageTool {
    fn name(&self) -> &str {
        "message"
    }

    fn functions(&self) -> Vec<Value> {
        vec![function_schema(
            "message_notify_user",
            "Send a message to user without requiring a response. Use for acknowledging \
             receipt of messages, providing progress updates, reporting task completion, \
             or explaining changes in approach.",
            json!({
                "text": {
                    "type": "string",
                    "description": "Message text to display to user"
                }
            }),
            &["text"],
        )]
    }

    fn has_function(&self, function_name: &str) -> bool {
        function_name == "message_notify_user"
    }

    async fn invoke(&self, function_name: &str, args: &Value) -> Result<ToolResult, ToolError> {
        if function_name != "message_notify_user" {
            return Err(ToolError::UnknownFunction(function_name.to_owned()));
        }
        let a: NotifyArgs = parse_args(function_name, args)?;
        Ok(ToolResult::ok(json!(a.text)))
    }
}

//! Shell tool group, backed by the sandbox control plane.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::sandbox::Sandbox;

use super::traits::{Tool, ToolError, ToolResult, function_schema, parse_args};

pub struct ShellTool {
    sandbox: Arc<dyn Sandbox>,
}

impl ShellTool {
    pub fn new(sandbox: Arc<dyn Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct ExecArgs {
    id: String,
    exec_dir: String,
    command: String,
}

#[derive(Deserialize)]
struct SessionArgs {
    id: String,
}

#[derive(Deserialize)]
struct WaitArgs {
    id: String,
    seconds: Option<u64>,
}

#[derive(Deserialize)]
struct WriteArgs {
    id: String,
    input: String,
    press_enter: bool,
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn functions(&self) -> Vec<Value> {
        let session_id = json!({
            "type": "string",
            "description": "Unique identifier of the target shell session"
        });
        vec![
            function_schema(
                "shell_exec",
                "Execute commands in a specified shell session. Use for running code, \
                 installing packages, or managing files.",
                json!({
                    "id": session_id.clone(),
                    "exec_dir": {
                        "type": "string",
                        "description": "Working directory for command execution (must use absolute path)"
                    },
                    "command": {
                        "type": "string",
                        "description": "Shell command to execute"
                    }
                }),
                &["id", "exec_dir", "command"],
            ),
            function_schema(
                "shell_view",
                "View the content of a specified shell session. Use for checking command \
                 execution results or monitoring output.",
                json!({"id": session_id.clone()}),
                &["id"],
            ),
            function_schema(
                "shell_wait",
                "Wait for the running process in a specified shell session to return. Use \
                 after running commands that require longer runtime.",
                json!({
                    "id": session_id.clone(),
                    "seconds": {
                        "type": "integer",
                        "description": "Wait duration in seconds"
                    }
                }),
                &["id"],
            ),
            function_schema(
                "shell_write_to_process",
                "Write input to a running process in a specified shell session. Use for \
                 responding to interactive command prompts.",
                json!({
                    "id": session_id.clone(),
                    "input": {
                        "type": "string",
                        "description": "Input content to write to the process"
                    },
                    "press_enter": {
                        "type": "boolean",
                        "description": "Whether to press Enter key after input"
                    }
                }),
                &["id", "input", "press_enter"],
            ),
            function_schema(
                "shell_kill_process",
                "Terminate a running process in a specified shell session. Use for stopping \
                 long-running processes or handling frozen commands.",
                json!({"id": session_id.clone()}),
                &["id"],
            ),
        ]
    }

    fn has_function(&self, function_name: &str) -> bool {
        matches!(
            function_name,
            "shell_exec" | "shell_view" | "shell_wait" | "shell_write_to_process"
                | "shell_kill_process"
        )
    }

    async fn invoke(&self, function_name: &str, args: &Value) -> Result<ToolResult, ToolError> {
        let result = match function_name {
            "shell_exec" => {
                let a: ExecArgs = parse_args(function_name, args)?;
                self.sandbox.exec_command(&a.id, &a.exec_dir, &a.command).await
            }
            "shell_view" => {
                let a: SessionArgs = parse_args(function_name, args)?;
                self.sandbox.view_shell(&a.id).await
            }
            "shell_wait" => {
                let a: WaitArgs = parse_args(function_name, args)?;
                self.sandbox.wait_for_process(&a.id, a.seconds).await
            }
            "shell_write_to_process" => {
                let a: WriteArgs = parse_args(function_name, args)?;
                self.sandbox
                    .write_to_process(&a.id, &a.input, a.press_enter)
                    .await
            }
            "shell_kill_process" => {
                let a: SessionArgs = parse_args(function_name, args)?;
                self.sandbox.kill_process(&a.id).await
            }
            other => return Err(ToolError::UnknownFunction(other.to_owned())),
        };
        result.map_err(|e| ToolError::Execution(e.to_string()))
    }
}

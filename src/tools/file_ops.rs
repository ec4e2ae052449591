//! File tool group, backed by the sandbox control plane.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::sandbox::Sandbox;

use super::traits::{Tool, ToolError, ToolResult, function_schema, parse_args};

pub struct FileTool {
    sandbox: Arc<dyn Sandbox>,
}

impl FileTool {
    pub fn new(sandbox: Arc<dyn Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct ReadArgs {
    file: String,
    start_line: Option<i64>,
    end_line: Option<i64>,
    #[serde(default)]
    sudo: bool,
}

#[derive(Deserialize)]
struct WriteArgs {
    file: String,
    content: String,
    #[serde(default)]
    append: bool,
    #[serde(default)]
    leading_newline: bool,
    #[serde(default)]
    trailing_newline: bool,
    #[serde(default)]
    sudo: bool,
}

#[derive(Deserialize)]
struct ReplaceArgs {
    file: String,
    old_str: String,
    new_str: String,
    #[serde(default)]
    sudo: bool,
}

#[derive(Deserialize)]
struct SearchArgs {
    file: String,
    regex: String,
    #[serde(default)]
    sudo: bool,
}

#[derive(Deserialize)]
struct FindArgs {
    path: String,
    glob: String,
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        "file"
    }

    fn functions(&self) -> Vec<Value> {
        let sudo = json!({
            "type": "boolean",
            "description": "(Optional) Whether to use sudo privileges"
        });
        vec![
            function_schema(
                "file_read",
                "Read file content. Use for checking file contents, analyzing logs, or \
                 reading configuration files.",
                json!({
                    "file": {
                        "type": "string",
                        "description": "Absolute path of the file to read"
                    },
                    "start_line": {
                        "type": "integer",
                        "description": "(Optional) Starting line to read from, 0-based"
                    },
                    "end_line": {
                        "type": "integer",
                        "description": "(Optional) Ending line number (exclusive)"
                    },
                    "sudo": sudo.clone(),
                }),
                &["file"],
            ),
            function_schema(
                "file_write",
                "Overwrite or append content to a file. Use for creating new files, \
                 appending content, or modifying existing files.",
                json!({
                    "file": {
                        "type": "string",
                        "description": "Absolute path of the file to write to"
                    },
                    "content": {
                        "type": "string",
                        "description": "Text content to write"
                    },
                    "append": {
                        "type": "boolean",
                        "description": "(Optional) Whether to use append mode"
                    },
                    "leading_newline": {
                        "type": "boolean",
                        "description": "(Optional) Whether to add a leading newline"
                    },
                    "trailing_newline": {
                        "type": "boolean",
                        "description": "(Optional) Whether to add a trailing newline"
                    },
                    "sudo": sudo.clone(),
                }),
                &["file", "content"],
            ),
            function_schema(
                "file_str_replace",
                "Replace specified string in a file. Use for updating specific content in \
                 files or fixing errors in code.",
                json!({
                    "file": {
                        "type": "string",
                        "description": "Absolute path of the file to perform replacement on"
                    },
                    "old_str": {
                        "type": "string",
                        "description": "Original string to be replaced"
                    },
                    "new_str": {
                        "type": "string",
                        "description": "New string to replace with"
                    },
                    "sudo": sudo.clone(),
                }),
                &["file", "old_str", "new_str"],
            ),
            function_schema(
                "file_find_in_content",
                "Search for matching text within file content. Use for finding specific \
                 content or patterns in files.",
                json!({
                    "file": {
                        "type": "string",
                        "description": "Absolute path of the file to search within"
                    },
                    "regex": {
                        "type": "string",
                        "description": "Regular expression pattern to match"
                    },
                    "sudo": sudo.clone(),
                }),
                &["file", "regex"],
            ),
            function_schema(
                "file_find_by_name",
                "Find files by name pattern in specified directory. Use for locating files \
                 with specific naming patterns.",
                json!({
                    "path": {
                        "type": "string",
                        "description": "Absolute path of directory to search"
                    },
                    "glob": {
                        "type": "string",
                        "description": "Filename pattern using glob syntax wildcards"
                    }
                }),
                &["path", "glob"],
            ),
        ]
    }

    fn has_function(&self, function_name: &str) -> bool {
        matches!(
            function_name,
            "file_read" | "file_write" | "file_str_replace" | "file_find_in_content"
                | "file_find_by_name"
        )
    }

    async fn invoke(&self, function_name: &str, args: &Value) -> Result<ToolResult, ToolError> {
        let result = match function_name {
            "file_read" => {
                let a: ReadArgs = parse_args(function_name, args)?;
                self.sandbox
                    .file_read(&a.file, a.start_line, a.end_line, a.sudo)
                    .await
            }
            "file_write" => {
                let a: WriteArgs = parse_args(function_name, args)?;
                // Newline options are folded into the content here so the
                // sandbox only ever sees the final bytes.
                let mut content = a.content;
                if a.leading_newline {
                    content.insert(0, '\n');
                }
                if a.trailing_newline {
                    content.push('\n');
                }
                self.sandbox
                    .file_write(&a.file, &content, a.append, a.sudo)
                    .await
            }
            "file_str_replace" => {
                let a: ReplaceArgs = parse_args(function_name, args)?;
                self.sandbox
                    .file_replace(&a.file, &a.old_str, &a.new_str, a.sudo)
                    .await
            }
            "file_find_in_content" => {
                let a: SearchArgs = parse_args(function_name, args)?;
                self.sandbox.file_search(&a.file, &a.regex, a.sudo).await
            }
            "file_find_by_name" => {
                let a: FindArgs = parse_args(function_name, args)?;
                self.sandbox.file_find(&a.path, &a.glob).await
            }
            other => return Err(ToolError::UnknownFunction(other.to_owned())),
        };
        result.map_err(|e| ToolError::Execution(e.to_string()))
    }
}

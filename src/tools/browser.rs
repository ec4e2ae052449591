//! Browser tool group, backed by the sandboxed Chrome.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::browser::Browser;

use super::traits::{Tool, ToolError, ToolResult, function_schema, parse_args};

pub struct BrowserTool {
    browser: Arc<dyn Browser>,
}

impl BrowserTool {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }
}

#[derive(Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Deserialize)]
struct ClickArgs {
    index: Option<u32>,
    coordinate_x: Option<f64>,
    coordinate_y: Option<f64>,
}

#[derive(Deserialize)]
struct InputArgs {
    text: String,
    press_enter: bool,
    index: Option<u32>,
    coordinate_x: Option<f64>,
    coordinate_y: Option<f64>,
}

#[derive(Deserialize)]
struct MoveMouseArgs {
    coordinate_x: f64,
    coordinate_y: f64,
}

#[derive(Deserialize)]
struct PressKeyArgs {
    key: String,
}

#[derive(Deserialize)]
struct SelectOptionArgs {
    index: u32,
    option: u32,
}

#[derive(Deserialize)]
struct ScrollUpArgs {
    to_top: Option<bool>,
}

#[derive(Deserialize)]
struct ScrollDownArgs {
    to_bottom: Option<bool>,
}

#[derive(Deserialize)]
struct ConsoleExecArgs {
    javascript: String,
}

#[derive(Deserialize)]
struct ConsoleViewArgs {
    max_lines: Option<usize>,
}

#[async_trait]
impl Tool for BrowserTool {
    fn name(&self) -> &str {
        "browser"
    }

    fn functions(&self) -> Vec<Value> {
        let index = json!({
            "type": "integer",
            "description": "(Optional) Index number of the element"
        });
        let coordinate_x = json!({
            "type": "number",
            "description": "(Optional) X coordinate"
        });
        let coordinate_y = json!({
            "type": "number",
            "description": "(Optional) Y coordinate"
        });
        vec![
            function_schema(
                "browser_view",
                "View content of the current browser page. Use for checking the latest \
                 state of previously opened pages.",
                json!({}),
                &[],
            ),
            function_schema(
                "browser_navigate",
                "Navigate browser to specified URL. Use when accessing new pages is needed.",
                json!({
                    "url": {
                        "type": "string",
                        "description": "Complete URL to visit. Must include protocol prefix."
                    }
                }),
                &["url"],
            ),
            function_schema(
                "browser_restart",
                "Restart browser and navigate to specified URL. Use when browser state \
                 needs to be reset.",
                json!({
                    "url": {
                        "type": "string",
                        "description": "Complete URL to visit after restart. Must include protocol prefix."
                    }
                }),
                &["url"],
            ),
            function_schema(
                "browser_click",
                "Click on elements in the current browser page. Use when clicking page \
                 elements is needed.",
                json!({
                    "index": index.clone(),
                    "coordinate_x": coordinate_x.clone(),
                    "coordinate_y": coordinate_y.clone(),
                }),
                &[],
            ),
            function_schema(
                "browser_input",
                "Overwrite text in editable elements on the current browser page. Use when \
                 filling content in input fields.",
                json!({
                    "index": index.clone(),
                    "coordinate_x": coordinate_x.clone(),
                    "coordinate_y": coordinate_y.clone(),
                    "text": {
                        "type": "string",
                        "description": "Complete text content to overwrite"
                    },
                    "press_enter": {
                        "type": "boolean",
                        "description": "Whether to press Enter key after input"
                    },
                }),
                &["text", "press_enter"],
            ),
            function_schema(
                "browser_move_mouse",
                "Move cursor to specified position on the current browser page.",
                json!({
                    "coordinate_x": {
                        "type": "number",
                        "description": "X coordinate of target position"
                    },
                    "coordinate_y": {
                        "type": "number",
                        "description": "Y coordinate of target position"
                    },
                }),
                &["coordinate_x", "coordinate_y"],
            ),
            function_schema(
                "browser_press_key",
                "Simulate key press in the current browser page. Use when specific keyboard \
                 operations are required.",
                json!({
                    "key": {
                        "type": "string",
                        "description": "Key name to simulate (e.g. Enter, Tab, ArrowUp)"
                    }
                }),
                &["key"],
            ),
            function_schema(
                "browser_select_option",
                "Select specified option from dropdown list element in the current browser page.",
                json!({
                    "index": {
                        "type": "integer",
                        "description": "Index number of the dropdown list element"
                    },
                    "option": {
                        "type": "integer",
                        "description": "Option number to select, starting from 0"
                    },
                }),
                &["index", "option"],
            ),
            function_schema(
                "browser_scroll_up",
                "Scroll up the current browser page. Use when viewing content above or \
                 returning to page top.",
                json!({
                    "to_top": {
                        "type": "boolean",
                        "description": "(Optional) Whether to scroll directly to page top"
                    }
                }),
                &[],
            ),
            function_schema(
                "browser_scroll_down",
                "Scroll down the current browser page. Use when viewing content below or \
                 jumping to page bottom.",
                json!({
                    "to_bottom": {
                        "type": "boolean",
                        "description": "(Optional) Whether to scroll directly to page bottom"
                    }
                }),
                &[],
            ),
            function_schema(
                "browser_console_exec",
                "Execute JavaScript code in browser console. Use when custom scripts are needed.",
                json!({
                    "javascript": {
                        "type": "string",
                        "description": "JavaScript code to execute"
                    }
                }),
                &["javascript"],
            ),
            function_schema(
                "browser_console_view",
                "View browser console output. Use for checking JavaScript logs or errors.",
                json!({
                    "max_lines": {
                        "type": "integer",
                        "description": "(Optional) Maximum number of log lines to return"
                    }
                }),
                &[],
            ),
        ]
    }

    fn has_function(&self, function_name: &str) -> bool {
        matches!(
            function_name,
            "browser_view"
                | "browser_navigate"
                | "browser_restart"
                | "browser_click"
                | "browser_input"
                | "browser_move_mouse"
                | "browser_press_key"
                | "browser_select_option"
                | "browser_scroll_up"
                | "browser_scroll_down"
                | "browser_console_exec"
                | "browser_console_view"
        )
    }

    async fn invoke(&self, function_name: &str, args: &Value) -> Result<ToolResult, ToolError> {
        let result = match function_name {
            "browser_view" => self.browser.view_page().await,
            "browser_navigate" => {
                let a: UrlArgs = parse_args(function_name, args)?;
                self.browser.navigate(&a.url).await
            }
            "browser_restart" => {
                let a: UrlArgs = parse_args(function_name, args)?;
                self.browser.restart(&a.url).await
            }
            "browser_click" => {
                let a: ClickArgs = parse_args(function_name, args)?;
                self.browser
                    .click(a.index, a.coordinate_x, a.coordinate_y)
                    .await
            }
            "browser_input" => {
                let a: InputArgs = parse_args(function_name, args)?;
                self.browser
                    .input(&a.text, a.press_enter, a.index, a.coordinate_x, a.coordinate_y)
                    .await
            }
            "browser_move_mouse" => {
                let a: MoveMouseArgs = parse_args(function_name, args)?;
                self.browser.move_mouse(a.coordinate_x, a.coordinate_y).await
            }
            "browser_press_key" => {
                let a: PressKeyArgs = parse_args(function_name, args)?;
                self.browser.press_key(&a.key).await
            }
            "browser_select_option" => {
                let a: SelectOptionArgs = parse_args(function_name, args)?;
                self.browser.select_option(a.index, a.option).await
            }
            "browser_scroll_up" => {
                let a: ScrollUpArgs = parse_args(function_name, args)?;
                self.browser.scroll_up(a.to_top).await
            }
            "browser_scroll_down" => {
                let a: ScrollDownArgs = parse_args(function_name, args)?;
                self.browser.scroll_down(a.to_bottom).await
            }
            "browser_console_exec" => {
                let a: ConsoleExecArgs = parse_args(function_name, args)?;
                self.browser.console_exec(&a.javascript).await
            }
            "browser_console_view" => {
                let a: ConsoleViewArgs = parse_args(function_name, args)?;
                self.browser.console_view(a.max_lines).await
            }
            other => return Err(ToolError::UnknownFunction(other.to_owned())),
        };
        result.map_err(|e| ToolError::Execution(e.to_string()))
    }
}

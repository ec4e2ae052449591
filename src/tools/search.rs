//! Web search tool group.  Registered only when a search provider is
//! configured.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::search::SearchEngine;

use super::traits::{Tool, ToolError, ToolResult, function_schema, parse_args};

pub struct SearchTool {
    engine: Arc<dyn SearchEngine>,
}

impl SearchTool {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    date_range: Option<String>,
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn functions(&self) -> Vec<Value> {
        vec![function_schema(
            "info_search_web",
            "Search web pages using search engine. Use for obtaining latest information \
             or finding references.",
            json!({
                "query": {
                    "type": "string",
                    "description": "Search query in Google search style, using 3-5 keywords."
                },
                "date_range": {
                    "type": "string",
                    "enum": ["all", "past_hour", "past_day", "past_week", "past_month", "past_year"],
                    "description": "(Optional) Time range filter for search results."
                }
            }),
            &["query"],
        )]
    }

    fn has_function(&self, function_name: &str) -> bool {
        function_name == "info_search_web"
    }

    async fn invoke(&self, function_name: &str, args: &Value) -> Result<ToolResult, ToolError> {
        if function_name != "info_search_web" {
            return Err(ToolError::UnknownFunction(function_name.to_owned()));
        }
        let a: SearchArgs = parse_args(function_name, args)?;
        Ok(self.engine.search(&a.query, a.date_range.as_deref()).await)
    }
}

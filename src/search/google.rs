//! Google Programmable Search backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::tools::ToolResult;

use super::SearchEngine;

const BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`SearchEngine`] over the Google Custom Search JSON API.
pub struct GoogleSearch {
    client: Client,
    api_key: String,
    cx: String,
}

impl GoogleSearch {
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: api_key.into(),
            cx: cx.into(),
        }
    }

    async fn request(&self, query: &str, date_range: Option<&str>) -> Result<Value, reqwest::Error> {
        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.cx.as_str()),
            ("q", query),
        ];
        if let Some(restrict) = date_range.and_then(date_restrict) {
            params.push(("dateRestrict", restrict));
        }
        self.client
            .get(BASE_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl SearchEngine for GoogleSearch {
    async fn search(&self, query: &str, date_range: Option<&str>) -> ToolResult {
        match self.request(query, date_range).await {
            Ok(body) => {
                let results: Vec<Value> = body
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .map(|item| {
                                json!({
                                    "title": item.get("title").and_then(Value::as_str).unwrap_or(""),
                                    "link": item.get("link").and_then(Value::as_str).unwrap_or(""),
                                    "snippet": item.get("snippet").and_then(Value::as_str).unwrap_or(""),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let search_info = body.get("searchInformation").cloned().unwrap_or(json!({}));
                let total_results = search_info
                    .get("totalResults")
                    .and_then(Value::as_str)
                    .unwrap_or("0")
                    .to_owned();
                ToolResult::ok(json!({
                    "query": query,
                    "date_range": date_range,
                    "search_info": search_info,
                    "results": results,
                    "total_results": total_results,
                }))
            }
            Err(e) => {
                log::error!("search request failed: {e}");
                ToolResult {
                    success: false,
                    message: Some(format!("search request failed: {e}")),
                    data: Some(json!({
                        "query": query,
                        "date_range": date_range,
                        "results": [],
                    })),
                }
            }
        }
    }
}

/// Map a date range keyword to Google's `dateRestrict` parameter.
fn date_restrict(range: &str) -> Option<&'static str> {
    match range {
        "past_hour" | "past_day" => Some("d1"),
        "past_week" => Some("w1"),
        "past_month" => Some("m1"),
        "past_year" => Some("y1"),
        _ => None,
    }
}

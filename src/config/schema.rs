//! Runtime configuration schema for Famulus.
//!
//! All values come from the process environment (upper-cased field names,
//! e.g. `API_KEY`, `SANDBOX_ADDRESS`).  Every field except `api_key` has a
//! default, so a minimal deployment only needs the model provider key.

use serde::{Deserialize, Serialize};

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    // Model provider
    /// API key for the OpenAI-compatible chat completions endpoint.
    pub api_key: String,
    /// Base URL of the chat completions API.
    pub api_base: String,

    // Model parameters
    pub model_name: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Maximum tokens per LLM response.
    pub max_tokens: Option<u32>,

    // Sandbox
    /// Address (hostname or IP) of an already-running sandbox container.
    pub sandbox_address: Option<String>,
    pub sandbox_image: Option<String>,
    pub sandbox_name_prefix: Option<String>,
    /// Idle lifetime granted to a fresh sandbox, in minutes.
    pub sandbox_ttl_minutes: u32,
    pub sandbox_network: Option<String>,
    pub sandbox_chrome_args: String,
    pub sandbox_https_proxy: Option<String>,
    pub sandbox_http_proxy: Option<String>,
    pub sandbox_no_proxy: Option<String>,

    // Search engine (enabled only when both are present)
    pub google_search_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,

    // Logging
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,

    // Gateway bind
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Whether web search is configured (both key and engine id present).
    pub fn search_enabled(&self) -> bool {
        self.google_search_api_key.is_some() && self.google_search_engine_id.is_some()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.deepseek.com/v1".to_owned(),
            model_name: "deepseek-chat".to_owned(),
            temperature: 0.7,
            max_tokens: Some(2000),
            sandbox_address: None,
            sandbox_image: None,
            sandbox_name_prefix: None,
            sandbox_ttl_minutes: 30,
            sandbox_network: None,
            sandbox_chrome_args: String::new(),
            sandbox_https_proxy: None,
            sandbox_http_proxy: None,
            sandbox_no_proxy: None,
            google_search_api_key: None,
            google_search_engine_id: None,
            log_level: "info".to_owned(),
            host: "0.0.0.0".to_owned(),
            port: 8000,
        }
    }
}

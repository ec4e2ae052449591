//! Controlled browser inside the sandbox.
//!
//! The kernel only needs the operations below; how pages are rendered,
//! scraped, or indexed is the implementation's business.  The shipped
//! implementation drives the sandbox's Chrome over the DevTools protocol.

pub mod cdp;

pub use cdp::CdpBrowser;

use async_trait::async_trait;
use thiserror::Error;

use crate::tools::ToolResult;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser websocket failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("no page target available")]
    NoTarget,
}

/// Operations the executor's browser tool exposes to the model.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Current page summary: url, title, visible text, indexed elements.
    async fn view_page(&self) -> Result<ToolResult, BrowserError>;

    async fn navigate(&self, url: &str) -> Result<ToolResult, BrowserError>;

    /// Tear down the current page and start a fresh one at `url`.
    async fn restart(&self, url: &str) -> Result<ToolResult, BrowserError>;

    async fn click(
        &self,
        index: Option<u32>,
        coordinate_x: Option<f64>,
        coordinate_y: Option<f64>,
    ) -> Result<ToolResult, BrowserError>;

    async fn input(
        &self,
        text: &str,
        press_enter: bool,
        index: Option<u32>,
        coordinate_x: Option<f64>,
        coordinate_y: Option<f64>,
    ) -> Result<ToolResult, BrowserError>;

    async fn move_mouse(
        &self,
        coordinate_x: f64,
        coordinate_y: f64,
    ) -> Result<ToolResult, BrowserError>;

    async fn press_key(&self, key: &str) -> Result<ToolResult, BrowserError>;

    async fn select_option(&self, index: u32, option: u32) -> Result<ToolResult, BrowserError>;

    async fn scroll_up(&self, to_top: Option<bool>) -> Result<ToolResult, BrowserError>;

    async fn scroll_down(&self, to_bottom: Option<bool>) -> Result<ToolResult, BrowserError>;

    async fn console_exec(&self, javascript: &str) -> Result<ToolResult, BrowserError>;

    async fn console_view(&self, max_lines: Option<usize>) -> Result<ToolResult, BrowserError>;
}

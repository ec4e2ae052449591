//! Remote execution sandbox.
//!
//! Each agent owns one sandbox: an isolated container exposing shell and
//! file operations over an HTTP control plane, plus a Chrome DevTools
//! endpoint and a VNC WebSocket for the browser.  Only the wire contract
//! lives here; the container's internals are the sandbox service's concern.

pub mod http;

pub use http::HttpSandbox;

use async_trait::async_trait;
use thiserror::Error;

use crate::tools::ToolResult;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox is not configured: set SANDBOX_ADDRESS")]
    NotConfigured,

    #[error("failed to resolve sandbox address {0}")]
    Resolve(String),

    #[error("sandbox request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Control-plane operations of one sandbox instance.
#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn exec_command(
        &self,
        session_id: &str,
        exec_dir: &str,
        command: &str,
    ) -> Result<ToolResult, SandboxError>;

    async fn view_shell(&self, session_id: &str) -> Result<ToolResult, SandboxError>;

    async fn wait_for_process(
        &self,
        session_id: &str,
        seconds: Option<u64>,
    ) -> Result<ToolResult, SandboxError>;

    async fn write_to_process(
        &self,
        session_id: &str,
        input: &str,
        press_enter: bool,
    ) -> Result<ToolResult, SandboxError>;

    async fn kill_process(&self, session_id: &str) -> Result<ToolResult, SandboxError>;

    async fn file_read(
        &self,
        file: &str,
        start_line: Option<i64>,
        end_line: Option<i64>,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError>;

    async fn file_write(
        &self,
        file: &str,
        content: &str,
        append: bool,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError>;

    async fn file_replace(
        &self,
        file: &str,
        old_str: &str,
        new_str: &str,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError>;

    async fn file_search(
        &self,
        file: &str,
        regex: &str,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError>;

    async fn file_find(&self, path: &str, glob: &str) -> Result<ToolResult, SandboxError>;

    /// Chrome DevTools endpoint of the sandboxed browser.
    fn cdp_url(&self) -> String;

    /// VNC WebSocket endpoint for live screen relay.
    fn vnc_url(&self) -> String;

    /// Release the sandbox.  Called exactly once when the owning agent closes.
    async fn destroy(&self) -> Result<(), SandboxError>;
}

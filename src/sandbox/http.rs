//! HTTP client for the sandbox control plane.
//!
//! All endpoints are `POST` with JSON bodies and answer
//! `{success, message, data}`, which deserialises directly into
//! [`ToolResult`].  Service ports are fixed by the sandbox image: 8080 for
//! the API, 9222 for Chrome DevTools, 5901 for the VNC WebSocket.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;

use crate::config::Settings;
use crate::tools::ToolResult;

use super::{Sandbox, SandboxError};

/// Shell commands may legitimately run for minutes before the supervisor
/// truncates them.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

const API_PORT: u16 = 8080;
const CDP_PORT: u16 = 9222;
const VNC_PORT: u16 = 5901;

/// [`Sandbox`] over the HTTP control plane of a running container.
#[derive(Debug)]
pub struct HttpSandbox {
    client: Client,
    base_url: String,
    cdp_url: String,
    vnc_url: String,
}

impl HttpSandbox {
    /// Attach to the sandbox at `SANDBOX_ADDRESS`.
    ///
    /// The address is resolved to an IPv4 address up front (Chrome's
    /// DevTools endpoint rejects `Host` headers that are not IPs).
    pub async fn create(settings: &Settings) -> Result<Self, SandboxError> {
        let address = settings
            .sandbox_address
            .as_deref()
            .ok_or(SandboxError::NotConfigured)?;
        let ip = resolve_ipv4(address).await?;
        Ok(Self::at_ip(&ip.to_string()))
    }

    fn at_ip(ip: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: format!("http://{ip}:{API_PORT}"),
            cdp_url: format!("http://{ip}:{CDP_PORT}"),
            vnc_url: format!("ws://{ip}:{VNC_PORT}"),
        }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ToolResult, SandboxError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Sandbox for HttpSandbox {
    async fn exec_command(
        &self,
        session_id: &str,
        exec_dir: &str,
        command: &str,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/shell/exec",
            &json!({"id": session_id, "exec_dir": exec_dir, "command": command}),
        )
        .await
    }

    async fn view_shell(&self, session_id: &str) -> Result<ToolResult, SandboxError> {
        self.post("/api/v1/shell/view", &json!({"id": session_id}))
            .await
    }

    async fn wait_for_process(
        &self,
        session_id: &str,
        seconds: Option<u64>,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/shell/wait",
            &json!({"id": session_id, "seconds": seconds}),
        )
        .await
    }

    async fn write_to_process(
        &self,
        session_id: &str,
        input: &str,
        press_enter: bool,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/shell/write",
            &json!({"id": session_id, "input": input, "press_enter": press_enter}),
        )
        .await
    }

    async fn kill_process(&self, session_id: &str) -> Result<ToolResult, SandboxError> {
        self.post("/api/v1/shell/kill", &json!({"id": session_id}))
            .await
    }

    async fn file_read(
        &self,
        file: &str,
        start_line: Option<i64>,
        end_line: Option<i64>,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/file/read",
            &json!({"file": file, "start_line": start_line, "end_line": end_line, "sudo": sudo}),
        )
        .await
    }

    async fn file_write(
        &self,
        file: &str,
        content: &str,
        append: bool,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/file/write",
            &json!({"file": file, "content": content, "append": append, "sudo": sudo}),
        )
        .await
    }

    async fn file_replace(
        &self,
        file: &str,
        old_str: &str,
        new_str: &str,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/file/replace",
            &json!({"file": file, "old_str": old_str, "new_str": new_str, "sudo": sudo}),
        )
        .await
    }

    async fn file_search(
        &self,
        file: &str,
        regex: &str,
        sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        self.post(
            "/api/v1/file/search",
            &json!({"file": file, "regex": regex, "sudo": sudo}),
        )
        .await
    }

    async fn file_find(&self, path: &str, glob: &str) -> Result<ToolResult, SandboxError> {
        self.post("/api/v1/file/find", &json!({"path": path, "glob": glob}))
            .await
    }

    fn cdp_url(&self) -> String {
        self.cdp_url.clone()
    }

    fn vnc_url(&self) -> String {
        self.vnc_url.clone()
    }

    async fn destroy(&self) -> Result<(), SandboxError> {
        // Attached sandboxes manage their own lifetime via the service TTL;
        // there is nothing to tear down from this side.
        log::debug!("releasing sandbox at {}", self.base_url);
        Ok(())
    }
}

/// Resolve `address` to an IPv4 address, passing literal IPs through.
async fn resolve_ipv4(address: &str) -> Result<Ipv4Addr, SandboxError> {
    if let Ok(ip) = address.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let mut addrs = tokio::net::lookup_host((address, 0))
        .await
        .map_err(|_| SandboxError::Resolve(address.to_owned()))?;
    addrs
        .find_map(|addr| match addr.ip() {
            std::net::IpAddr::V4(v4) => Some(v4),
            std::net::IpAddr::V6(_) => None,
        })
        .ok_or_else(|| SandboxError::Resolve(address.to_owned()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

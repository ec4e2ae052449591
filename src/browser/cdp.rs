//! Chrome DevTools protocol client for the sandboxed browser.
//!
//! Connects to the browser-level WebSocket (`/json/version`), attaches to a
//! page target with a flattened session, and drives it with `Page.*`,
//! `Runtime.*`, `Input.*`, and `Target.*` commands.  Element addressing is
//! index-based: `view_page` records the page's interactive elements in a
//! window-scoped array that `click`/`input`/`select_option` refer back to.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

use crate::tools::ToolResult;

use super::{Browser, BrowserError};

/// Per-command reply deadline.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on buffered console lines.
const CONSOLE_CAPACITY: usize = 1000;

/// Visible page text is clipped to keep LLM turns bounded.
const MAX_PAGE_TEXT: usize = 20_000;

/// Script that snapshots the page and records interactive elements in
/// `window.__famulus_elements` for later index-based addressing.
const VIEW_PAGE_SCRIPT: &str = r#"
(() => {
    const selector = 'a, button, input, textarea, select, [role="button"], [onclick]';
    const nodes = Array.from(document.querySelectorAll(selector))
        .filter(el => el.offsetParent !== null || el.tagName === 'A');
    window.__famulus_elements = nodes;
    const elements = nodes.map((el, index) => ({
        index,
        tag: el.tagName.toLowerCase(),
        text: (el.innerText || el.value || el.placeholder || '').trim().slice(0, 120),
        href: el.href || null,
    }));
    return JSON.stringify({
        url: location.href,
        title: document.title,
        text: document.body ? document.body.innerText : '',
        elements,
    });
})()
"#;

struct Connection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    session_id: Option<String>,
    target_id: Option<String>,
    next_id: u64,
    console: VecDeque<String>,
}

/// [`Browser`] implementation over the Chrome DevTools protocol.
pub struct CdpBrowser {
    conn: Mutex<Connection>,
}

impl CdpBrowser {
    /// Connect to the browser behind `cdp_url` (e.g. `http://172.17.0.2:9222`)
    /// and attach to a page target.
    pub async fn connect(cdp_url: &str) -> Result<Self, BrowserError> {
        let version_url = Url::parse(cdp_url)
            .and_then(|base| base.join("/json/version"))
            .map_err(|e| BrowserError::Protocol(format!("bad CDP url {cdp_url}: {e}")))?;
        let version: Value = reqwest::get(version_url).await?.json().await?;
        let ws_url = version
            .get("webSocketDebuggerUrl")
            .and_then(Value::as_str)
            .ok_or(BrowserError::NoTarget)?;

        let (ws, _) = connect_async(ws_url).await?;
        let browser = Self {
            conn: Mutex::new(Connection {
                ws,
                session_id: None,
                target_id: None,
                next_id: 1,
                console: VecDeque::new(),
            }),
        };
        browser.attach_to_page().await?;
        Ok(browser)
    }

    /// Attach to the first existing page target, creating one if necessary.
    async fn attach_to_page(&self) -> Result<(), BrowserError> {
        let mut conn = self.conn.lock().await;
        let targets = command(&mut conn, None, "Target.getTargets", json!({})).await?;
        let page_id = targets
            .get("targetInfos")
            .and_then(Value::as_array)
            .and_then(|infos| {
                infos
                    .iter()
                    .find(|t| t.get("type").and_then(Value::as_str) == Some("page"))
            })
            .and_then(|t| t.get("targetId"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        let target_id = match page_id {
            Some(id) => id,
            None => {
                let created = command(
                    &mut conn,
                    None,
                    "Target.createTarget",
                    json!({"url": "about:blank"}),
                )
                .await?;
                string_field(&created, "targetId")?
            }
        };

        let attached = command(
            &mut conn,
            None,
            "Target.attachToTarget",
            json!({"targetId": target_id, "flatten": true}),
        )
        .await?;
        let session_id = string_field(&attached, "sessionId")?;

        command(&mut conn, Some(&session_id), "Page.enable", json!({})).await?;
        command(&mut conn, Some(&session_id), "Runtime.enable", json!({})).await?;

        conn.session_id = Some(session_id);
        conn.target_id = Some(target_id);
        Ok(())
    }

    /// Run a page-session command.
    async fn page_command(&self, method: &str, params: Value) -> Result<Value, BrowserError> {
        let mut conn = self.conn.lock().await;
        let session = conn.session_id.clone().ok_or(BrowserError::NoTarget)?;
        command(&mut conn, Some(&session), method, params).await
    }

    /// Evaluate JavaScript in the page and return the result by value.
    async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        let reply = self
            .page_command(
                "Runtime.evaluate",
                json!({"expression": expression, "returnByValue": true, "awaitPromise": true}),
            )
            .await?;
        if let Some(details) = reply.get("exceptionDetails") {
            return Err(BrowserError::Protocol(format!(
                "script threw: {}",
                details
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
            )));
        }
        Ok(reply
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn dispatch_mouse(
        &self,
        event_type: &str,
        x: f64,
        y: f64,
        button: Option<&str>,
    ) -> Result<(), BrowserError> {
        let mut params = json!({"type": event_type, "x": x, "y": y});
        if let Some(button) = button {
            params["button"] = json!(button);
            params["clickCount"] = json!(1);
        }
        self.page_command("Input.dispatchMouseEvent", params).await?;
        Ok(())
    }

    async fn dispatch_key(&self, key: &str) -> Result<(), BrowserError> {
        let text = if key == "Enter" { "\r" } else { "" };
        for event_type in ["keyDown", "keyUp"] {
            self.page_command(
                "Input.dispatchKeyEvent",
                json!({"type": event_type, "key": key, "text": text}),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Browser for CdpBrowser {
    async fn view_page(&self) -> Result<ToolResult, BrowserError> {
        let raw = self.evaluate(VIEW_PAGE_SCRIPT).await?;
        let snapshot = raw.as_str().ok_or_else(|| {
            BrowserError::Protocol("page snapshot did not return a string".to_owned())
        })?;
        let mut page: Value = serde_json::from_str(snapshot)
            .map_err(|e| BrowserError::Protocol(format!("bad page snapshot: {e}")))?;
        let clipped: Option<String> = page
            .get("text")
            .and_then(Value::as_str)
            .filter(|text| text.len() > MAX_PAGE_TEXT)
            .map(|text| text.chars().take(MAX_PAGE_TEXT).collect());
        if let Some(clipped) = clipped {
            page["text"] = json!(clipped);
        }
        Ok(ToolResult::ok(page))
    }

    async fn navigate(&self, url: &str) -> Result<ToolResult, BrowserError> {
        let reply = self.page_command("Page.navigate", json!({"url": url})).await?;
        if let Some(error) = reply.get("errorText").and_then(Value::as_str) {
            return Ok(ToolResult::err(format!("navigation failed: {error}")));
        }
        Ok(ToolResult::ok(json!({"url": url})))
    }

    async fn restart(&self, url: &str) -> Result<ToolResult, BrowserError> {
        {
            let mut conn = self.conn.lock().await;
            if let Some(target_id) = conn.target_id.take() {
                // Best effort: a dead target must not block the restart.
                let _ = command(
                    &mut conn,
                    None,
                    "Target.closeTarget",
                    json!({"targetId": target_id}),
                )
                .await;
            }
            conn.session_id = None;
            conn.console.clear();
        }
        self.attach_to_page().await?;
        self.navigate(url).await
    }

    async fn click(
        &self,
        index: Option<u32>,
        coordinate_x: Option<f64>,
        coordinate_y: Option<f64>,
    ) -> Result<ToolResult, BrowserError> {
        match (index, coordinate_x, coordinate_y) {
            (Some(index), _, _) => {
                let script = format!(
                    "(() => {{ const el = (window.__famulus_elements || [])[{index}]; \
                     if (!el) return 'missing'; el.click(); return 'ok'; }})()"
                );
                match self.evaluate(&script).await?.as_str() {
                    Some("ok") => Ok(ToolResult::ok(json!({"clicked": index}))),
                    _ => Ok(ToolResult::err(format!(
                        "no element at index {index}; call browser_view first"
                    ))),
                }
            }
            (None, Some(x), Some(y)) => {
                self.dispatch_mouse("mousePressed", x, y, Some("left")).await?;
                self.dispatch_mouse("mouseReleased", x, y, Some("left")).await?;
                Ok(ToolResult::ok(json!({"clicked": [x, y]})))
            }
            _ => Ok(ToolResult::err(
                "either index or both coordinates are required",
            )),
        }
    }

    async fn input(
        &self,
        text: &str,
        press_enter: bool,
        index: Option<u32>,
        coordinate_x: Option<f64>,
        coordinate_y: Option<f64>,
    ) -> Result<ToolResult, BrowserError> {
        if let Some(index) = index {
            let script = format!(
                "(() => {{ const el = (window.__famulus_elements || [])[{index}]; \
                 if (!el) return 'missing'; el.focus(); el.value = {}; \
                 el.dispatchEvent(new Event('input', {{bubbles: true}})); return 'ok'; }})()",
                json!(text)
            );
            if self.evaluate(&script).await?.as_str() != Some("ok") {
                return Ok(ToolResult::err(format!(
                    "no element at index {index}; call browser_view first"
                )));
            }
        } else if let (Some(x), Some(y)) = (coordinate_x, coordinate_y) {
            self.dispatch_mouse("mousePressed", x, y, Some("left")).await?;
            self.dispatch_mouse("mouseReleased", x, y, Some("left")).await?;
            self.page_command("Input.insertText", json!({"text": text}))
                .await?;
        } else {
            return Ok(ToolResult::err(
                "either index or both coordinates are required",
            ));
        }

        if press_enter {
            self.dispatch_key("Enter").await?;
        }
        Ok(ToolResult::ok(json!({"input": text})))
    }

    async fn move_mouse(
        &self,
        coordinate_x: f64,
        coordinate_y: f64,
    ) -> Result<ToolResult, BrowserError> {
        self.dispatch_mouse("mouseMoved", coordinate_x, coordinate_y, None)
            .await?;
        Ok(ToolResult::ok(json!({"moved": [coordinate_x, coordinate_y]})))
    }

    async fn press_key(&self, key: &str) -> Result<ToolResult, BrowserError> {
        self.dispatch_key(key).await?;
        Ok(ToolResult::ok(json!({"key": key})))
    }

    async fn select_option(&self, index: u32, option: u32) -> Result<ToolResult, BrowserError> {
        let script = format!(
            "(() => {{ const el = (window.__famulus_elements || [])[{index}]; \
             if (!el || el.tagName !== 'SELECT') return 'missing'; \
             el.selectedIndex = {option}; \
             el.dispatchEvent(new Event('change', {{bubbles: true}})); return 'ok'; }})()"
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(ToolResult::ok(json!({"selected": option}))),
            _ => Ok(ToolResult::err(format!(
                "no select element at index {index}; call browser_view first"
            ))),
        }
    }

    async fn scroll_up(&self, to_top: Option<bool>) -> Result<ToolResult, BrowserError> {
        let script = if to_top.unwrap_or(false) {
            "window.scrollTo(0, 0)".to_owned()
        } else {
            "window.scrollBy(0, -window.innerHeight)".to_owned()
        };
        self.evaluate(&script).await?;
        Ok(ToolResult::ok(json!({"scrolled": "up"})))
    }

    async fn scroll_down(&self, to_bottom: Option<bool>) -> Result<ToolResult, BrowserError> {
        let script = if to_bottom.unwrap_or(false) {
            "window.scrollTo(0, document.body.scrollHeight)".to_owned()
        } else {
            "window.scrollBy(0, window.innerHeight)".to_owned()
        };
        self.evaluate(&script).await?;
        Ok(ToolResult::ok(json!({"scrolled": "down"})))
    }

    async fn console_exec(&self, javascript: &str) -> Result<ToolResult, BrowserError> {
        let value = self.evaluate(javascript).await?;
        Ok(ToolResult::ok(json!({"result": value})))
    }

    async fn console_view(&self, max_lines: Option<usize>) -> Result<ToolResult, BrowserError> {
        let conn = self.conn.lock().await;
        let lines: Vec<&String> = match max_lines {
            Some(n) => conn.console.iter().rev().take(n).rev().collect(),
            None => conn.console.iter().collect(),
        };
        Ok(ToolResult::ok(json!({"console": lines})))
    }
}

// ─── Protocol plumbing ───────────────────────────────────────────────────────

/// Send one CDP command and wait for its reply, buffering console events
/// that arrive in between.
async fn command(
    conn: &mut Connection,
    session_id: Option<&str>,
    method: &str,
    params: Value,
) -> Result<Value, BrowserError> {
    let id = conn.next_id;
    conn.next_id += 1;

    let mut envelope = json!({"id": id, "method": method, "params": params});
    if let Some(session) = session_id {
        envelope["sessionId"] = json!(session);
    }
    conn.ws.send(Message::Text(envelope.to_string())).await?;

    let deadline = tokio::time::Instant::now() + COMMAND_TIMEOUT;
    loop {
        let message = tokio::time::timeout_at(deadline, conn.ws.next())
            .await
            .map_err(|_| BrowserError::Protocol(format!("{method} timed out")))?;
        let message = match message {
            Some(m) => m?,
            None => return Err(BrowserError::Protocol("connection closed".to_owned())),
        };
        let Message::Text(text) = message else {
            continue;
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if value.get("method").and_then(Value::as_str) == Some("Runtime.consoleAPICalled") {
            buffer_console_event(conn, &value);
            continue;
        }
        if value.get("id").and_then(Value::as_u64) == Some(id) {
            if let Some(error) = value.get("error") {
                return Err(BrowserError::Protocol(format!("{method}: {error}")));
            }
            return Ok(value.get("result").cloned().unwrap_or(Value::Null));
        }
    }
}

fn buffer_console_event(conn: &mut Connection, event: &Value) {
    let line = event
        .get("params")
        .and_then(|p| p.get("args"))
        .and_then(Value::as_array)
        .map(|args| {
            args.iter()
                .filter_map(|a| a.get("value"))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    if conn.console.len() == CONSOLE_CAPACITY {
        conn.console.pop_front();
    }
    conn.console.push_back(line);
}

fn string_field(value: &Value, field: &str) -> Result<String, BrowserError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| BrowserError::Protocol(format!("missing {field} in reply")))
}

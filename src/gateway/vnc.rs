//! VNC WebSocket relay: bridges a client connection to the sandbox's VNC
//! WebSocket, forwarding binary frames both ways until either side closes.

use axum::extract::ws::{Message as ClientMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;

use super::error::ApiError;
use super::routes::GatewayState;

/// VNC relay handler at `GET /api/v1/agents/{id}/vnc`: upgrades with
/// subprotocol `binary` and bridges to the sandbox.
pub async fn vnc_ws(
    State(runtime): State<GatewayState>,
    Path(agent_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let sandbox = runtime
        .sandbox(&agent_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Agent not found: {agent_id}")))?;
    let upstream_url = sandbox.vnc_url();
    Ok(ws
        .protocols(["binary"])
        .on_upgrade(move |socket| relay(socket, upstream_url)))
}

async fn relay(client: WebSocket, upstream_url: String) {
    log::info!("connecting to VNC WebSocket at {upstream_url}");
    let upstream = match connect_async(&upstream_url).await {
        Ok((upstream, _)) => upstream,
        Err(e) => {
            log::error!("unable to connect to sandbox VNC at {upstream_url}: {e}");
            return;
        }
    };

    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let to_upstream = async {
        while let Some(Ok(message)) = client_rx.next().await {
            let forward = match message {
                ClientMessage::Binary(data) => UpstreamMessage::Binary(data),
                ClientMessage::Text(text) => UpstreamMessage::Text(text),
                ClientMessage::Close(_) => break,
                // Axum answers pings itself; nothing to forward.
                ClientMessage::Ping(_) | ClientMessage::Pong(_) => continue,
            };
            if upstream_tx.send(forward).await.is_err() {
                break;
            }
        }
    };

    let to_client = async {
        while let Some(Ok(message)) = upstream_rx.next().await {
            let forward = match message {
                UpstreamMessage::Binary(data) => ClientMessage::Binary(data),
                UpstreamMessage::Text(text) => ClientMessage::Text(text),
                UpstreamMessage::Close(_) => break,
                UpstreamMessage::Ping(_) | UpstreamMessage::Pong(_) => continue,
                UpstreamMessage::Frame(_) => continue,
            };
            if client_tx.send(forward).await.is_err() {
                break;
            }
        }
    };

    // Either direction closing tears down the relay.
    tokio::select! {
        _ = to_upstream => {}
        _ = to_client => {}
    }
    log::info!("VNC relay closed for {upstream_url}");
}

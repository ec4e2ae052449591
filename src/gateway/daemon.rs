//! HTTP server assembly and lifecycle.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::runtime::AgentRuntime;

use super::routes::{GatewayState, chat, create_agent, view_file, view_shell};
use super::vnc::vnc_ws;

/// Build the full API router around a shared runtime.
pub fn build_router(runtime: GatewayState) -> Router {
    Router::new()
        .route("/api/v1/agents", post(create_agent))
        .route("/api/v1/agents/:agent_id/chat", post(chat))
        .route("/api/v1/agents/:agent_id/shell", post(view_shell))
        .route("/api/v1/agents/:agent_id/file", post(view_file))
        .route("/api/v1/agents/:agent_id/vnc", get(vnc_ws))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(runtime)
}

/// Bind and serve until SIGINT/SIGTERM, then close every agent.
pub async fn start_gateway(
    settings: &Settings,
    runtime: Arc<AgentRuntime>,
) -> Result<(), String> {
    let app = build_router(runtime.clone());

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("could not bind to {addr}: {e}"))?;
    log::info!("famulus listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))?;

    log::info!("shutting down, closing all agents");
    runtime.close_all().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => log::warn!("could not install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

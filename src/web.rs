//! Axum-based HTTP API of the standalone adapter

use crate::error::SessyError;
use crate::plugin::PluginState;
use crate::runtime::BridgeRuntime;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<Mutex<BridgeRuntime>>,
}

#[derive(Debug, Deserialize)]
pub struct CommandBody {
    pub command: String,
    #[serde(default)]
    pub level: f64,
}

fn error_status(error: &SessyError) -> StatusCode {
    match error {
        SessyError::Command { .. }
        | SessyError::UnknownStrategy { .. }
        | SessyError::UnknownSwitchState { .. }
        | SessyError::Validation { .. } => StatusCode::BAD_REQUEST,
        SessyError::Request { .. } | SessyError::Transport { .. } | SessyError::TooManyRetries => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &SessyError) -> Response {
    (
        error_status(error),
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let rt = state.runtime.lock().await;
    let (plugin_state, reason) = match rt.state() {
        PluginState::Stopped => ("stopped", None),
        PluginState::Running => ("running", None),
        PluginState::Disabled(reason) => ("disabled", Some(reason.clone())),
    };
    Json(serde_json::json!({
        "state": plugin_state,
        "reason": reason,
        "batteries": rt.plugin().battery_names(),
        "heartbeat_seconds": rt.heartbeat_interval().as_secs(),
        "version": env!("APP_VERSION"),
    }))
}

async fn devices(State(state): State<AppState>) -> impl IntoResponse {
    let rt = state.runtime.lock().await;
    Json(rt.devices())
}

async fn command(
    State(state): State<AppState>,
    Path((device_id, unit)): Path<(String, u8)>,
    Json(body): Json<CommandBody>,
) -> Response {
    let mut rt = state.runtime.lock().await;
    match rt.command(&device_id, unit, &body.command, body.level).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response(),
        Err(e) => error_response(&e),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/devices", get(devices))
        .route("/api/devices/{device_id}/{unit}/command", post(command))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(runtime: Arc<Mutex<BridgeRuntime>>, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(AppState { runtime });
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}

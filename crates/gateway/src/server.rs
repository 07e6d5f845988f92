use std::net::SocketAddr;

use {
    axum::{
        Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    pixelbot_channels::InboundUnit,
    pixelbot_common::types::{DeviceId, NotifyFrame, SessionId},
    pixelbot_devices::RpcReply,
    serde::Deserialize,
    tokio_util::sync::CancellationToken,
    tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer},
    tracing::{debug, info, warn},
};

use crate::{error::ApiError, state::GatewayState};

/// Device gateways post small JSON frames; anything bigger is a bug.
const MAX_BODY_BYTES: usize = 256 * 1024;

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the callback router (shared between production startup and tests).
pub fn build_gateway_app(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/devices", get(devices_handler))
        .route("/devices/{id}/notify", post(notify_handler))
        .route("/rpc/reply", post(rpc_reply_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the callback endpoint until `shutdown` is cancelled.
pub async fn start_gateway(
    bind: &str,
    port: u16,
    state: GatewayState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let app = build_gateway_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "device callback endpoint listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("device callback endpoint stopped");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

fn authorize(state: &GatewayState, headers: &HeaderMap) -> Result<(), ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if state.authorized(header) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "devices": state.registry.count(),
        "pending_rpcs": state.bridge.pending_count(),
    }))
}

async fn devices_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.registry.list()))
}

/// Either `{"frames": [...], "session": "..."}` or a bare array of frames.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NotifyBody {
    Envelope {
        frames: Vec<NotifyFrame>,
        #[serde(default)]
        session: Option<SessionId>,
    },
    Frames(Vec<NotifyFrame>),
}

async fn notify_handler(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<NotifyBody>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    let device = DeviceId::new(id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    if state.registry.device(&device).is_none() {
        return Err(ApiError::not_found(format!("unknown device: {device}")));
    }

    let (frames, session) = match body {
        NotifyBody::Envelope { frames, session } => (frames, session),
        NotifyBody::Frames(frames) => (frames, None),
    };
    if frames.is_empty() {
        return Err(ApiError::bad_request("no notify frames"));
    }

    // Frames without an explicit chat go to the chat last seen driving devices.
    let session = session.or_else(|| state.registry.associated_session());
    let count = frames.len();
    debug!(device = %device, count, "notify frames received");

    let mut unit = InboundUnit::notify(Some(device), frames);
    unit.session = session;
    state.sink.submit(unit).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": count })),
    ))
}

async fn rpc_reply_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(reply): Json<RpcReply>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &headers)?;
    let id = reply.id;
    if state.bridge.complete(reply) {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        warn!(id, "rpc reply for unknown or expired request");
        Err(ApiError::not_found(format!("no pending request with id {id}")))
    }
}

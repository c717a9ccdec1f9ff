//! Axum-based HTTP API for one accessory.
//!
//! Positional accessories (door, window, window covering):
//! - GET `/api/state` - Current position, target, motion state and hold
//! - POST `/api/target` - Set target position `{"position": 40}` or `40`
//! - POST `/api/hold` - Set or clear hold `{"hold": true}`
//! - GET `/api/info` - Accessory information
//!
//! Switches and push-buttons:
//! - GET `/api/state` - `{"on": bool}`
//! - POST `/api/on` - Set on `{"on": true}`
//! - GET `/api/info` - Accessory information
//!
//! Commands are queued to the accessory's runtime; the response confirms the
//! command was accepted, not that the move has finished. Poll `/api/state`
//! for the outcome.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::accessory::AccessoryInformation;
use crate::commands::{CoverEvent, SwitchEvent};
use crate::config::WebConfig;

use super::api::{parse_flag_payload, parse_target_payload, ApiResponse, CommandResponse, PayloadError};
use super::publisher::{CoverSnapshot, SwitchSnapshot};
use super::runtime::{CoverHandle, SwitchHandle};

// ============================================================================
// Application State
// ============================================================================

/// Router state for a positional accessory.
#[derive(Clone, Debug)]
pub struct CoverApp {
    /// Handle into the accessory's runtime.
    pub handle: CoverHandle,
    /// Latest published state.
    pub state: watch::Receiver<CoverSnapshot>,
    /// Accessory information.
    pub information: AccessoryInformation,
}

/// Router state for a switch or push-button.
#[derive(Clone, Debug)]
pub struct SwitchApp {
    /// Handle into the accessory's runtime.
    pub handle: SwitchHandle,
    /// Latest published state.
    pub state: watch::Receiver<SwitchSnapshot>,
    /// Accessory information.
    pub information: AccessoryInformation,
}

// ============================================================================
// Route Handlers
// ============================================================================

fn bad_request(err: PayloadError) -> Response {
    debug!("rejected request: {}", err);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::err(err.to_string())),
    )
        .into_response()
}

fn queued(result: crate::Result<()>, what: &str) -> Response {
    match result {
        Ok(()) => Json(ApiResponse::ok(CommandResponse::accepted(what))).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::err(err.to_string())),
        )
            .into_response(),
    }
}

/// GET /api/state
async fn get_cover_state(State(app): State<CoverApp>) -> Json<ApiResponse<CoverSnapshot>> {
    let snapshot = *app.state.borrow();
    Json(ApiResponse::ok(snapshot))
}

/// POST /api/target
async fn set_target(State(app): State<CoverApp>, body: Bytes) -> Response {
    match parse_target_payload(&body) {
        Ok(target) => queued(
            app.handle.send(CoverEvent::SetTargetPosition(target)),
            "target_queued",
        ),
        Err(err) => bad_request(err),
    }
}

/// POST /api/hold
async fn set_hold(State(app): State<CoverApp>, body: Bytes) -> Response {
    match parse_flag_payload(&body, "hold") {
        Ok(hold) => queued(app.handle.set_hold(hold), "hold_queued"),
        Err(err) => bad_request(err),
    }
}

/// GET /api/info
async fn get_cover_info(State(app): State<CoverApp>) -> Json<ApiResponse<AccessoryInformation>> {
    Json(ApiResponse::ok(app.information))
}

async fn get_switch_state(State(app): State<SwitchApp>) -> Json<ApiResponse<SwitchSnapshot>> {
    let snapshot = *app.state.borrow();
    Json(ApiResponse::ok(snapshot))
}

async fn set_on(State(app): State<SwitchApp>, body: Bytes) -> Response {
    match parse_flag_payload(&body, "on") {
        Ok(on) => queued(app.handle.set_on(on), "on_queued"),
        Err(err) => bad_request(err),
    }
}

async fn get_switch_info(
    State(app): State<SwitchApp>,
) -> Json<ApiResponse<AccessoryInformation>> {
    Json(ApiResponse::ok(app.information))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Router Builders
// ============================================================================

fn with_cors(router: Router, config: &WebConfig) -> Router {
    if config.cors_permissive {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Routes for a door, window or window covering.
pub fn cover_router(app: CoverApp, config: &WebConfig) -> Router {
    let router = Router::new()
        .route("/api/state", get(get_cover_state))
        .route("/api/target", post(set_target))
        .route("/api/hold", post(set_hold))
        .route("/api/info", get(get_cover_info))
        .fallback(not_found)
        .with_state(app);
    with_cors(router, config)
}

/// Routes for a switch or push-button.
pub fn switch_router(app: SwitchApp, config: &WebConfig) -> Router {
    let router = Router::new()
        .route("/api/state", get(get_switch_state))
        .route("/api/on", post(set_on))
        .route("/api/info", get(get_switch_info))
        .fallback(not_found)
        .with_state(app);
    with_cors(router, config)
}

/// Bind `config.bind_addr()` and serve `router` until the process exits.
pub async fn serve(router: Router, config: &WebConfig) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP API listening on http://{}", addr);
    axum::serve(listener, router).await
}

//! Integration tests for the web API.
//!
//! These tests verify the HTTP API endpoints work correctly.

#![cfg(feature = "web")]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use gpio_accessory::hal::{MockActuator, MockOutput};
use gpio_accessory::services::{
    cover_router, switch_router, ApiResponse, CommandResponse, CoverApp, CoverSnapshot,
    RuntimeChannel, SwitchApp, SwitchSnapshot, WatchPublisher, WatchSwitchPublisher,
};
use gpio_accessory::{
    AccessoryInformation, AccessoryLifecycle, CoverEvent, GpioSwitch, MotionState,
    PositionController, ServiceKind, TravelProfile, WebConfig,
};

fn create_cover_app() -> (axum::Router, CoverApp) {
    let channel = RuntimeChannel::new();
    let (publisher, state) = WatchPublisher::new();
    let information = AccessoryInformation::new("Blind", ServiceKind::WindowCovering, Some(5));
    let cover = PositionController::new(
        MockActuator::new(),
        channel.scheduler(CoverEvent::TimerFired),
        publisher,
        TravelProfile::new(10_000, 10_000).unwrap(),
    )
    .with_information(information.clone());
    let (runtime, handle) = channel.into_runtime(cover);
    tokio::spawn(runtime.run());

    let app = CoverApp {
        handle,
        state,
        information,
    };
    (cover_router(app.clone(), &WebConfig::default()), app)
}

async fn send(router: &axum::Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn wait_for<T>(state: &mut watch::Receiver<T>, done: impl FnMut(&T) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(done))
        .await
        .expect("state never reached")
        .expect("publisher dropped");
}

#[tokio::test]
async fn test_get_state() {
    let (router, mut app) = create_cover_app();
    wait_for(&mut app.state, |s| s.motion_state == MotionState::Stopped).await;

    let (status, body) = send(&router, "GET", "/api/state", "").await;
    assert_eq!(status, StatusCode::OK);

    let json: ApiResponse<CoverSnapshot> = serde_json::from_slice(&body).unwrap();
    assert!(json.success);
    let data = json.data.unwrap();
    assert_eq!(data.current_position, 50.0);
    assert_eq!(data.target_position, 50.0);
    assert_eq!(data.motion_state, MotionState::Stopped);
    assert!(!data.hold);
}

#[tokio::test]
async fn test_set_target() {
    let (router, mut app) = create_cover_app();

    let (status, body) = send(&router, "POST", "/api/target", r#"{"position": 80}"#).await;
    assert_eq!(status, StatusCode::OK);
    let json: ApiResponse<CommandResponse> = serde_json::from_slice(&body).unwrap();
    assert!(json.success);
    assert!(json.data.unwrap().accepted);

    wait_for(&mut app.state, |s| {
        s.target_position == 80.0 && s.motion_state == MotionState::Increasing
    })
    .await;
}

#[tokio::test]
async fn test_set_target_plain_number() {
    let (router, mut app) = create_cover_app();

    let (status, _) = send(&router, "POST", "/api/target", "10").await;
    assert_eq!(status, StatusCode::OK);
    wait_for(&mut app.state, |s| s.motion_state == MotionState::Decreasing).await;
}

#[tokio::test]
async fn test_set_target_out_of_range() {
    let (router, app) = create_cover_app();

    let (status, body) = send(&router, "POST", "/api/target", r#"{"position": 150}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
    assert!(json.error.unwrap().contains("150"));

    assert_eq!(app.state.borrow().target_position, 50.0);
}

#[tokio::test]
async fn test_set_target_malformed() {
    let (router, _app) = create_cover_app();

    let (status, body) = send(&router, "POST", "/api/target", r#"{"percent": 40}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
}

#[tokio::test]
async fn test_hold_freezes_move() {
    let (router, mut app) = create_cover_app();

    send(&router, "POST", "/api/target", "100").await;
    wait_for(&mut app.state, |s| s.motion_state == MotionState::Increasing).await;

    let (status, _) = send(&router, "POST", "/api/hold", r#"{"hold": true}"#).await;
    assert_eq!(status, StatusCode::OK);
    wait_for(&mut app.state, |s| {
        s.hold && s.motion_state == MotionState::Stopped && s.target_position == s.current_position
    })
    .await;

    let (status, _) = send(&router, "POST", "/api/hold", "maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_info() {
    let (router, _app) = create_cover_app();

    let (status, body) = send(&router, "GET", "/api/info", "").await;
    assert_eq!(status, StatusCode::OK);
    let json: ApiResponse<AccessoryInformation> = serde_json::from_slice(&body).unwrap();
    let info = json.data.unwrap();
    assert_eq!(info.name.as_str(), "Blind");
    assert_eq!(info.model.as_str(), "GPIO-WindowCovering-Service");
    assert_eq!(info.serial_number.as_str(), "GPIO5");
}

#[tokio::test]
async fn test_not_found() {
    let (router, _app) = create_cover_app();

    let (status, body) = send(&router, "GET", "/api/position", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
}

#[tokio::test]
async fn test_runtime_closed_is_unavailable() {
    let (router, app) = create_cover_app();
    app.handle.shutdown().unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !app.handle.is_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let (status, body) = send(&router, "POST", "/api/target", "20").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
}

#[tokio::test]
async fn test_switch_on() {
    let channel = RuntimeChannel::new();
    let (publisher, mut state) = WatchSwitchPublisher::new();
    let switch = GpioSwitch::new(MockOutput::new(), publisher);
    let information = switch.information().clone();
    let (runtime, handle) = channel.into_runtime(switch);
    tokio::spawn(runtime.run());

    let router = switch_router(
        SwitchApp {
            handle,
            state: state.clone(),
            information,
        },
        &WebConfig::default().with_cors(false),
    );

    let (status, _) = send(&router, "POST", "/api/on", r#"{"on": true}"#).await;
    assert_eq!(status, StatusCode::OK);
    wait_for(&mut state, |s| s.on).await;

    let (status, body) = send(&router, "GET", "/api/state", "").await;
    assert_eq!(status, StatusCode::OK);
    let json: ApiResponse<SwitchSnapshot> = serde_json::from_slice(&body).unwrap();
    assert!(json.data.unwrap().on);

    let (status, _) = send(&router, "POST", "/api/target", "20").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

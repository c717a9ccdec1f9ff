//! Event loop and host bridges.
//!
//! - `runtime`: single-threaded tokio event loop per accessory, with a timer
//!   scheduler and cloneable handles
//! - `publisher`: state publishers backed by `tokio::sync::watch`
//! - `web` feature: Axum-based HTTP API with JSON endpoints
//! - `mqtt` feature: MQTT bridge for pub/sub control
//!
//! Hosts never touch an accessory directly. They send events through a
//! handle and observe published state through a watch receiver:
//!
//! ```ignore
//! let channel = RuntimeChannel::new();
//! let (publisher, state) = WatchPublisher::new();
//! let cover = PositionController::new(actuator, channel.scheduler(CoverEvent::TimerFired), publisher, profile);
//! let (runtime, handle) = channel.into_runtime(cover);
//!
//! // Web and MQTT share the same handle and state
//! let router = cover_router(CoverApp { handle: handle.clone(), state: state.clone(), information }, &web_config);
//! let bridge = CoverBridge::new(handle.clone(), state);
//! ```

pub mod publisher;
pub mod runtime;

// API types are shared between web and mqtt
#[cfg(any(feature = "web", feature = "mqtt"))]
pub mod api;

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-exports
pub use publisher::*;
pub use runtime::*;

#[cfg(any(feature = "web", feature = "mqtt"))]
pub use api::*;

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "mqtt")]
pub use mqtt::*;

//! # gpio-accessory
//!
//! GPIO-driven smart-home accessories: motorized doors, windows and window
//! coverings run by two relays, plus plain switches and momentary
//! push-buttons.
//!
//! ## Features
//!
//! - **Timed positioning**: Position is modelled from calibrated full-travel
//!   times; no encoder required
//! - **Interruptible moves**: A new target, a hold request or a limit contact
//!   ends the move in flight and reconstructs where the cover stopped
//! - **Relay interlock**: The two direction outputs are never active together
//! - **Hardware abstraction**: Traits for actuators, outputs, contacts and
//!   timers, with mocks for desktop testing
//! - **Host bridges**: tokio event loop, HTTP API and MQTT (feature-gated)
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, timer and publisher abstractions
//! - `motion` - Travel model: planning and extrapolation
//! - `cover` - Position controller for motorized accessories
//! - `switch` - Switch and push-button accessories
//! - `accessory` - Lifecycle trait and accessory information
//! - `commands` - Inbound events and range validation
//! - `hal` - Concrete implementations (mock, embedded-hal, Raspberry Pi)
//! - `services` - Event loop and host bridges (requires `runtime`)
//!
//! ## Example
//!
//! ```rust
//! use gpio_accessory::{
//!     BoundaryEdge, CoverEvent, MotionState, PositionController, TargetPosition, TravelProfile,
//!     hal::{MockActuator, MockPublisher, MockScheduler},
//! };
//!
//! let profile = TravelProfile::new(20_000, 18_000).unwrap();
//! let mut cover = PositionController::new(
//!     MockActuator::new(),
//!     MockScheduler::new(),
//!     MockPublisher::new(),
//!     profile,
//! );
//! cover.start(0).unwrap();
//!
//! // Host asks for fully open
//! let target = TargetPosition::new(100).unwrap();
//! cover.handle(CoverEvent::SetTargetPosition(target), 0).unwrap();
//! assert_eq!(cover.motion_state(), MotionState::Increasing);
//!
//! // The open limit contact is made before the timer runs out
//! cover.handle(CoverEvent::Boundary(BoundaryEdge::Open), 9_500).unwrap();
//! assert_eq!(cover.current_position(), 100.0);
//! assert_eq!(cover.motion_state(), MotionState::Stopped);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Accessory lifecycle trait, information service and service kinds.
pub mod accessory;
/// Inbound events and validated host requests.
pub mod commands;
/// Accessory, web, MQTT and daemon configuration.
pub mod config;
/// Position controller for motorized doors, windows and coverings.
pub mod cover;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Travel model for timed, unsensed motion.
pub mod motion;
/// Switch and push-button accessories.
pub mod switch;
/// Core traits for hardware, timers and state publishing.
pub mod traits;

/// Event loop and host bridges (feature-gated).
#[cfg(feature = "runtime")]
pub mod services;

// Re-exports for convenience
pub use accessory::{AccessoryInformation, AccessoryLifecycle, ServiceKind};
pub use commands::{CoverEvent, MoveOutcome, SwitchEvent, TargetPosition};
pub use cover::{CoverState, PositionController};
pub use error::{ConfigError, Error, Result};
pub use motion::{
    BoundaryEdge, Direction, MotionProgress, MotionSession, MotionState, MovePlan, TravelProfile,
};
pub use switch::{GpioSwitch, PushButton};
pub use traits::{
    ActuatorDriver, Clock, ContactInput, DigitalOutput, MotionScheduler, Polarity,
    StatePublisher, SwitchPublisher,
};

// Config re-exports
pub use config::{AccessoryConfig, MqttConfig, WebConfig};

#[cfg(feature = "runtime")]
pub use config::{DaemonConfig, LoggingConfig};

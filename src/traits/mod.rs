//! Trait definitions for hardware abstraction, timers and state publishing.
//!
//! This module defines the core abstractions that allow gpio-accessory to:
//! - Run on different hardware (Raspberry Pi, any embedded-hal pin, mocks)
//! - Run under different event loops (tokio, tests with a manual clock)
//! - Report state to different hosts (HTTP, MQTT, in-process observers)
//!
//! # Submodules
//!
//! - `hardware`: Directional actuator, single outputs, contact inputs, clock
//! - `scheduler`: Cancellable single-shot timer
//! - `publisher`: Host-platform state slots
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`ActuatorDriver`]: Two mutually exclusive motor outputs
//! - [`DigitalOutput`]: A single relay or signal line
//! - [`ContactInput`]: A limit or reed contact
//! - [`Clock`]: Time source for `no_std` environments

pub mod hardware;
pub mod publisher;
pub mod scheduler;

pub use hardware::*;
pub use publisher::*;
pub use scheduler::*;

//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `gpio`: Adapters for any embedded-hal 1.0 pin
//! - `rpi`: Raspberry Pi pins and contact interrupts via rppal (requires `rpi` feature)

pub mod gpio;
pub mod mock;

#[cfg(feature = "rpi")]
pub mod rpi;

pub use gpio::*;
pub use mock::*;

//! Inbound commands and events for the accessories.
//!
//! Every input an accessory reacts to is an event: host requests (set target
//! position, hold, on/off), boundary-sensor edges and timer fires. Events are
//! processed one at a time, in arrival order, by the accessory's event loop,
//! so no two operations on an accessory ever overlap.
//!
//! # Validation
//!
//! Host requests are validated here, before they reach an accessory. A
//! [`TargetPosition`] can only be built from a value in `0..=100`:
//!
//! ```rust
//! use gpio_accessory::TargetPosition;
//!
//! assert_eq!(TargetPosition::new(40).unwrap().get(), 40);
//! assert!(TargetPosition::new(101).is_err());
//! assert!(TargetPosition::new(-1).is_err());
//! ```

use crate::error::Error;
use crate::motion::{BoundaryEdge, Direction};

/// A validated target position, `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetPosition(u8);

impl TargetPosition {
    /// Validate an inbound position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, Error> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::PositionOutOfRange(value))
        }
    }

    /// The position as an integer percentage.
    #[inline]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// The position as used by the motion model.
    #[inline]
    pub fn as_position(&self) -> f32 {
        self.0 as f32
    }
}

impl TryFrom<u8> for TargetPosition {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        Self::new(value as i64)
    }
}

/// Events handled by a positional accessory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverEvent {
    /// Host request to move to a position.
    SetTargetPosition(TargetPosition),
    /// Host sets or clears the hold flag.
    SetHold(bool),
    /// A boundary sensor reports its limit was reached.
    Boundary(BoundaryEdge),
    /// The motion timer armed with this generation elapsed.
    TimerFired(u64),
}

/// Events handled by an on/off accessory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchEvent {
    /// Host sets the On characteristic.
    SetOn(bool),
    /// The release timer armed with this generation elapsed.
    TimerFired(u64),
}

/// What a target request did.
///
/// Returned by [`PositionController::request_target_position`].
///
/// [`PositionController::request_target_position`]: crate::PositionController::request_target_position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The motor was started.
    Started {
        /// Direction of travel.
        direction: Direction,
        /// Armed timer duration.
        duration_ms: u64,
    },
    /// Target equals the current position; nothing moved.
    AlreadyThere,
    /// The hold flag is set; nothing moved.
    Held,
}

impl MoveOutcome {
    /// True if the motor was started.
    #[inline]
    pub fn is_started(&self) -> bool {
        matches!(self, MoveOutcome::Started { .. })
    }
}

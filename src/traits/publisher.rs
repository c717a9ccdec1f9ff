//! Observable state slots of the host platform.
//!
//! Accessories push every change through these traits as soon as it happens.
//! Publishers only observe; they never feed values back into the accessory.
//! Inbound requests travel the other way, as events (see [`crate::commands`]).

use crate::motion::MotionState;

/// State slots of a positional accessory (door, window, window covering).
pub trait StatePublisher {
    /// Current position, 0 (closed) to 100 (open).
    fn current_position(&mut self, position: f32);

    /// Target position, 0 (closed) to 100 (open).
    fn target_position(&mut self, position: f32);

    /// Motion state.
    fn motion_state(&mut self, state: MotionState);

    /// Hold flag.
    fn hold(&mut self, hold: bool);
}

/// State slot of an on/off accessory.
pub trait SwitchPublisher {
    /// On characteristic.
    fn on(&mut self, on: bool);
}

//! Publishers backed by `tokio::sync::watch`.
//!
//! The accessory writes each slot as it changes; any number of observers
//! (HTTP handlers, the MQTT bridge, tests) hold a receiver and read the
//! latest snapshot or wait for the next change. Writing a value equal to the
//! current one does not wake observers.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::motion::{MotionState, POSITION_NEUTRAL};
use crate::traits::{StatePublisher, SwitchPublisher};

/// Published state of a positional accessory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverSnapshot {
    /// Current position (0 to 100).
    pub current_position: f32,
    /// Target position (0 to 100).
    pub target_position: f32,
    /// Motion state.
    pub motion_state: MotionState,
    /// Hold flag.
    pub hold: bool,
}

impl Default for CoverSnapshot {
    fn default() -> Self {
        Self {
            current_position: POSITION_NEUTRAL,
            target_position: POSITION_NEUTRAL,
            motion_state: MotionState::Stopped,
            hold: false,
        }
    }
}

/// Published state of an on/off accessory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSnapshot {
    /// On characteristic.
    pub on: bool,
}

fn update<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// [`StatePublisher`] writing into a watch channel.
#[derive(Debug)]
pub struct WatchPublisher {
    sender: watch::Sender<CoverSnapshot>,
}

impl WatchPublisher {
    /// Create a publisher and its first receiver.
    pub fn new() -> (Self, watch::Receiver<CoverSnapshot>) {
        let (sender, receiver) = watch::channel(CoverSnapshot::default());
        (Self { sender }, receiver)
    }

    /// Another receiver.
    pub fn subscribe(&self) -> watch::Receiver<CoverSnapshot> {
        self.sender.subscribe()
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> CoverSnapshot {
        *self.sender.borrow()
    }
}

impl StatePublisher for WatchPublisher {
    fn current_position(&mut self, position: f32) {
        self.sender
            .send_if_modified(|state| update(&mut state.current_position, position));
    }

    fn target_position(&mut self, position: f32) {
        self.sender
            .send_if_modified(|state| update(&mut state.target_position, position));
    }

    fn motion_state(&mut self, motion_state: MotionState) {
        self.sender
            .send_if_modified(|state| update(&mut state.motion_state, motion_state));
    }

    fn hold(&mut self, hold: bool) {
        self.sender
            .send_if_modified(|state| update(&mut state.hold, hold));
    }
}

/// [`SwitchPublisher`] writing into a watch channel.
#[derive(Debug)]
pub struct WatchSwitchPublisher {
    sender: watch::Sender<SwitchSnapshot>,
}

impl WatchSwitchPublisher {
    /// Create a publisher and its first receiver.
    pub fn new() -> (Self, watch::Receiver<SwitchSnapshot>) {
        let (sender, receiver) = watch::channel(SwitchSnapshot::default());
        (Self { sender }, receiver)
    }

    /// Another receiver.
    pub fn subscribe(&self) -> watch::Receiver<SwitchSnapshot> {
        self.sender.subscribe()
    }
}

impl SwitchPublisher for WatchSwitchPublisher {
    fn on(&mut self, on: bool) {
        self.sender.send_if_modified(|state| update(&mut state.on, on));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_values_do_not_notify() {
        let (mut publisher, mut receiver) = WatchPublisher::new();

        publisher.current_position(50.0);
        publisher.motion_state(MotionState::Stopped);
        assert!(!receiver.has_changed().unwrap());

        publisher.target_position(80.0);
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().target_position, 80.0);
        assert_eq!(publisher.snapshot().target_position, 80.0);
    }

    #[test]
    fn switch_publisher_tracks_on() {
        let (mut publisher, receiver) = WatchSwitchPublisher::new();
        publisher.on(true);
        assert!(receiver.borrow().on);
        assert!(publisher.subscribe().borrow().on);
    }
}

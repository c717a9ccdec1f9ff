//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware, timer and publisher
//! traits, enabling development and testing on desktop without a Raspberry Pi.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockActuator`] | [`ActuatorDriver`] | Tracks both relay outputs and every write |
//! | [`MockOutput`] | [`DigitalOutput`] | Tracks a single output |
//! | [`MockContact`] | [`ContactInput`] | Settable contact level |
//! | [`MockScheduler`] | [`MotionScheduler`] | Records arm/cancel calls |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockPublisher`] | [`StatePublisher`] | Last value and history of each slot |
//! | [`MockSwitchPublisher`] | [`SwitchPublisher`] | Last value and history of On |
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::{PositionController, TravelProfile};
//! use gpio_accessory::hal::{MockActuator, MockPublisher, MockScheduler};
//!
//! let mut cover = PositionController::new(
//!     MockActuator::new(),
//!     MockScheduler::new(),
//!     MockPublisher::new(),
//!     TravelProfile::new(10_000, 10_000).unwrap(),
//! );
//!
//! cover.request_target_position(0.0, 0).unwrap();
//!
//! // Verify via the mocks
//! assert!(cover.actuator().retract);
//! assert_eq!(cover.scheduler().armed, Some((10_000, 0)));
//! assert_eq!(cover.publisher().target_position, Some(0.0));
//! ```
//!
//! [`ActuatorDriver`]: crate::traits::ActuatorDriver
//! [`DigitalOutput`]: crate::traits::DigitalOutput
//! [`ContactInput`]: crate::traits::ContactInput
//! [`MotionScheduler`]: crate::traits::MotionScheduler
//! [`Clock`]: crate::traits::Clock
//! [`StatePublisher`]: crate::traits::StatePublisher
//! [`SwitchPublisher`]: crate::traits::SwitchPublisher

use alloc::vec::Vec;

use crate::motion::MotionState;
use crate::traits::{
    ActuatorDriver, Clock, ContactInput, DigitalOutput, MotionScheduler, StatePublisher,
    SwitchPublisher,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock two-relay actuator for testing.
///
/// Records the output pair after every write, so tests can check that both
/// relays were never energized together.
///
/// # Example
///
/// ```rust
/// use gpio_accessory::hal::MockActuator;
/// use gpio_accessory::traits::ActuatorDriver;
///
/// let mut actuator = MockActuator::new();
/// actuator.set_retract(false).unwrap();
/// actuator.set_extend(true).unwrap();
///
/// assert!(actuator.extend);
/// assert_eq!(actuator.history, vec![(false, false), (true, false)]);
/// assert!(!actuator.both_active_seen);
/// ```
#[derive(Debug, Default)]
pub struct MockActuator {
    /// Extend (open) output state.
    pub extend: bool,
    /// Retract (close) output state.
    pub retract: bool,
    /// `(extend, retract)` after each write.
    pub history: Vec<(bool, bool)>,
    /// Set if both outputs were ever active at the same time.
    pub both_active_seen: bool,
    /// When set, every write fails with `Err(())` and changes nothing.
    pub fail_writes: bool,
}

impl MockActuator {
    /// Creates a new mock actuator with both outputs inactive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock actuator whose writes all fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn record(&mut self) {
        self.history.push((self.extend, self.retract));
        if self.extend && self.retract {
            self.both_active_seen = true;
        }
    }
}

impl ActuatorDriver for MockActuator {
    type Error = ();

    fn set_extend(&mut self, active: bool) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.extend = active;
        self.record();
        Ok(())
    }

    fn set_retract(&mut self, active: bool) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.retract = active;
        self.record();
        Ok(())
    }
}

/// Mock single output for testing.
///
/// # Example
///
/// ```rust
/// use gpio_accessory::hal::MockOutput;
/// use gpio_accessory::traits::DigitalOutput;
///
/// let mut output = MockOutput::new();
/// output.set_active(true).unwrap();
/// assert!(output.active);
/// assert_eq!(output.writes, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockOutput {
    /// Logical output state.
    pub active: bool,
    /// Number of times `set_active` was called.
    pub writes: usize,
}

impl MockOutput {
    /// Creates a new inactive mock output.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DigitalOutput for MockOutput {
    type Error = ();

    fn set_active(&mut self, active: bool) -> Result<(), ()> {
        self.active = active;
        self.writes += 1;
        Ok(())
    }
}

/// Mock contact input for testing.
///
/// # Example
///
/// ```rust
/// use gpio_accessory::hal::MockContact;
/// use gpio_accessory::traits::ContactInput;
///
/// let mut contact = MockContact::new();
/// assert!(!contact.is_active().unwrap());
///
/// contact.active = true;
/// assert!(contact.is_active().unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MockContact {
    /// Whether the contact is made.
    pub active: bool,
}

impl MockContact {
    /// Creates a new open (inactive) contact.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContactInput for MockContact {
    type Error = ();

    fn is_active(&mut self) -> Result<bool, ()> {
        Ok(self.active)
    }
}

// ============================================================================
// Timer Mocks
// ============================================================================

/// Mock scheduler for testing.
///
/// Never fires on its own: tests read [`armed`](Self::armed) and deliver the
/// fire themselves.
#[derive(Debug, Default)]
pub struct MockScheduler {
    /// Pending `(duration_ms, generation)`, if armed.
    pub armed: Option<(u64, u64)>,
    /// Number of times `arm` was called.
    pub arm_count: usize,
    /// Number of times `cancel` was called.
    pub cancel_count: usize,
}

impl MockScheduler {
    /// Creates a new mock scheduler with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MotionScheduler for MockScheduler {
    fn arm(&mut self, duration_ms: u64, generation: u64) {
        self.armed = Some((duration_ms, generation));
        self.arm_count += 1;
    }

    fn cancel(&mut self) {
        self.armed = None;
        self.cancel_count += 1;
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use gpio_accessory::hal::MockClock;
/// use gpio_accessory::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Publisher Mocks
// ============================================================================

/// One value pushed through a [`StatePublisher`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Published {
    /// Current position.
    CurrentPosition(f32),
    /// Target position.
    TargetPosition(f32),
    /// Motion state.
    MotionState(MotionState),
    /// Hold flag.
    Hold(bool),
}

/// Mock state publisher for testing.
///
/// Keeps the last value of each slot plus the ordered history of everything
/// published.
#[derive(Debug, Default)]
pub struct MockPublisher {
    /// Last published current position.
    pub current_position: Option<f32>,
    /// Last published target position.
    pub target_position: Option<f32>,
    /// Last published motion state.
    pub motion_state: Option<MotionState>,
    /// Last published hold flag.
    pub hold: Option<bool>,
    /// Every value in publish order.
    pub history: Vec<Published>,
}

impl MockPublisher {
    /// Creates a new mock publisher with nothing published.
    pub fn new() -> Self {
        Self::default()
    }

    /// Motion states in publish order, consecutive repeats collapsed.
    pub fn motion_transitions(&self) -> Vec<MotionState> {
        let mut transitions: Vec<MotionState> = Vec::new();
        for value in &self.history {
            if let Published::MotionState(state) = value {
                if transitions.last() != Some(state) {
                    transitions.push(*state);
                }
            }
        }
        transitions
    }

    /// Forget everything published so far.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl StatePublisher for MockPublisher {
    fn current_position(&mut self, position: f32) {
        self.current_position = Some(position);
        self.history.push(Published::CurrentPosition(position));
    }

    fn target_position(&mut self, position: f32) {
        self.target_position = Some(position);
        self.history.push(Published::TargetPosition(position));
    }

    fn motion_state(&mut self, state: MotionState) {
        self.motion_state = Some(state);
        self.history.push(Published::MotionState(state));
    }

    fn hold(&mut self, hold: bool) {
        self.hold = Some(hold);
        self.history.push(Published::Hold(hold));
    }
}

/// Mock On publisher for testing.
#[derive(Debug, Default)]
pub struct MockSwitchPublisher {
    /// Last published On value.
    pub on: Option<bool>,
    /// Every value in publish order.
    pub history: Vec<bool>,
}

impl MockSwitchPublisher {
    /// Creates a new mock publisher with nothing published.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SwitchPublisher for MockSwitchPublisher {
    fn on(&mut self, on: bool) {
        self.on = Some(on);
        self.history.push(on);
    }
}

// ============================================================================
// Tests
// ============================================================================

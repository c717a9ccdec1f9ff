//! Position controller for motorized doors, windows and window coverings.
//!
//! This module provides [`PositionController`], the state machine that drives
//! a two-relay actuator for a computed duration and keeps the host platform's
//! position characteristics in step with what the motor is doing.
//!
//! # Overview
//!
//! The controller:
//! - Turns a target position into a direction and a motor run time
//! - Ends a move on timer expiry, on a boundary contact or on hold
//! - Reconstructs the position of an interrupted move from elapsed time
//! - Publishes every change as it happens
//!
//! Everything runs as discrete turns of one event loop. Time is passed in as
//! `now_ms` on every call, so tests drive it with plain numbers.
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::{MotionState, MoveOutcome, PositionController, TravelProfile};
//! use gpio_accessory::hal::{MockActuator, MockPublisher, MockScheduler};
//!
//! let profile = TravelProfile::new(10_000, 10_000).unwrap();
//! let mut cover = PositionController::new(
//!     MockActuator::new(),
//!     MockScheduler::new(),
//!     MockPublisher::new(),
//!     profile,
//! );
//! cover.start(0).unwrap();
//!
//! // Boot position is 50; opening to 80 takes 30% of 10s
//! let outcome = cover.request_target_position(80.0, 0).unwrap();
//! assert!(matches!(outcome, MoveOutcome::Started { duration_ms: 3_000, .. }));
//! assert_eq!(cover.motion_state(), MotionState::Increasing);
//! assert!(cover.actuator().extend);
//!
//! // The scheduler delivers the fire for the armed generation
//! let (_, generation) = cover.scheduler().armed.unwrap();
//! cover.on_timer_fired(generation, 3_000).unwrap();
//! assert_eq!(cover.current_position(), 80.0);
//! assert_eq!(cover.motion_state(), MotionState::Stopped);
//! ```
//!
//! # Interrupted moves
//!
//! ```rust
//! use gpio_accessory::{PositionController, TravelProfile};
//! use gpio_accessory::hal::{MockActuator, MockPublisher, MockScheduler};
//!
//! let profile = TravelProfile::new(10_000, 10_000).unwrap();
//! let mut cover = PositionController::new(
//!     MockActuator::new(),
//!     MockScheduler::new(),
//!     MockPublisher::new(),
//!     profile,
//! );
//!
//! cover.request_target_position(100.0, 0).unwrap();
//! cover.set_hold(true, 2_000).unwrap();
//!
//! // 2s of a 10s full travel from 50
//! assert!((cover.current_position() - 70.0).abs() < 0.001);
//! assert_eq!(cover.target_position(), cover.current_position());
//! ```

use tracing::{debug, info, warn};

use crate::accessory::{AccessoryInformation, AccessoryLifecycle};
use crate::commands::{CoverEvent, MoveOutcome};
use crate::motion::{
    clamp_position, BoundaryEdge, Direction, MotionProgress, MotionSession, MotionState,
    TravelProfile, POSITION_NEUTRAL,
};
use crate::traits::{ActuatorDriver, MotionScheduler, StatePublisher};

/// Timed position controller.
///
/// Owns the actuator, the timer and the publisher handed to it at
/// construction, and is the only writer of the current position.
///
/// # Type Parameters
///
/// - `A`: The directional actuator ([`ActuatorDriver`])
/// - `S`: The single-shot timer ([`MotionScheduler`])
/// - `P`: The host state slots ([`StatePublisher`])
///
/// # Thread Safety
///
/// The controller is not thread-safe. Run it inside one event loop, such as
/// `services::runtime::AccessoryRuntime` (requires the `runtime` feature),
/// and send it events from anywhere else.
pub struct PositionController<A, S, P>
where
    A: ActuatorDriver,
    S: MotionScheduler,
    P: StatePublisher,
{
    actuator: A,
    scheduler: S,
    publisher: P,
    profile: TravelProfile,
    information: AccessoryInformation,
    current: f32,
    target: f32,
    hold: bool,
    session: Option<MotionSession>,
    generation: u64,
    observed: MotionState,
}

impl<A, S, P> PositionController<A, S, P>
where
    A: ActuatorDriver,
    S: MotionScheduler,
    P: StatePublisher,
{
    /// Create a controller at the neutral boot position.
    ///
    /// The real position is unknown at boot, so current and target both
    /// start at 50.
    pub fn new(actuator: A, scheduler: S, publisher: P, profile: TravelProfile) -> Self {
        Self {
            actuator,
            scheduler,
            publisher,
            profile,
            information: AccessoryInformation::default(),
            current: POSITION_NEUTRAL,
            target: POSITION_NEUTRAL,
            hold: false,
            session: None,
            generation: 0,
            observed: MotionState::Stopped,
        }
    }

    /// Set the accessory information reported to the host.
    pub fn with_information(mut self, information: AccessoryInformation) -> Self {
        self.information = information;
        self
    }

    /// Release both outputs and publish the initial values.
    pub fn start(&mut self, _now_ms: u64) -> Result<(), A::Error> {
        self.actuator.stop()?;
        self.publisher.current_position(self.current);
        self.publisher.target_position(self.target);
        self.publisher.motion_state(self.motion_state());
        self.publisher.hold(self.hold);
        info!(
            "{} service initialized ({})",
            self.information.model.as_str(),
            self.information.name.as_str()
        );
        Ok(())
    }

    /// Move towards `target`.
    ///
    /// An active move is stopped first, and its position reconstructed, so
    /// the new plan starts from where the cover actually is. `target` is
    /// clamped to `0.0..=100.0`; range validation of host input happens
    /// earlier, in [`TargetPosition`](crate::TargetPosition).
    pub fn request_target_position(
        &mut self,
        target: f32,
        now_ms: u64,
    ) -> Result<MoveOutcome, A::Error> {
        let target = clamp_position(target);

        if self.hold {
            debug!("Hold is set, ignoring target {}", target);
            self.target = self.current;
            self.publisher.target_position(self.target);
            return Ok(MoveOutcome::Held);
        }

        if self.session.is_some() {
            self.stop(None, now_ms)?;
        }

        let Some(plan) = self.profile.plan(self.current, target) else {
            self.target = self.current;
            self.publisher.target_position(self.target);
            return Ok(MoveOutcome::AlreadyThere);
        };

        debug!(
            "Moving {:?} from {} to {} for {}ms",
            plan.direction, self.current, target, plan.duration_ms
        );

        self.drive(plan.direction)?;
        self.session = Some(MotionSession {
            started_ms: now_ms,
            direction: plan.direction,
            planned_duration_ms: plan.duration_ms,
            from: self.current,
            target,
            generation: self.generation,
        });
        self.scheduler.arm(plan.duration_ms, self.generation);

        self.target = target;
        self.publisher.target_position(self.target);
        self.publish_motion_state();

        Ok(MoveOutcome::Started {
            direction: plan.direction,
            duration_ms: plan.duration_ms,
        })
    }

    /// Stop the motor.
    ///
    /// With `final_position` the position is known exactly (a boundary
    /// contact, or a completed move); without it the position is
    /// extrapolated from the active session, or left unchanged when there is
    /// none. Any pending timer is cancelled and its generation retired.
    pub fn stop(&mut self, final_position: Option<f32>, now_ms: u64) -> Result<(), A::Error> {
        self.actuator.stop()?;
        self.scheduler.cancel();
        self.generation = self.generation.wrapping_add(1);

        let position = match final_position {
            Some(position) => clamp_position(position),
            None => self.estimated_position(now_ms),
        };
        self.current = position;
        self.session = None;

        self.publisher.current_position(self.current);
        self.publisher.target_position(self.target);
        self.publish_motion_state();
        Ok(())
    }

    /// A boundary contact was made; the position is now known exactly.
    pub fn on_boundary_edge(&mut self, edge: BoundaryEdge, now_ms: u64) -> Result<(), A::Error> {
        if self.session.is_none() && self.current == edge.position() {
            warn!("Redundant {:?} boundary edge at {}", edge, self.current);
        }
        self.stop(Some(edge.position()), now_ms)
    }

    /// Set or clear the hold flag.
    pub fn set_hold(&mut self, hold: bool, now_ms: u64) -> Result<(), A::Error> {
        self.hold = hold;
        self.publisher.hold(hold);
        self.on_hold_requested(now_ms)
    }

    /// Freeze at the current position while the hold flag is set.
    pub fn on_hold_requested(&mut self, now_ms: u64) -> Result<(), A::Error> {
        if !self.hold {
            return Ok(());
        }
        self.stop(None, now_ms)?;
        self.target = self.current;
        self.publisher.target_position(self.target);
        Ok(())
    }

    /// The timer armed with `generation` elapsed.
    ///
    /// Returns `false` when the fire is stale: the session it belonged to has
    /// already been stopped.
    pub fn on_timer_fired(&mut self, generation: u64, now_ms: u64) -> Result<bool, A::Error> {
        let Some(session) = self.session else {
            debug!("Timer {} fired while stopped, ignoring", generation);
            return Ok(false);
        };
        if session.generation != generation {
            debug!(
                "Stale timer {} (current {}), ignoring",
                generation, session.generation
            );
            return Ok(false);
        }
        self.stop(Some(session.target), now_ms)?;
        Ok(true)
    }

    /// Dispatch one event.
    pub fn handle(&mut self, event: CoverEvent, now_ms: u64) -> Result<(), A::Error> {
        match event {
            CoverEvent::SetTargetPosition(target) => {
                self.request_target_position(target.as_position(), now_ms)?;
            }
            CoverEvent::SetHold(hold) => self.set_hold(hold, now_ms)?,
            CoverEvent::Boundary(edge) => self.on_boundary_edge(edge, now_ms)?,
            CoverEvent::TimerFired(generation) => {
                self.on_timer_fired(generation, now_ms)?;
            }
        }
        Ok(())
    }

    /// Stop any move in progress before the process exits.
    pub fn shutdown(&mut self, now_ms: u64) -> Result<(), A::Error> {
        self.stop(None, now_ms)
    }

    /// Release the opposite output, then energize `direction`.
    fn drive(&mut self, direction: Direction) -> Result<(), A::Error> {
        match direction {
            Direction::Increasing => {
                self.actuator.set_retract(false)?;
                self.actuator.set_extend(true)
            }
            Direction::Decreasing => {
                self.actuator.set_extend(false)?;
                self.actuator.set_retract(true)
            }
        }
    }

    fn publish_motion_state(&mut self) {
        let state = self.motion_state();
        self.publisher.motion_state(state);
        if state != self.observed {
            self.observed = state;
            info!("Status: {}", state.status());
        }
    }

    // ---- Accessors ----

    /// Last published current position.
    pub fn current_position(&self) -> f32 {
        self.current
    }

    /// Last published target position.
    pub fn target_position(&self) -> f32 {
        self.target
    }

    /// Position estimate at `now_ms`, extrapolated while moving.
    pub fn estimated_position(&self, now_ms: u64) -> f32 {
        match &self.session {
            Some(session) => session.position_at(&self.profile, now_ms),
            None => self.current,
        }
    }

    /// Motion state, derived from the active session.
    pub fn motion_state(&self) -> MotionState {
        self.session
            .map(|session| MotionState::from(session.direction))
            .unwrap_or(MotionState::Stopped)
    }

    /// Whether the hold flag is set.
    pub fn is_held(&self) -> bool {
        self.hold
    }

    /// The active move, if any.
    pub fn session(&self) -> Option<&MotionSession> {
        self.session.as_ref()
    }

    /// Progress of the active move, if any.
    pub fn progress(&self, now_ms: u64) -> Option<MotionProgress> {
        self.session
            .as_ref()
            .map(|session| session.progress(&self.profile, now_ms))
    }

    /// Current timer generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Travel profile.
    pub fn profile(&self) -> &TravelProfile {
        &self.profile
    }

    /// Accessory information.
    pub fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    /// The actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Mutable access to the publisher.
    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Release the actuator, e.g. to hand pins back to the HAL.
    pub fn into_actuator(self) -> A {
        self.actuator
    }

    /// Full state snapshot for UI/API.
    pub fn state(&self, now_ms: u64) -> CoverState {
        CoverState {
            current_position: self.current,
            target_position: self.target,
            motion_state: self.motion_state(),
            hold: self.hold,
            progress: self.progress(now_ms),
        }
    }
}

impl<A, S, P> AccessoryLifecycle for PositionController<A, S, P>
where
    A: ActuatorDriver,
    S: MotionScheduler,
    P: StatePublisher,
{
    type Event = CoverEvent;
    type Error = A::Error;

    fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    fn start(&mut self, now_ms: u64) -> Result<(), A::Error> {
        PositionController::start(self, now_ms)
    }

    fn handle(&mut self, event: CoverEvent, now_ms: u64) -> Result<(), A::Error> {
        PositionController::handle(self, event, now_ms)
    }

    fn shutdown(&mut self, now_ms: u64) -> Result<(), A::Error> {
        PositionController::shutdown(self, now_ms)
    }
}

/// Full state snapshot for UI/API.
///
/// Implements `serde::Serialize` when the `serde` feature is enabled.
///
/// # Example
///
/// ```rust
/// use gpio_accessory::{MotionState, PositionController, TravelProfile};
/// use gpio_accessory::hal::{MockActuator, MockPublisher, MockScheduler};
///
/// let cover = PositionController::new(
///     MockActuator::new(),
///     MockScheduler::new(),
///     MockPublisher::new(),
///     TravelProfile::new(1_000, 1_000).unwrap(),
/// );
///
/// let state = cover.state(0);
/// assert_eq!(state.current_position, 50.0);
/// assert_eq!(state.motion_state, MotionState::Stopped);
/// assert!(state.progress.is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverState {
    /// Current position (0 to 100).
    pub current_position: f32,
    /// Target position (0 to 100).
    pub target_position: f32,
    /// Motion state.
    pub motion_state: MotionState,
    /// Hold flag.
    pub hold: bool,
    /// Progress of the active move, if any.
    pub progress: Option<MotionProgress>,
}

impl Default for CoverState {
    fn default() -> Self {
        Self {
            current_position: POSITION_NEUTRAL,
            target_position: POSITION_NEUTRAL,
            motion_state: MotionState::Stopped,
            hold: false,
            progress: None,
        }
    }
}

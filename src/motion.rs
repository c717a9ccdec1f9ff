//! Position model for timed, unsensed motion.
//!
//! Covers driven by plain relays have no position encoder. Position is
//! modelled as constant-velocity travel calibrated by the full-travel time of
//! each direction: the same [`TravelProfile`] is used to *plan* a move (how
//! long to run the motor) and to *reconstruct* where the cover ended up when a
//! move is interrupted. Keeping both on one model is what makes an
//! interrupted position trustworthy.
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::motion::{Direction, TravelProfile};
//!
//! let profile = TravelProfile::new(20_000, 10_000).unwrap();
//!
//! // 80 -> 30 closes half the travel: half of the 10s close time
//! let plan = profile.plan(80.0, 30.0).unwrap();
//! assert_eq!(plan.direction, Direction::Decreasing);
//! assert_eq!(plan.duration_ms, 5_000);
//!
//! // Interrupted after 2s of closing from 80
//! let position = profile.extrapolate(80.0, Direction::Decreasing, 2_000);
//! assert!((position - 60.0).abs() < 0.001);
//! ```

use crate::error::ConfigError;

/// Fully closed (retracted).
pub const POSITION_CLOSED: f32 = 0.0;

/// Fully open (extended).
pub const POSITION_OPEN: f32 = 100.0;

/// Position assumed at boot, when the real one is unknown.
pub const POSITION_NEUTRAL: f32 = 50.0;

/// Clamp a position to `0.0..=100.0`.
#[inline]
pub fn clamp_position(position: f32) -> f32 {
    position.clamp(POSITION_CLOSED, POSITION_OPEN)
}

/// Direction of an active move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Opening, position rising towards 100.
    Increasing,
    /// Closing, position falling towards 0.
    Decreasing,
}

/// Motion state as exposed to the host platform.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MotionState {
    /// No motion session; both outputs released.
    #[default]
    Stopped,
    /// Opening.
    Increasing,
    /// Closing.
    Decreasing,
}

impl MotionState {
    /// Returns the state as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use gpio_accessory::MotionState;
    ///
    /// assert_eq!(MotionState::Stopped.as_str(), "stopped");
    /// assert_eq!(MotionState::Increasing.as_str(), "increasing");
    /// assert_eq!(MotionState::Decreasing.as_str(), "decreasing");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MotionState::Stopped => "stopped",
            MotionState::Increasing => "increasing",
            MotionState::Decreasing => "decreasing",
        }
    }

    /// Status label used in log lines.
    #[inline]
    pub const fn status(&self) -> &'static str {
        match self {
            MotionState::Stopped => "STOPPED",
            MotionState::Increasing => "OPENING",
            MotionState::Decreasing => "CLOSING",
        }
    }

    /// True while a motion session is active.
    #[inline]
    pub const fn is_moving(&self) -> bool {
        !matches!(self, MotionState::Stopped)
    }
}

impl From<Direction> for MotionState {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Increasing => MotionState::Increasing,
            Direction::Decreasing => MotionState::Decreasing,
        }
    }
}

/// Which limit a boundary sensor reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BoundaryEdge {
    /// The fully-open contact was made.
    Open,
    /// The fully-closed contact was made.
    Close,
}

impl BoundaryEdge {
    /// Exact position this limit stands for.
    #[inline]
    pub const fn position(&self) -> f32 {
        match self {
            BoundaryEdge::Open => POSITION_OPEN,
            BoundaryEdge::Close => POSITION_CLOSED,
        }
    }
}

/// Full-travel durations in each direction.
///
/// Both times must be non-zero: without them no move duration can be
/// computed, so construction fails instead of defaulting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TravelProfile {
    time_open_ms: u64,
    time_close_ms: u64,
}

impl TravelProfile {
    /// Create a profile from the full open and full close durations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTravelTime`] if either duration is zero.
    pub fn new(time_open_ms: u64, time_close_ms: u64) -> Result<Self, ConfigError> {
        if time_open_ms == 0 {
            return Err(ConfigError::MissingTravelTime("time_open_ms"));
        }
        if time_close_ms == 0 {
            return Err(ConfigError::MissingTravelTime("time_close_ms"));
        }
        Ok(Self {
            time_open_ms,
            time_close_ms,
        })
    }

    /// Full travel time from closed to open.
    #[inline]
    pub fn time_open_ms(&self) -> u64 {
        self.time_open_ms
    }

    /// Full travel time from open to closed.
    #[inline]
    pub fn time_close_ms(&self) -> u64 {
        self.time_close_ms
    }

    /// Full travel time in the given direction.
    #[inline]
    pub fn full_travel_ms(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Increasing => self.time_open_ms,
            Direction::Decreasing => self.time_close_ms,
        }
    }

    /// Plan the move from `current` to `target`.
    ///
    /// The end stops always get a full-travel run, whatever the current
    /// estimate says, so a drifted estimate is corrected against the
    /// mechanical limit. Returns `None` when `target == current` and the
    /// target is not an end stop.
    pub fn plan(&self, current: f32, target: f32) -> Option<MovePlan> {
        let current = clamp_position(current);
        let target = clamp_position(target);

        let (direction, duration_ms) = if target <= POSITION_CLOSED {
            (Direction::Decreasing, self.time_close_ms)
        } else if target >= POSITION_OPEN {
            (Direction::Increasing, self.time_open_ms)
        } else if target > current {
            (
                Direction::Increasing,
                scale_ms(target - current, self.time_open_ms),
            )
        } else if target < current {
            (
                Direction::Decreasing,
                scale_ms(current - target, self.time_close_ms),
            )
        } else {
            return None;
        };

        Some(MovePlan {
            direction,
            duration_ms,
        })
    }

    /// Position after moving for `elapsed_ms` from `from` in `direction`.
    ///
    /// Clamped to `0.0..=100.0`.
    pub fn extrapolate(&self, from: f32, direction: Direction, elapsed_ms: u64) -> f32 {
        let travelled = elapsed_ms as f64 * 100.0 / self.full_travel_ms(direction) as f64;
        let position = match direction {
            Direction::Increasing => from as f64 + travelled,
            Direction::Decreasing => from as f64 - travelled,
        };
        clamp_position(position as f32)
    }
}

/// `delta` percent of `full_ms`, rounded to the nearest millisecond.
fn scale_ms(delta: f32, full_ms: u64) -> u64 {
    let ms = delta as f64 * full_ms as f64 / 100.0;
    (ms + 0.5) as u64
}

/// Direction and duration of a planned move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePlan {
    /// Direction to drive the motor.
    pub direction: Direction,
    /// How long to drive it.
    pub duration_ms: u64,
}

/// An active move.
///
/// Exists only while the motor runs; the controller drops it the moment the
/// motion state returns to [`MotionState::Stopped`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSession {
    /// Timestamp when the motor was started (milliseconds).
    pub started_ms: u64,
    /// Direction the motor is driven in.
    pub direction: Direction,
    /// Duration the timer was armed for.
    pub planned_duration_ms: u64,
    /// Position when the move started.
    pub from: f32,
    /// Position the move ends at if it completes.
    pub target: f32,
    /// Timer generation this session was armed with.
    pub generation: u64,
}

impl MotionSession {
    /// Milliseconds since the motor was started.
    #[inline]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }

    /// Estimated position at `now_ms`.
    pub fn position_at(&self, profile: &TravelProfile, now_ms: u64) -> f32 {
        profile.extrapolate(self.from, self.direction, self.elapsed_ms(now_ms))
    }

    /// Progress information for UI feedback.
    pub fn progress(&self, profile: &TravelProfile, now_ms: u64) -> MotionProgress {
        MotionProgress {
            from: self.from,
            to: self.target,
            estimated: self.position_at(profile, now_ms),
            elapsed_ms: self.elapsed_ms(now_ms),
            planned_ms: self.planned_duration_ms,
        }
    }
}

/// Progress of the active move.
///
/// # Example
///
/// ```rust
/// use gpio_accessory::motion::MotionProgress;
///
/// let progress = MotionProgress {
///     from: 0.0,
///     to: 100.0,
///     estimated: 25.0,
///     elapsed_ms: 2_500,
///     planned_ms: 10_000,
/// };
///
/// assert_eq!(progress.percent(), 0.25);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionProgress {
    /// Position when the move started.
    pub from: f32,
    /// Position the move ends at.
    pub to: f32,
    /// Estimated position now.
    pub estimated: f32,
    /// Time since the motor started (milliseconds).
    pub elapsed_ms: u64,
    /// Planned duration (milliseconds).
    pub planned_ms: u64,
}

impl MotionProgress {
    /// Fraction of the planned duration that has elapsed (0.0 - 1.0).
    pub fn percent(&self) -> f32 {
        if self.planned_ms == 0 {
            1.0
        } else {
            (self.elapsed_ms as f32 / self.planned_ms as f32).min(1.0)
        }
    }
}

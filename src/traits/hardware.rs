//! Hardware abstraction traits for directional actuators, single outputs and
//! contact inputs.
//!
//! This module defines the hardware interfaces the accessories drive, so the
//! same controller code runs against a Raspberry Pi, any embedded-hal 1.0 pin,
//! or the mocks in [`crate::hal::mock`].
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ActuatorDriver`] | Two mutually exclusive directional motor outputs |
//! | [`DigitalOutput`] | One logical on/off output (switch, push-button) |
//! | [`ContactInput`] | One logical contact (limit switch, reed sensor) |
//! | [`Clock`] | Monotonic millisecond time source |
//!
//! # Polarity
//!
//! Every trait here speaks in *logical* terms: "active" means the relay is
//! energized or the contact is made, whatever the wiring. Translating that to
//! a pin level is the job of [`Polarity`] at the driver boundary.
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::traits::ActuatorDriver;
//! use gpio_accessory::hal::MockActuator;
//!
//! let mut actuator = MockActuator::new();
//! actuator.set_extend(true).unwrap();
//! assert!(actuator.extend);
//!
//! actuator.stop().unwrap();
//! assert!(!actuator.extend && !actuator.retract);
//! ```

/// Electrical polarity of a pin.
///
/// Relay boards are frequently active-low, so each configured pin carries an
/// inversion flag that maps onto this type.
///
/// # Default
///
/// Defaults to [`ActiveHigh`](Self::ActiveHigh).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Polarity {
    /// High level means active.
    #[default]
    ActiveHigh,
    /// Low level means active.
    ActiveLow,
}

impl Polarity {
    /// Build a polarity from an "invert high/low" configuration flag.
    ///
    /// # Examples
    ///
    /// ```
    /// use gpio_accessory::traits::Polarity;
    ///
    /// assert_eq!(Polarity::from_inverted(false), Polarity::ActiveHigh);
    /// assert_eq!(Polarity::from_inverted(true), Polarity::ActiveLow);
    /// ```
    #[inline]
    pub const fn from_inverted(inverted: bool) -> Self {
        if inverted {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }

    /// Pin level (`true` = high) that represents the given logical state.
    #[inline]
    pub const fn level(self, active: bool) -> bool {
        match self {
            Polarity::ActiveHigh => active,
            Polarity::ActiveLow => !active,
        }
    }

    /// Logical state represented by the given pin level (`true` = high).
    #[inline]
    pub const fn is_active(self, high: bool) -> bool {
        self.level(high)
    }
}

/// Directional actuator trait - abstracts a two-relay (or H-bridge) motor.
///
/// One output drives the motor towards fully open ("extend"), the other
/// towards fully closed ("retract"). Callers must never have both active at
/// once; the [`PositionController`] always releases the opposite direction
/// before energizing a new one.
///
/// # Implementation Notes
///
/// - Writes are treated as immediate and non-blocking
/// - Polarity inversion belongs in the implementation, not in callers
///
/// # Example Implementation
///
/// ```rust,ignore
/// use gpio_accessory::traits::ActuatorDriver;
///
/// struct MyRelays { /* pin handles */ }
///
/// impl ActuatorDriver for MyRelays {
///     type Error = ();
///
///     fn set_extend(&mut self, active: bool) -> Result<(), ()> {
///         // Drive the "up" relay...
///         Ok(())
///     }
///
///     fn set_retract(&mut self, active: bool) -> Result<(), ()> {
///         // Drive the "down" relay...
///         Ok(())
///     }
/// }
/// ```
///
/// [`PositionController`]: crate::PositionController
pub trait ActuatorDriver {
    /// Error type for output operations.
    type Error;

    /// Activate or release the opening (extend) output.
    fn set_extend(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Activate or release the closing (retract) output.
    fn set_retract(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Convenience method to release both outputs.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_extend(false)?;
        self.set_retract(false)
    }
}

/// A single logical output, as used by switch and push-button accessories.
pub trait DigitalOutput {
    /// Error type for output operations.
    type Error;

    /// Drive the output to the given logical state.
    fn set_active(&mut self, active: bool) -> Result<(), Self::Error>;
}

/// A single logical contact input.
///
/// `is_active` returns `true` while the contact is made (the actuator sits on
/// its limit), after polarity has been applied.
pub trait ContactInput {
    /// Error type for read operations.
    type Error;

    /// Returns whether the contact is currently made.
    fn is_active(&mut self) -> Result<bool, Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for motion timing. The tokio
/// runtime wraps `tokio::time::Instant`; tests use
/// [`MockClock`](crate::hal::MockClock).
///
/// # Example
///
/// ```rust
/// use gpio_accessory::traits::Clock;
/// use gpio_accessory::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_default_is_active_high() {
        assert_eq!(Polarity::default(), Polarity::ActiveHigh);
    }

    #[test]
    fn polarity_levels() {
        assert!(Polarity::ActiveHigh.level(true));
        assert!(!Polarity::ActiveHigh.level(false));
        assert!(!Polarity::ActiveLow.level(true));
        assert!(Polarity::ActiveLow.level(false));
    }

    #[test]
    fn polarity_reads_back_what_it_writes() {
        for polarity in [Polarity::ActiveHigh, Polarity::ActiveLow] {
            for active in [true, false] {
                assert_eq!(polarity.is_active(polarity.level(active)), active);
            }
        }
    }

    // =========================================================================
    // ActuatorDriver Default Methods Tests
    // =========================================================================

    #[derive(Default)]
    struct TestRelays {
        extend: bool,
        retract: bool,
        writes: usize,
    }

    impl ActuatorDriver for TestRelays {
        type Error = ();

        fn set_extend(&mut self, active: bool) -> Result<(), ()> {
            self.extend = active;
            self.writes += 1;
            Ok(())
        }

        fn set_retract(&mut self, active: bool) -> Result<(), ()> {
            self.retract = active;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn actuator_stop_default_impl_releases_both() {
        let mut relays = TestRelays::default();
        relays.set_extend(true).unwrap();
        relays.writes = 0;

        relays.stop().unwrap();

        assert!(!relays.extend);
        assert!(!relays.retract);
        assert_eq!(relays.writes, 2);
    }
}

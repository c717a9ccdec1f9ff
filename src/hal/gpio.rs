//! embedded-hal 1.0 pin adapters.
//!
//! These wrap any `OutputPin`/`InputPin` so the accessories run on every HAL
//! that implements embedded-hal 1.0, including rppal's `hal` feature on the
//! Raspberry Pi. Polarity is applied here and nowhere else.
//!
//! # Example
//!
//! ```rust,ignore
//! use gpio_accessory::hal::{PinActuator, PinOutput};
//! use gpio_accessory::traits::Polarity;
//!
//! let up = PinOutput::new(up_pin, Polarity::ActiveLow);
//! let down = PinOutput::new(down_pin, Polarity::ActiveLow);
//! let actuator = PinActuator::new(up, down)?;
//! ```

use embedded_hal::digital::{InputPin, OutputPin};

use crate::motion::BoundaryEdge;
use crate::traits::{ActuatorDriver, ContactInput, DigitalOutput, Polarity};

/// A single output pin with polarity.
#[derive(Debug)]
pub struct PinOutput<P: OutputPin> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> PinOutput<P> {
    /// Wrap `pin`. The pin level is not touched until the first write.
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    /// Polarity in use.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Release the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> DigitalOutput for PinOutput<P> {
    type Error = P::Error;

    fn set_active(&mut self, active: bool) -> Result<(), P::Error> {
        if self.polarity.level(active) {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

/// Two output pins driving a motor in opposite directions.
///
/// Energizing one direction always releases the other first, so the relays
/// are never both closed even if a caller forgets to.
#[derive(Debug)]
pub struct PinActuator<P: OutputPin> {
    extend: PinOutput<P>,
    retract: PinOutput<P>,
}

impl<P: OutputPin> PinActuator<P> {
    /// Build the actuator and release both outputs.
    pub fn new(extend: PinOutput<P>, retract: PinOutput<P>) -> Result<Self, P::Error> {
        let mut actuator = Self { extend, retract };
        actuator.extend.set_active(false)?;
        actuator.retract.set_active(false)?;
        Ok(actuator)
    }

    /// Release the wrapped outputs as `(extend, retract)`.
    pub fn into_inner(self) -> (PinOutput<P>, PinOutput<P>) {
        (self.extend, self.retract)
    }
}

impl<P: OutputPin> ActuatorDriver for PinActuator<P> {
    type Error = P::Error;

    fn set_extend(&mut self, active: bool) -> Result<(), P::Error> {
        if active {
            self.retract.set_active(false)?;
        }
        self.extend.set_active(active)
    }

    fn set_retract(&mut self, active: bool) -> Result<(), P::Error> {
        if active {
            self.extend.set_active(false)?;
        }
        self.retract.set_active(active)
    }
}

/// A limit contact reporting one [`BoundaryEdge`].
///
/// [`poll`](Self::poll) turns levels into edges: it yields the edge once per
/// open-to-made transition. The first poll counts the contact as previously
/// open, so a cover already sitting on its limit at boot is reported.
#[derive(Debug)]
pub struct ContactSensor<P: InputPin> {
    pin: P,
    polarity: Polarity,
    edge: BoundaryEdge,
    was_active: bool,
}

impl<P: InputPin> ContactSensor<P> {
    /// Wrap `pin` as the sensor for `edge`.
    pub fn new(pin: P, polarity: Polarity, edge: BoundaryEdge) -> Self {
        Self {
            pin,
            polarity,
            edge,
            was_active: false,
        }
    }

    /// The limit this contact reports.
    pub fn edge(&self) -> BoundaryEdge {
        self.edge
    }

    /// Sample the contact; `Some(edge)` when it has just been made.
    pub fn poll(&mut self) -> Result<Option<BoundaryEdge>, P::Error> {
        let active = self.is_active()?;
        let rising = active && !self.was_active;
        self.was_active = active;
        Ok(rising.then_some(self.edge))
    }

    /// Release the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> ContactInput for ContactSensor<P> {
    type Error = P::Error;

    fn is_active(&mut self) -> Result<bool, P::Error> {
        let high = self.pin.is_high()?;
        Ok(self.polarity.is_active(high))
    }
}

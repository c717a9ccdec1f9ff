//! Raspberry Pi GPIO backend built on rppal.
//!
//! Outputs use rppal's embedded-hal implementation through [`PinOutput`] and
//! [`PinActuator`]. Contacts use rppal's interrupt thread and forward each
//! made contact into the accessory's event loop as a [`BoundaryEdge`].

use core::convert::Infallible;
use std::time::Duration;

use rppal::gpio::{Event, Gpio, InputPin, OutputPin, Trigger};
use tracing::{debug, info};

use crate::error::Result;
use crate::hal::gpio::{PinActuator, PinOutput};
use crate::motion::BoundaryEdge;
use crate::services::runtime::CoverHandle;
use crate::traits::Polarity;

/// Actuator driven by two Raspberry Pi pins.
pub type RpiActuator = PinActuator<OutputPin>;

/// Single Raspberry Pi output.
pub type RpiOutput = PinOutput<OutputPin>;

/// Default contact debounce.
pub const CONTACT_DEBOUNCE: Duration = Duration::from_millis(20);

/// Claim `pin` as an output, initially inactive.
pub fn open_output(gpio: &Gpio, pin: u8, polarity: Polarity) -> Result<RpiOutput> {
    let pin = gpio.get(pin)?;
    // Start at the inactive level so an active-low relay never clicks at boot
    let pin = if polarity.level(false) {
        pin.into_output_high()
    } else {
        pin.into_output_low()
    };
    Ok(PinOutput::new(pin, polarity))
}

/// Claim the extend and retract pins of a motor.
pub fn open_actuator(
    gpio: &Gpio,
    extend: (u8, Polarity),
    retract: (u8, Polarity),
) -> Result<RpiActuator> {
    let extend = open_output(gpio, extend.0, extend.1)?;
    let retract = open_output(gpio, retract.0, retract.1)?;
    let actuator = PinActuator::new(extend, retract).unwrap_or_else(|never: Infallible| match never {});
    Ok(actuator)
}

/// Watch a limit contact and forward it to `handle` each time it is made.
///
/// The returned pin owns the interrupt; dropping it stops the watch. If the
/// contact is already made, the edge is sent immediately.
pub fn watch_contact(
    gpio: &Gpio,
    pin: u8,
    polarity: Polarity,
    edge: BoundaryEdge,
    handle: CoverHandle,
) -> Result<InputPin> {
    let mut input = match polarity {
        Polarity::ActiveHigh => gpio.get(pin)?.into_input_pulldown(),
        Polarity::ActiveLow => gpio.get(pin)?.into_input_pullup(),
    };

    let made = match polarity {
        Polarity::ActiveHigh => Trigger::RisingEdge,
        Polarity::ActiveLow => Trigger::FallingEdge,
    };

    if polarity.is_active(input.is_high()) {
        debug!("GPIO{} contact made at startup", pin);
        handle.boundary_edge(edge)?;
    }

    input.set_async_interrupt(Trigger::Both, Some(CONTACT_DEBOUNCE), move |event: Event| {
        if event.trigger == made {
            debug!("GPIO{} contact made", pin);
            if handle.boundary_edge(edge).is_err() {
                debug!("GPIO{} edge dropped, runtime closed", pin);
            }
        }
    })?;

    info!("adding {:?} contact sensor on GPIO{}", edge, pin);
    Ok(input)
}

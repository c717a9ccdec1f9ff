//! Accessory lifecycle and identification.
//!
//! Each concrete accessory ([`PositionController`], [`GpioSwitch`],
//! [`PushButton`]) implements [`AccessoryLifecycle`]. The event loop in
//! `services::runtime` is generic over that trait, so the accessories compose
//! with it without a shared base type or dynamic dispatch.
//!
//! [`PositionController`]: crate::PositionController
//! [`GpioSwitch`]: crate::GpioSwitch
//! [`PushButton`]: crate::PushButton

use core::fmt::Write;

use crate::config::{short_string, ShortString};
use crate::error::ConfigError;

/// Manufacturer reported in the accessory information.
pub const MANUFACTURER: &str = "gpio-accessory";

/// Firmware revision reported in the accessory information.
pub const FIRMWARE_REVISION: &str = env!("CARGO_PKG_VERSION");

/// The service an accessory exposes to the host platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ServiceKind {
    /// Motorized door.
    Door,
    /// Motorized window.
    Window,
    /// Blind, shade or shutter.
    #[default]
    WindowCovering,
    /// Plain on/off output.
    Switch,
    /// Momentary output released after a timeout.
    PushButton,
}

impl ServiceKind {
    /// Host identifier of the service.
    ///
    /// # Examples
    ///
    /// ```
    /// use gpio_accessory::ServiceKind;
    ///
    /// assert_eq!(ServiceKind::Door.identifier(), "GPIO-Door-Service");
    /// assert_eq!(
    ///     ServiceKind::from_identifier("GPIO-WindowCovering-Service"),
    ///     Some(ServiceKind::WindowCovering)
    /// );
    /// ```
    pub const fn identifier(&self) -> &'static str {
        match self {
            ServiceKind::Door => "GPIO-Door-Service",
            ServiceKind::Window => "GPIO-Window-Service",
            ServiceKind::WindowCovering => "GPIO-WindowCovering-Service",
            ServiceKind::Switch => "GPIO-Switch-Service",
            ServiceKind::PushButton => "GPIO-PushButton-Service",
        }
    }

    /// Parse a host identifier.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        [
            ServiceKind::Door,
            ServiceKind::Window,
            ServiceKind::WindowCovering,
            ServiceKind::Switch,
            ServiceKind::PushButton,
        ]
        .into_iter()
        .find(|kind| kind.identifier() == identifier)
    }

    /// Lowercase name used in config and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Door => "door",
            ServiceKind::Window => "window",
            ServiceKind::WindowCovering => "window_covering",
            ServiceKind::Switch => "switch",
            ServiceKind::PushButton => "push_button",
        }
    }

    /// True for door, window and window covering.
    pub const fn is_positional(&self) -> bool {
        matches!(
            self,
            ServiceKind::Door | ServiceKind::Window | ServiceKind::WindowCovering
        )
    }
}

impl core::str::FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "door" => ServiceKind::Door,
            "window" => ServiceKind::Window,
            "window_covering" | "windowcovering" => ServiceKind::WindowCovering,
            "switch" => ServiceKind::Switch,
            "push_button" | "pushbutton" => ServiceKind::PushButton,
            _ => {
                return ServiceKind::from_identifier(s.trim())
                    .ok_or_else(|| ConfigError::UnknownService(s.into()))
            }
        };
        Ok(kind)
    }
}

/// Accessory information service contents.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessoryInformation {
    /// Display name.
    pub name: ShortString,
    /// Manufacturer.
    pub manufacturer: ShortString,
    /// Model; the service identifier.
    pub model: ShortString,
    /// Serial number, `GPIO<pin>` of the primary output.
    pub serial_number: ShortString,
    /// Firmware revision; the crate version.
    pub firmware_revision: ShortString,
}

impl AccessoryInformation {
    /// Information for an accessory named `name` driving `pin`.
    pub fn new(name: &str, kind: ServiceKind, pin: Option<u8>) -> Self {
        let mut serial_number = ShortString::new();
        if let Some(pin) = pin {
            let _ = write!(serial_number, "GPIO{pin}");
        }
        Self {
            name: short_string(name),
            manufacturer: short_string(MANUFACTURER),
            model: short_string(kind.identifier()),
            serial_number,
            firmware_revision: short_string(FIRMWARE_REVISION),
        }
    }
}

impl Default for AccessoryInformation {
    fn default() -> Self {
        Self::new("accessory", ServiceKind::default(), None)
    }
}

/// Lifecycle shared by every accessory.
///
/// `start` publishes the initial state, `handle` processes one event, and
/// `shutdown` leaves the hardware safe before the process exits. Callers run
/// all three from a single event loop.
pub trait AccessoryLifecycle {
    /// Events the accessory reacts to.
    type Event;
    /// Error raised by the accessory's hardware.
    type Error;

    /// Accessory information service contents.
    fn information(&self) -> &AccessoryInformation;

    /// Drive outputs to their initial state and publish initial values.
    fn start(&mut self, now_ms: u64) -> Result<(), Self::Error>;

    /// Process one event.
    fn handle(&mut self, event: Self::Event, now_ms: u64) -> Result<(), Self::Error>;

    /// Stop whatever is in progress.
    fn shutdown(&mut self, now_ms: u64) -> Result<(), Self::Error>;
}

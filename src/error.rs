//! Error types.

use thiserror::Error;

/// Result alias using the crate [`enum@Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// An Error that can occur in this crate
#[derive(Error, Debug)]
pub enum Error {
    /// An inbound target position was outside `0..=100`.
    #[error("position {0} is outside 0..=100")]
    PositionOutOfRange(i64),

    /// The accessory event loop is no longer running.
    #[error("accessory runtime has shut down")]
    RuntimeClosed,

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Raspberry Pi GPIO failure.
    #[cfg(feature = "rpi")]
    #[error("{0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A full-travel duration is missing or zero.
    #[error("travel time `{0}` must be configured and non-zero")]
    MissingTravelTime(&'static str),

    /// A required pin is not configured.
    #[error("`{field}` must be configured for a {kind} accessory")]
    MissingPin {
        /// Config field name.
        field: &'static str,
        /// Accessory kind.
        kind: &'static str,
    },

    /// Two roles share one pin.
    #[error("GPIO{pin} is assigned to both `{first}` and `{second}`")]
    DuplicatePin {
        /// BCM pin number.
        pin: u8,
        /// First role using the pin.
        first: &'static str,
        /// Second role using the pin.
        second: &'static str,
    },

    /// The accessory kind is not one this crate provides.
    #[error("unknown accessory identifier `{0}`")]
    UnknownService(alloc::string::String),

    /// TOML parse failure.
    #[cfg(feature = "runtime")]
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),

    /// File I/O failure.
    #[cfg(feature = "runtime")]
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
}

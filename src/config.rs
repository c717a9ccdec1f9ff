//! Accessory and daemon configuration.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. With the `runtime` feature the
//! whole daemon configuration loads from a TOML file, with environment
//! variables taking precedence over file values.
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::config::AccessoryConfig;
//! use gpio_accessory::ServiceKind;
//!
//! let config = AccessoryConfig::default()
//!     .with_name("Office Blind")
//!     .with_kind(ServiceKind::WindowCovering)
//!     .with_pins(17, 27)
//!     .with_travel_times(21_000, 19_000);
//!
//! config.validate().unwrap();
//! assert_eq!(config.travel_profile().unwrap().time_close_ms(), 19_000);
//! ```

use heapless::String as HString;

use crate::accessory::{AccessoryInformation, ServiceKind};
use crate::error::ConfigError;
use crate::motion::TravelProfile;
use crate::switch::DEFAULT_INVOKE_TIMEOUT_MS;
use crate::traits::Polarity;

/// Maximum length for short config strings (names, hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topics)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(truncate(s, MAX_SHORT_STRING));
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(truncate(s, MAX_LONG_STRING));
    hs
}

/// Longest prefix of `s` that fits `max` bytes on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}

// ============================================================================
// Accessory Config
// ============================================================================

/// One accessory: its kind, pins, polarity flags and timings.
///
/// Pins are BCM numbers. `pin` is the primary output (the switch output, or
/// the opening relay of a motor); `pin_close` is the closing relay.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AccessoryConfig {
    /// Display name
    pub name: ShortString,
    /// Service the accessory exposes
    pub kind: ServiceKind,
    /// Primary output pin
    pub pin: Option<u8>,
    /// Primary output is active-low
    pub invert_high_low: bool,
    /// Closing relay pin (motorized kinds)
    pub pin_close: Option<u8>,
    /// Closing relay is active-low
    pub invert_high_low_close: bool,
    /// Fully-open limit contact
    pub pin_contact_open: Option<u8>,
    /// Open contact is active-low
    pub invert_high_low_contact_open: bool,
    /// Fully-closed limit contact
    pub pin_contact_close: Option<u8>,
    /// Close contact is active-low
    pub invert_high_low_contact_close: bool,
    /// Full travel time, closed to open (milliseconds)
    pub time_open_ms: Option<u64>,
    /// Full travel time, open to closed (milliseconds)
    pub time_close_ms: Option<u64>,
    /// Push-button release delay (milliseconds)
    pub invoke_timeout_ms: u64,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: short_string("accessory"),
            kind: ServiceKind::default(),
            pin: None,
            invert_high_low: false,
            pin_close: None,
            invert_high_low_close: false,
            pin_contact_open: None,
            invert_high_low_contact_open: false,
            pin_contact_close: None,
            invert_high_low_contact_close: false,
            time_open_ms: None,
            time_close_ms: None,
            invoke_timeout_ms: DEFAULT_INVOKE_TIMEOUT_MS,
        }
    }
}

impl AccessoryConfig {
    /// Set the display name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the service kind
    pub fn with_kind(mut self, kind: ServiceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the single output pin of a switch or push-button
    pub fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Set the opening and closing relay pins
    pub fn with_pins(mut self, open: u8, close: u8) -> Self {
        self.pin = Some(open);
        self.pin_close = Some(close);
        self
    }

    /// Set the inversion flags of the output pins
    pub fn with_inverted_outputs(mut self, open: bool, close: bool) -> Self {
        self.invert_high_low = open;
        self.invert_high_low_close = close;
        self
    }

    /// Set the limit contact pins
    pub fn with_contacts(mut self, open: Option<u8>, close: Option<u8>) -> Self {
        self.pin_contact_open = open;
        self.pin_contact_close = close;
        self
    }

    /// Set the full travel times
    pub fn with_travel_times(mut self, open_ms: u64, close_ms: u64) -> Self {
        self.time_open_ms = Some(open_ms);
        self.time_close_ms = Some(close_ms);
        self
    }

    /// Set the push-button release delay
    pub fn with_invoke_timeout_ms(mut self, ms: u64) -> Self {
        self.invoke_timeout_ms = ms;
        self
    }

    /// Check the configuration can build its accessory.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingPin`] if a required output is absent
    /// - [`ConfigError::MissingTravelTime`] if a motorized kind lacks a
    ///   non-zero travel time
    /// - [`ConfigError::DuplicatePin`] if two roles share a pin
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kind = self.kind.as_str();
        if self.pin.is_none() {
            return Err(ConfigError::MissingPin { field: "pin", kind });
        }

        if !self.kind.is_positional() {
            return Ok(());
        }

        if self.pin_close.is_none() {
            return Err(ConfigError::MissingPin {
                field: "pin_close",
                kind,
            });
        }
        self.travel_profile()?;

        let roles = [
            ("pin", self.pin),
            ("pin_close", self.pin_close),
            ("pin_contact_open", self.pin_contact_open),
            ("pin_contact_close", self.pin_contact_close),
        ];
        for (i, (first, a)) in roles.iter().enumerate() {
            for (second, b) in &roles[i + 1..] {
                if let (Some(a), Some(b)) = (a, b) {
                    if a == b {
                        return Err(ConfigError::DuplicatePin {
                            pin: *a,
                            first: *first,
                            second: *second,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Travel profile from the configured times.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTravelTime`] if a time is absent or zero.
    pub fn travel_profile(&self) -> Result<TravelProfile, ConfigError> {
        TravelProfile::new(
            self.time_open_ms.unwrap_or(0),
            self.time_close_ms.unwrap_or(0),
        )
    }

    /// Accessory information derived from name, kind and primary pin.
    pub fn information(&self) -> AccessoryInformation {
        AccessoryInformation::new(self.name.as_str(), self.kind, self.pin)
    }

    /// Polarity of the primary output.
    pub fn polarity(&self) -> Polarity {
        Polarity::from_inverted(self.invert_high_low)
    }

    /// Polarity of the closing relay.
    pub fn polarity_close(&self) -> Polarity {
        Polarity::from_inverted(self.invert_high_low_close)
    }

    /// Polarity of the open contact.
    pub fn polarity_contact_open(&self) -> Polarity {
        Polarity::from_inverted(self.invert_high_low_contact_open)
    }

    /// Polarity of the close contact.
    pub fn polarity_contact_close(&self) -> Polarity {
        Polarity::from_inverted(self.invert_high_low_contact_close)
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic prefix for all pub/sub (e.g., "blind" -> "blind/state")
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Whether MQTT is enabled
    pub enabled: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: 1883,
            client_id: short_string("gpio-accessory"),
            topic_prefix: short_string("accessory"),
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 30,
            enabled: false,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Build a topic string with the configured prefix
    pub fn topic(&self, suffix: &str) -> LongString {
        long_string(&alloc::format!("{}/{}", self.topic_prefix, suffix))
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WebConfig {
    /// Address to bind to
    pub host: ShortString,
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: short_string("0.0.0.0"),
            port: 8080,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the bind address
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// `host:port` bind address
    pub fn bind_addr(&self) -> alloc::string::String {
        alloc::format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Daemon Config
// ============================================================================

#[cfg(feature = "runtime")]
pub use daemon::{DaemonConfig, LoggingConfig, CONFIG_ENV, DEFAULT_CONFIG_PATH};

#[cfg(feature = "runtime")]
mod daemon {
    use serde::{Deserialize, Serialize};

    use super::{short_string, AccessoryConfig, MqttConfig, WebConfig};
    use crate::error::ConfigError;

    /// Config file read when [`CONFIG_ENV`] is unset.
    pub const DEFAULT_CONFIG_PATH: &str = "gpio-accessory.toml";

    /// Environment variable naming the config file.
    pub const CONFIG_ENV: &str = "GPIO_ACCESSORY_CONFIG";

    /// Complete daemon configuration.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct DaemonConfig {
        /// The accessory this process drives.
        pub accessory: AccessoryConfig,
        /// HTTP API settings.
        pub web: WebConfig,
        /// MQTT bridge settings.
        pub mqtt: MqttConfig,
        /// Logging settings.
        pub logging: LoggingConfig,
    }

    /// Logging configuration.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LoggingConfig {
        /// Filter directive (`RUST_LOG` syntax).
        pub filter: String,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                filter: "gpio_accessory=info,gpio_accessoryd=info,tower_http=info".to_string(),
            }
        }
    }

    impl DaemonConfig {
        /// Load from the file named by `GPIO_ACCESSORY_CONFIG` (or
        /// `gpio-accessory.toml`), apply environment overrides, validate.
        ///
        /// # Errors
        ///
        /// Returns an error if the file exists but cannot be read or parsed,
        /// or if the result fails validation.
        pub fn load() -> Result<Self, ConfigError> {
            let path =
                std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
            let mut config = Self::from_file(&path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }

        /// Parse a TOML document.
        pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
            Ok(toml::from_str(content)?)
        }

        /// Read `path`; a missing file yields the defaults.
        pub fn from_file(path: &str) -> Result<Self, ConfigError> {
            match std::fs::read_to_string(path) {
                Ok(content) => Self::from_toml(&content),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
                Err(err) => Err(ConfigError::Io(err)),
            }
        }

        fn apply_env_overrides(&mut self) {
            if let Ok(val) = std::env::var("GPIO_ACCESSORY_PORT") {
                if let Ok(port) = val.parse() {
                    self.web.port = port;
                }
            }
            if let Ok(val) = std::env::var("GPIO_ACCESSORY_MQTT_HOST") {
                self.mqtt.host = short_string(&val);
                self.mqtt.enabled = true;
            }
            if let Ok(val) = std::env::var("GPIO_ACCESSORY_LOG") {
                self.logging.filter = val;
            }
            if let Ok(val) = std::env::var("RUST_LOG") {
                self.logging.filter = val;
            }
        }

        /// Validate the accessory section.
        pub fn validate(&self) -> Result<(), ConfigError> {
            self.accessory.validate()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

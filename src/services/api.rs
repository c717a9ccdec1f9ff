//! API request and response types shared by the HTTP and MQTT bridges.
//!
//! Request payloads are parsed here once, for both transports. Each accepts
//! a JSON object or a bare value:
//!
//! | Request | JSON | Bare |
//! |---------|------|------|
//! | target  | `{"position": 40}` | `40` |
//! | hold    | `{"hold": true}` | `true`, `on`, `1` |
//! | on      | `{"on": false}` | `false`, `off`, `0` |

use serde::{Deserialize, Serialize};

use crate::commands::TargetPosition;

// ============================================================================
// Request Types
// ============================================================================

/// Set the target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTargetRequest {
    /// Requested position; validated against `0..=100`.
    pub position: i64,
}

/// Set or clear the hold flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetHoldRequest {
    /// Hold flag.
    pub hold: bool,
}

/// Switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOnRequest {
    /// On characteristic.
    pub on: bool,
}

/// A request payload that could not be turned into a command.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The payload is not text.
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    /// The payload has the wrong shape.
    #[error("malformed payload, expected {0}")]
    Malformed(&'static str),
    /// The value was understood but refused.
    #[error(transparent)]
    Rejected(#[from] crate::Error),
}

fn payload_text(payload: &[u8]) -> Result<&str, PayloadError> {
    core::str::from_utf8(payload)
        .map(str::trim)
        .map_err(|_| PayloadError::NotUtf8)
}

/// Parse a target position request.
///
/// # Examples
///
/// ```
/// use gpio_accessory::services::parse_target_payload;
///
/// assert_eq!(parse_target_payload(b"40").unwrap().get(), 40);
/// assert_eq!(parse_target_payload(br#"{"position": 100}"#).unwrap().get(), 100);
/// assert!(parse_target_payload(b"101").is_err());
/// ```
pub fn parse_target_payload(payload: &[u8]) -> Result<TargetPosition, PayloadError> {
    let text = payload_text(payload)?;
    let position = match text.parse::<i64>() {
        Ok(position) => position,
        Err(_) => {
            serde_json::from_str::<SetTargetRequest>(text)
                .map_err(|_| PayloadError::Malformed(r#"{"position": 0..=100}"#))?
                .position
        }
    };
    Ok(TargetPosition::new(position)?)
}

/// Parse a boolean request whose JSON form is `{"<key>": bool}`.
pub fn parse_flag_payload(payload: &[u8], key: &'static str) -> Result<bool, PayloadError> {
    let text = payload_text(payload)?;
    match text.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => return Ok(true),
        "false" | "off" | "0" => return Ok(false),
        _ => {}
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| value.get(key).and_then(serde_json::Value::as_bool))
        .ok_or(PayloadError::Malformed("a boolean"))
}

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Command result response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the command was queued
    pub accepted: bool,
    /// Result details
    pub result: String,
}

impl CommandResponse {
    /// Create a response for a queued command
    pub fn accepted(result: impl Into<String>) -> Self {
        Self {
            accepted: true,
            result: result.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_payload_forms() {
        assert_eq!(parse_target_payload(b" 0 ").unwrap().get(), 0);
        assert_eq!(
            parse_target_payload(br#"{"position": 55}"#).unwrap().get(),
            55
        );
    }

    #[test]
    fn target_payload_out_of_range_is_rejected() {
        assert!(matches!(
            parse_target_payload(b"150"),
            Err(PayloadError::Rejected(crate::Error::PositionOutOfRange(150)))
        ));
        assert!(matches!(
            parse_target_payload(br#"{"position": -3}"#),
            Err(PayloadError::Rejected(crate::Error::PositionOutOfRange(-3)))
        ));
    }

    #[test]
    fn target_payload_malformed() {
        assert!(matches!(
            parse_target_payload(b"open please"),
            Err(PayloadError::Malformed(_))
        ));
        assert!(matches!(
            parse_target_payload(&[0xff, 0xfe]),
            Err(PayloadError::NotUtf8)
        ));
    }

    #[test]
    fn flag_payload_forms() {
        assert!(parse_flag_payload(b"true", "hold").unwrap());
        assert!(parse_flag_payload(b"ON", "on").unwrap());
        assert!(!parse_flag_payload(b"0", "on").unwrap());
        assert!(parse_flag_payload(br#"{"hold": true}"#, "hold").unwrap());
        assert!(!parse_flag_payload(br#"{"on": false}"#, "on").unwrap());
    }

    #[test]
    fn flag_payload_wrong_key_is_malformed() {
        assert!(matches!(
            parse_flag_payload(br#"{"on": true}"#, "hold"),
            Err(PayloadError::Malformed(_))
        ));
        assert!(parse_flag_payload(b"maybe", "hold").is_err());
    }

    #[test]
    fn api_response_serde() {
        let json = serde_json::to_string(&ApiResponse::ok(CommandResponse::accepted("queued")))
            .unwrap();
        assert_eq!(json, r#"{"success":true,"data":{"accepted":true,"result":"queued"}}"#);

        let json = serde_json::to_string(&ApiResponse::<()>::err("nope")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"nope"}"#);
    }
}

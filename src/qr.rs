//! Classification of scanned QR payloads.
//!
//! Customer codes come in three encodings, tried in this order:
//!
//! 1. `grabbitt://<customer id>`
//! 2. a JSON object carrying `customer_id` and/or `qr_id`
//! 3. an opaque token longer than 10 and shorter than 50 characters
//!
//! The order matters: a short JSON object or a prefixed code also satisfies
//! the opaque length rule.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::CustomerId;

/// Scheme marker of customer codes.
pub const CUSTOMER_PREFIX: &str = "grabbitt://";

/// Scheme marker of redemption codes.
pub const REDEMPTION_PREFIX: &str = "grabbitt-redeem://";

/// Exclusive length bounds of opaque identifiers, in characters.
const OPAQUE_MIN_EXCLUSIVE: usize = 10;
const OPAQUE_MAX_EXCLUSIVE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    #[error("QR code is empty")]
    Empty,
    #[error("could not parse QR code")]
    Unrecognized,
}

/// A recognized customer QR payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QrPayload {
    /// `grabbitt://` prefix; the remainder is taken verbatim.
    #[serde(rename = "grabbitt")]
    Prefixed { customer_id: CustomerId },
    /// JSON object, retained whole.
    Structured {
        #[serde(skip_serializing_if = "Option::is_none")]
        customer_id: Option<CustomerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        qr_id: Option<String>,
        raw: Value,
    },
    /// Bare identifier with no further interpretation.
    Opaque { value: String },
}

impl QrPayload {
    /// Customer identifier hint to forward with the validation request.
    /// A bare `grabbitt://` carries no hint.
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            QrPayload::Prefixed { customer_id } if customer_id.is_empty() => None,
            QrPayload::Prefixed { customer_id } => Some(customer_id),
            QrPayload::Structured { customer_id, .. } => customer_id.as_deref(),
            QrPayload::Opaque { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QrPayload::Prefixed { .. } => "grabbitt",
            QrPayload::Structured { .. } => "structured",
            QrPayload::Opaque { .. } => "opaque",
        }
    }
}

/// Classify a raw customer QR payload.
pub fn parse_customer_qr(raw: &str) -> Result<QrPayload, QrError> {
    if raw.is_empty() {
        return Err(QrError::Empty);
    }

    if let Some(rest) = raw.strip_prefix(CUSTOMER_PREFIX) {
        return Ok(QrPayload::Prefixed {
            customer_id: rest.to_string(),
        });
    }

    if let Some(object) = parse_object(raw) {
        let customer_id = string_field(&object, "customer_id");
        let qr_id = string_field(&object, "qr_id");
        if customer_id.is_some() || qr_id.is_some() {
            return Ok(QrPayload::Structured {
                customer_id,
                qr_id,
                raw: Value::Object(object),
            });
        }
    }

    let len = raw.chars().count();
    if len > OPAQUE_MIN_EXCLUSIVE && len < OPAQUE_MAX_EXCLUSIVE {
        return Ok(QrPayload::Opaque {
            value: raw.to_string(),
        });
    }

    Err(QrError::Unrecognized)
}

/// Extract the redemption id from a redemption QR payload.
///
/// Accepts `grabbitt-redeem://<id>`, a JSON object with `redemption_id`, or a
/// bare token without whitespace.
pub fn parse_redemption_qr(raw: &str) -> Result<String, QrError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QrError::Empty);
    }

    if let Some(rest) = trimmed.strip_prefix(REDEMPTION_PREFIX) {
        return non_empty(rest);
    }

    if let Some(object) = parse_object(trimmed) {
        return string_field(&object, "redemption_id").ok_or(QrError::Unrecognized);
    }

    if trimmed.contains(char::is_whitespace) || trimmed.starts_with(CUSTOMER_PREFIX) {
        return Err(QrError::Unrecognized);
    }
    Ok(trimmed.to_string())
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Identifier fields may be strings or numbers; anything else is ignored.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(id: &str) -> Result<String, QrError> {
    if id.is_empty() {
        Err(QrError::Unrecognized)
    } else {
        Ok(id.to_string())
    }
}

//! Immutable values flowing through topics.
//!
//! A `Message` carries the same value in three views: raw bytes, text and a
//! numeric interpretation. All constructors normalize to the text form and
//! derive the other views from it, so the numeric view is always exactly the
//! parse of the text view. Text that is not a floating-point literal yields
//! `NaN` rather than an error. The only named values accepted are `Infinity`
//! and `NaN` (optionally signed, case-sensitive); spellings such as `inf` or
//! `nan` are treated as non-numeric text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A value published to a topic
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// UTF-8 bytes of the text form
    data: Vec<u8>,
    /// Text form of the value
    text: String,
    /// Numeric form, `NaN` when the text is not numeric
    number: f64,
    /// Timestamp when message was created
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message from text
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            data: text.as_bytes().to_vec(),
            number: parse_number(&text),
            text,
            created_at: Utc::now(),
        }
    }

    /// Create a message from raw bytes, decoded as UTF-8 (lossy)
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Create a message from a number
    ///
    /// The number is formatted to text first, so `from_number(7.0)` has the
    /// text `"7"` and `from_number(2.5)` the text `"2.5"`. Infinities are
    /// written `Infinity` / `-Infinity`.
    pub fn from_number(value: f64) -> Self {
        let text = if value.is_infinite() {
            let sign = if value.is_sign_negative() { "-" } else { "" };
            format!("{sign}Infinity")
        } else {
            value.to_string()
        };
        Self::from_text(text)
    }

    /// Text view
    pub fn as_text(&self) -> &str {
        &self.text
    }

    /// Byte view
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Numeric view (`NaN` if the text is not numeric)
    pub fn as_number(&self) -> f64 {
        self.number
    }

    /// Whether the text parsed as a number
    pub fn is_numeric(&self) -> bool {
        !self.number.is_nan()
    }

    /// Creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let named = unsigned.starts_with(|c: char| c.is_ascii_alphabetic());
    if named && unsigned != "Infinity" && unsigned != "NaN" {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl From<f64> for Message {
    fn from(value: f64) -> Self {
        Self::from_number(value)
    }
}

impl From<&[u8]> for Message {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

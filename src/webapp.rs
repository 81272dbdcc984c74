//! Payloads posted back by the Telegram mini-app.

use serde::Deserialize;

/// What the mini-app asked for.
///
/// Decoded strictly: a payload whose tag is neither `text` nor `lookup`,
/// or whose `text` field is missing or not a string, is rejected.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Text { text: String },
    Lookup { text: String },
}

#[derive(Debug)]
pub enum ParseError {
    /// Not JSON at all.
    Json(serde_json::Error),
    /// Valid JSON, but not a payload we know.
    Unsupported,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Json(e) => write!(f, "malformed web-app payload: {e}"),
            ParseError::Unsupported => write!(f, "unsupported web-app payload"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Json(e) => Some(e),
            ParseError::Unsupported => None,
        }
    }
}

pub fn parse(raw: &str) -> Result<Payload, ParseError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ParseError::Json)?;
    serde_json::from_value(value).map_err(|_| ParseError::Unsupported)
}

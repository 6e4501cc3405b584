//! Response sanitizer: locates and parses the JSON payload inside noisy generator output.
//!
//! Nothing here fails: every entry point returns either the parsed value or a
//! caller-supplied fallback tagged with the reason it was used.

pub mod feedback;
pub mod questions;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+-]*[ \t]*").expect("static regex"));

/// Why a fallback value was returned instead of parsed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No `{ ... }` span in the response.
    NoJsonObject,
    /// The span did not parse as JSON.
    Malformed(String),
    /// Parsed, but required fields were missing or had the wrong shape.
    InvalidShape(String),
    /// The generator call itself failed.
    Generation(String),
}

/// Parsed value, or the fallback and the reason it was used.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
    Parsed(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Extracted<T> {
    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Extracted::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Extracted::Parsed(v) | Extracted::Fallback { value: v, .. } => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Extracted::Parsed(v) | Extracted::Fallback { value: v, .. } => v,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Extracted::Parsed(_) => None,
            Extracted::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Extracted::Parsed(_))
    }
}

/// Removes Markdown code fences, with or without a language tag.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// Slice from the first `{` to the last `}`, inclusive.
pub fn isolate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strip fences, isolate the object span and strictly parse it.
pub fn parse_json_object(raw: &str) -> Result<Value, FallbackReason> {
    let cleaned = strip_code_fences(raw.trim());
    let candidate = isolate_json_object(&cleaned).ok_or(FallbackReason::NoJsonObject)?;
    serde_json::from_str(candidate).map_err(|e| FallbackReason::Malformed(e.to_string()))
}

/// Generic extraction: the parsed payload, or `fallback` unmodified.
pub fn extract_payload<T: DeserializeOwned>(raw: &str, fallback: T) -> Extracted<T> {
    let value = match parse_json_object(raw) {
        Ok(v) => v,
        Err(reason) => {
            warn!("Generator output not parseable ({:?}); using fallback", reason);
            return Extracted::fallback(fallback, reason);
        }
    };

    match serde_json::from_value(value) {
        Ok(parsed) => {
            debug!("Generator output parsed ({} chars)", raw.len());
            Extracted::Parsed(parsed)
        }
        Err(e) => {
            warn!("Generator output has unexpected shape: {e}");
            Extracted::fallback(fallback, FallbackReason::InvalidShape(e.to_string()))
        }
    }
}

/// Clamps any score into [0, 100].
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

/// Reads a JSON number (integer or float, rounded) as a clamped score.
pub fn score_from_json(value: &Value) -> Option<u8> {
    if let Some(i) = value.as_i64() {
        return Some(clamp_score(i));
    }
    if let Some(u) = value.as_u64() {
        return Some(clamp_score(i64::try_from(u).unwrap_or(i64::MAX)));
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| clamp_score(f.round() as i64))
}

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;

/// Wire format of a talk's `start` field: `YYYY-MM-DD HH:MM:SS.mmmZ`, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

/// Format used when a talk window is shown to a person.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// A talk ending exactly when another begins does not overlap it.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    German,
}

/// Fields of a talk as submitted to a create or update request.
///
/// Every field defaults when absent so that a half-filled request reaches the
/// overlap guard's skip policy instead of failing to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Wire-format timestamp, see [`TIMESTAMP_FORMAT`].
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub duration_minutes: f64,
    /// Room identifier. Talks only ever conflict within one room.
    #[serde(default)]
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl TalkInput {
    /// True once start, duration and room are all filled in.
    pub fn is_scheduled(&self) -> bool {
        !self.start.is_empty() && self.duration_minutes != 0.0 && !self.room.is_empty()
    }
}

/// A persisted talk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talk {
    pub id: Ulid,
    #[serde(flatten)]
    pub fields: TalkInput,
}

impl Talk {
    pub fn new(id: Ulid, fields: TalkInput) -> Self {
        Self { id, fields }
    }
}

/// Byte layout of [`TIMESTAMP_FORMAT`]; `9` marks an ASCII digit.
const TIMESTAMP_LAYOUT: &[u8; 24] = b"9999-99-99 99:99:99.999Z";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Not exactly `YYYY-MM-DD HH:MM:SS.mmmZ`: wrong length, missing padding,
    /// missing milliseconds or a wrong separator.
    Layout,
    /// Right shape, but not a real date or time of day.
    OutOfRange(chrono::ParseError),
    LeapSecond,
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampError::Layout => write!(f, "expected YYYY-MM-DD HH:MM:SS.mmmZ"),
            TimestampError::OutOfRange(e) => write!(f, "{e}"),
            TimestampError::LeapSecond => write!(f, "second out of range"),
        }
    }
}

impl std::error::Error for TimestampError {}

fn matches_layout(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == TIMESTAMP_LAYOUT.len()
        && bytes.iter().zip(TIMESTAMP_LAYOUT).all(|(b, l)| match l {
            b'9' => b.is_ascii_digit(),
            _ => b == l,
        })
}

/// Parse a wire-format timestamp. Anything other than exactly
/// `YYYY-MM-DD HH:MM:SS.mmmZ` is rejected, including leap seconds.
pub fn parse_timestamp(s: &str) -> Result<Ms, TimestampError> {
    if !matches_layout(s) {
        return Err(TimestampError::Layout);
    }
    let naive =
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(TimestampError::OutOfRange)?;
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(TimestampError::LeapSecond);
    }
    Ok(naive.and_utc().timestamp_millis())
}

/// Render a timestamp as `YYYY-MM-DD HH:MM` (UTC).
///
/// Instants chrono can't represent (hundreds of millennia out) fall back to
/// raw milliseconds; a stored duration large enough to reach them still gets
/// a readable conflict message.
pub fn format_minute(ms: Ms) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => format!("@{ms}ms"),
    }
}

/// Convert a duration in minutes to milliseconds. Fractional minutes are
/// truncated toward zero. Negative or non-finite durations have no interval.
pub fn minutes_to_ms(minutes: f64) -> Option<Ms> {
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    let whole = minutes.trunc();
    if whole > (Ms::MAX / MINUTE_MS) as f64 {
        return None;
    }
    Some(whole as Ms * MINUTE_MS)
}

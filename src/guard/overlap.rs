use tracing::debug;
use ulid::Ulid;

use crate::model::*;

use super::GuardError;

/// Interval `[start, start + duration)` of a talk's scheduling fields.
pub fn talk_span(start: &str, duration_minutes: f64) -> Result<Span, GuardError> {
    let start = parse_timestamp(start).map_err(|e| GuardError::MalformedInput {
        field: "start",
        detail: format!("{start:?} is not in YYYY-MM-DD HH:MM:SS.mmmZ format ({e})"),
    })?;
    let duration = minutes_to_ms(duration_minutes).ok_or_else(|| GuardError::MalformedInput {
        field: "durationMinutes",
        detail: format!("{duration_minutes} is not a valid duration"),
    })?;
    let end = start
        .checked_add(duration)
        .ok_or_else(|| GuardError::MalformedInput {
            field: "durationMinutes",
            detail: format!("{duration_minutes} minutes runs past the end of time"),
        })?;
    Ok(Span::new(start, end))
}

/// First talk in `existing` whose interval overlaps `span`, in iteration order.
///
/// `exclude_id` never conflicts. Talks with no start or zero duration are
/// passed over, and so are talks whose fields don't form an interval.
pub fn first_conflict<'a>(
    span: &Span,
    existing: &'a [Talk],
    exclude_id: Option<Ulid>,
) -> Option<(&'a Talk, Span)> {
    for talk in existing {
        if exclude_id == Some(talk.id) {
            continue;
        }
        let fields = &talk.fields;
        if fields.start.is_empty() || fields.duration_minutes == 0.0 {
            continue;
        }
        let other = match talk_span(&fields.start, fields.duration_minutes) {
            Ok(other) => other,
            Err(e) => {
                debug!("skipping stored talk {}: {e}", talk.id);
                continue;
            }
        };
        if span.overlaps(&other) {
            return Some((talk, other));
        }
    }
    None
}

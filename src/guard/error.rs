use ulid::Ulid;

use crate::model::{format_minute, Span};
use crate::store::StoreError;

/// A named talk window, as reported in a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub span: Span,
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' ({} - {})",
            self.name,
            format_minute(self.span.start),
            format_minute(self.span.end)
        )
    }
}

#[derive(Debug)]
pub enum GuardError {
    /// The candidate's scheduling fields could not be turned into an interval.
    MalformedInput {
        field: &'static str,
        detail: String,
    },
    Conflict {
        candidate: Slot,
        existing: Slot,
        existing_id: Ulid,
    },
    StoreUnavailable(StoreError),
}

impl GuardError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GuardError::MalformedInput { .. } => "malformed",
            GuardError::Conflict { .. } => "conflict",
            GuardError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl std::fmt::Display for GuardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardError::MalformedInput { field, detail } => {
                write!(f, "invalid {field}: {detail}")
            }
            GuardError::Conflict {
                candidate,
                existing,
                ..
            } => write!(
                f,
                "talk overlap detected! {candidate} overlaps with existing talk {existing} in the same room"
            ),
            GuardError::StoreUnavailable(e) => write!(f, "failed to fetch existing talks: {e}"),
        }
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::StoreUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

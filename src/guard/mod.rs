mod error;
mod overlap;

pub use error::{GuardError, Slot};
pub use overlap::{first_conflict, talk_span};

use std::sync::Arc;

use ulid::Ulid;

use crate::model::*;
use crate::store::TalkStore;

/// Result of a check that lets the request continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Compared against every other talk in the room, no overlap.
    Checked,
    /// Start, duration or room not filled in yet; nothing to compare.
    Skipped,
}

/// Rejects a talk whose window overlaps another talk in the same room.
///
/// Stateless apart from the store handle: each check reads the room once and
/// decides. Two overlapping talks checked concurrently can both pass if
/// neither is written before the other's read; nothing here locks the room
/// between check and write.
pub struct OverlapGuard {
    store: Arc<dyn TalkStore>,
}

impl OverlapGuard {
    pub fn new(store: Arc<dyn TalkStore>) -> Self {
        Self { store }
    }

    /// Check `candidate` against the talks already in its room.
    ///
    /// `exclude_id` is the candidate's own id when it is an update, so the
    /// stored version of the same talk is never reported as a conflict.
    pub async fn check(
        &self,
        candidate: &TalkInput,
        exclude_id: Option<Ulid>,
    ) -> Result<Verdict, GuardError> {
        if !candidate.is_scheduled() {
            return Ok(Verdict::Skipped);
        }

        let span = talk_span(&candidate.start, candidate.duration_minutes)?;

        let existing = self
            .store
            .find_by_room(&candidate.room)
            .await
            .map_err(GuardError::StoreUnavailable)?;
        metrics::histogram!(crate::observability::ROOM_CANDIDATES).record(existing.len() as f64);

        match first_conflict(&span, &existing, exclude_id) {
            Some((talk, other)) => Err(GuardError::Conflict {
                candidate: Slot {
                    name: candidate.name.clone(),
                    span,
                },
                existing: Slot {
                    name: talk.fields.name.clone(),
                    span: other,
                },
                existing_id: talk.id,
            }),
            None => Ok(Verdict::Checked),
        }
    }
}

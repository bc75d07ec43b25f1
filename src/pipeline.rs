use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};
use ulid::Ulid;

use crate::guard::GuardError;
use crate::model::*;
use crate::observability;
use crate::store::{StoreError, TalkStore};

/// Lifecycle points at which hooks run, before the record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    CreateRequest,
    UpdateRequest,
}

impl Trigger {
    pub fn label(&self) -> &'static str {
        match self {
            Trigger::CreateRequest => "create",
            Trigger::UpdateRequest => "update",
        }
    }
}

/// What a hook sees of an in-flight request.
#[derive(Debug, Clone, Copy)]
pub struct RequestEvent<'a> {
    pub trigger: Trigger,
    pub record: &'a TalkInput,
    /// Id of the persisted record being updated. `None` on create.
    pub record_id: Option<Ulid>,
}

/// Runs before a talk is written. Returning `Ok` lets the request continue
/// to the next hook and finally to the store; an error aborts it.
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn handle(&self, event: &RequestEvent<'_>) -> Result<(), GuardError>;
}

#[derive(Debug)]
pub enum PipelineError {
    Rejected(GuardError),
    NotFound(Ulid),
    Store(StoreError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Rejected(e) => write!(f, "request rejected: {e}"),
            PipelineError::NotFound(id) => write!(f, "talk not found: {id}"),
            PipelineError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Rejected(e) => Some(e),
            PipelineError::Store(e) => Some(e),
            PipelineError::NotFound(_) => None,
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::Store(other),
        }
    }
}

/// Create/update/delete requests for the talk collection.
pub struct RecordPipeline {
    store: Arc<dyn TalkStore>,
    hooks: Vec<(Trigger, Arc<dyn RequestHook>)>,
}

impl RecordPipeline {
    pub fn new(store: Arc<dyn TalkStore>) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    /// Run `hook` on every request of kind `trigger`, after hooks bound earlier.
    pub fn bind(&mut self, trigger: Trigger, hook: Arc<dyn RequestHook>) {
        self.hooks.push((trigger, hook));
    }

    pub fn hook_count(&self, trigger: Trigger) -> usize {
        self.hooks.iter().filter(|(t, _)| *t == trigger).count()
    }

    async fn run_hooks(&self, event: &RequestEvent<'_>) -> Result<(), PipelineError> {
        let started = Instant::now();
        let mut result = Ok(());
        for (_, hook) in self.hooks.iter().filter(|(t, _)| *t == event.trigger) {
            result = hook.handle(event).await;
            if result.is_err() {
                break;
            }
        }
        let trigger = event.trigger.label();
        metrics::histogram!(observability::VALIDATION_DURATION_SECONDS, "trigger" => trigger)
            .record(started.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(()) => "accepted",
            Err(e) => e.label(),
        };
        metrics::counter!(observability::REQUESTS_TOTAL, "trigger" => trigger, "outcome" => outcome)
            .increment(1);

        result.map_err(|e| {
            warn!("{trigger} of '{}' rejected: {e}", event.record.name);
            PipelineError::Rejected(e)
        })
    }

    pub async fn create(&self, fields: TalkInput) -> Result<Talk, PipelineError> {
        let event = RequestEvent {
            trigger: Trigger::CreateRequest,
            record: &fields,
            record_id: None,
        };
        self.run_hooks(&event).await?;
        let talk = self.store.insert(fields).await?;
        info!("created talk {} '{}'", talk.id, talk.fields.name);
        Ok(talk)
    }

    pub async fn update(&self, id: Ulid, fields: TalkInput) -> Result<Talk, PipelineError> {
        if self.store.get(id).await?.is_none() {
            return Err(PipelineError::NotFound(id));
        }
        let event = RequestEvent {
            trigger: Trigger::UpdateRequest,
            record: &fields,
            record_id: Some(id),
        };
        self.run_hooks(&event).await?;
        let talk = self.store.replace(id, fields).await?;
        info!("updated talk {} '{}'", talk.id, talk.fields.name);
        Ok(talk)
    }

    /// Deletes run no hooks: removing a talk can't create an overlap.
    pub async fn delete(&self, id: Ulid) -> Result<Talk, PipelineError> {
        let talk = self.store.remove(id).await?;
        info!("deleted talk {} '{}'", talk.id, talk.fields.name);
        Ok(talk)
    }
}

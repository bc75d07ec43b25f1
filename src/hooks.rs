use std::sync::Arc;

use async_trait::async_trait;

use crate::guard::{GuardError, OverlapGuard};
use crate::pipeline::{RecordPipeline, RequestEvent, RequestHook, Trigger};

/// Bind the overlap guard to talk creation and talk update.
pub fn register(pipeline: &mut RecordPipeline, guard: Arc<OverlapGuard>) {
    pipeline.bind(Trigger::CreateRequest, guard.clone());
    pipeline.bind(Trigger::UpdateRequest, guard);
}

#[async_trait]
impl RequestHook for OverlapGuard {
    async fn handle(&self, event: &RequestEvent<'_>) -> Result<(), GuardError> {
        let exclude_id = match event.trigger {
            Trigger::CreateRequest => None,
            Trigger::UpdateRequest => event.record_id,
        };
        self.check(event.record, exclude_id).await?;
        Ok(())
    }
}

use std::sync::Arc;

use tracing::info;

use talkguard::guard::OverlapGuard;
use talkguard::hooks;
use talkguard::model::TalkInput;
use talkguard::pipeline::RecordPipeline;
use talkguard::store::InMemoryStore;

/// Replays a schedule file through the create pipeline with the overlap guard
/// bound, and fails if any talk is rejected.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("TALKGUARD_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    talkguard::observability::init(metrics_port)?;

    let schedule_path =
        std::env::var("TALKGUARD_SCHEDULE").unwrap_or_else(|_| "./schedule.json".into());
    let raw = std::fs::read_to_string(&schedule_path)?;
    let talks: Vec<TalkInput> = serde_json::from_str(&raw)?;
    info!("checking {} talks from {schedule_path}", talks.len());

    let store = Arc::new(InMemoryStore::new());
    let mut pipeline = RecordPipeline::new(store.clone());
    hooks::register(&mut pipeline, Arc::new(OverlapGuard::new(store.clone())));

    let mut rejected = 0usize;
    for talk in talks {
        // The pipeline logs each rejection with its reason.
        if pipeline.create(talk).await.is_err() {
            rejected += 1;
        }
    }

    info!(
        "schedule check done: {} accepted, {rejected} rejected",
        store.talk_count()
    );
    if rejected > 0 {
        return Err(format!("{rejected} talks rejected").into());
    }
    Ok(())
}

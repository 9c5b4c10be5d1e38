//! Per-task runners: glue between one supervised subprocess and the registry.
//!
//! A runner owns nothing but the task id. Every observation flows back
//! through [`TaskRegistry::update`], so a runner can never hold a live
//! reference into the registry across a mutation, and a cancelled record
//! simply absorbs the runner's remaining writes as no-ops.

mod download;
mod transcribe;

pub use download::{spawn_download, DownloadMethod, DownloadSpec};
pub use transcribe::{spawn_transcribe, TranscribeSpec};

use std::time::Instant;

use crate::progress::ProgressUpdate;
use crate::registry::TaskRegistry;
use crate::task::TaskStatus;

/// Write one parser-derived update into the record. State never changes
/// here; only the supervisor's post-exit evaluation moves a task out of
/// `Running`.
async fn apply_progress(registry: &TaskRegistry, id: &str, upd: &ProgressUpdate, started: Instant) {
    let upd = upd.clone();
    let elapsed = started.elapsed().as_secs();
    let res = registry
        .update(id, move |r| {
            if let Some(p) = upd.percentage {
                r.percentage = p;
            }
            if let Some(stage) = upd.stage {
                r.stage = Some(stage);
            }
            if let Some(rate) = upd.rate {
                r.speed = Some(rate);
            }
            r.elapsed_seconds = elapsed;
        })
        .await;
    if let Err(e) = res {
        tracing::debug!(task = id, error = %e, "progress update dropped");
    }
}

/// Terminal success write. A no-op if the record is already terminal
/// (e.g. cancelled while the process was still running).
async fn complete(registry: &TaskRegistry, id: &str, artifacts: Vec<String>, started: Instant) {
    let elapsed = started.elapsed().as_secs();
    let res = registry
        .update(id, move |r| {
            r.status = TaskStatus::Completed;
            r.percentage = 100;
            r.artifacts = artifacts;
            r.elapsed_seconds = elapsed;
        })
        .await;
    match res {
        Ok(r) if r.status == TaskStatus::Completed => {
            tracing::info!(task = id, elapsed, "task completed")
        }
        Ok(r) => tracing::info!(task = id, status = ?r.status, "completion absorbed by terminal record"),
        Err(e) => tracing::warn!(task = id, error = %e, "completion write failed"),
    }
}

/// Terminal failure write; same idempotence rules as [`complete`].
async fn fail(registry: &TaskRegistry, id: &str, reason: String, started: Instant) {
    let elapsed = started.elapsed().as_secs();
    tracing::warn!(task = id, %reason, "task failed");
    let res = registry
        .update(id, move |r| {
            r.status = TaskStatus::Failed;
            r.error = Some(reason);
            r.elapsed_seconds = elapsed;
        })
        .await;
    if let Err(e) = res {
        tracing::warn!(task = id, error = %e, "failure write failed");
    }
}

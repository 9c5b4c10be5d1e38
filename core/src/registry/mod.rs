//! Single source of truth for task records.
//!
//! The registry owns the records; runners hold only task ids and write back
//! through [`TaskRegistry::update`]. The lock is held for the in-memory
//! mutation only; durable snapshots go to a background writer after the
//! lock is released.

mod persist;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::RegistryError;
use crate::task::{generate_task_id, TaskKind, TaskRecord};

use persist::PersistTx;

#[derive(Clone)]
pub struct TaskRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    tasks: RwLock<HashMap<String, TaskRecord>>,
    persist: Option<PersistTx>,
    // Snapshot sequence; assigned under the write lock so the persist writer
    // can reject snapshots arriving out of order.
    seq: AtomicU64,
}

impl TaskRegistry {
    /// In-memory registry with no durable backing.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tasks: RwLock::new(HashMap::new()),
                persist: None,
                seq: AtomicU64::new(0),
            }),
        }
    }

    /// Registry backed by a JSON snapshot file. Existing records are loaded
    /// so ids stay unique across restarts.
    pub async fn with_persistence(path: PathBuf) -> anyhow::Result<Self> {
        let restored = persist::load_snapshot(&path).await?;
        if !restored.is_empty() {
            tracing::info!(count = restored.len(), "restored tasks from snapshot");
        }
        let (tx, _writer) = persist::start_persist_writer(path);
        Ok(Self {
            inner: Arc::new(Inner {
                tasks: RwLock::new(restored),
                persist: Some(tx),
                seq: AtomicU64::new(0),
            }),
        })
    }

    /// Allocate a fresh id and insert a `Pending` record.
    pub async fn create(&self, kind: TaskKind, input: String) -> TaskRecord {
        let mut tasks = self.inner.tasks.write().await;
        // The suffix makes collisions vanishingly rare; loop anyway so a
        // collision can never clobber a live record.
        let id = loop {
            let candidate = generate_task_id(kind);
            if !tasks.contains_key(&candidate) {
                break candidate;
            }
        };
        let record = TaskRecord::new(id.clone(), kind, input);
        tasks.insert(id, record.clone());
        let snapshot = self.capture_snapshot(&tasks);
        drop(tasks);

        self.send_snapshot(snapshot).await;
        record
    }

    /// Snapshot read.
    pub async fn get(&self, id: &str) -> Result<TaskRecord, RegistryError> {
        let tasks = self.inner.tasks.read().await;
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Apply a mutation atomically with respect to other updates on the same
    /// id, enforcing the forward-only state machine:
    ///
    /// - a record already in a terminal state is returned unchanged (accepted
    ///   no-op; the first terminal write wins),
    /// - a backward status move is rejected with
    ///   [`RegistryError::InvalidTransition`],
    /// - `percentage` is clamped so it never decreases and never exceeds 100,
    /// - `id`, `kind`, `input` and `created_at` are immutable; `updated_at`
    ///   advances on every accepted mutation.
    pub async fn update<F>(&self, id: &str, mutate: F) -> Result<TaskRecord, RegistryError>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let (updated, snapshot) = {
            let mut tasks = self.inner.tasks.write().await;
            let current = tasks
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

            if current.status.is_terminal() {
                return Ok(current.clone());
            }

            let mut next = current.clone();
            mutate(&mut next);

            // Immutable fields cannot be rewritten by a mutation closure.
            next.id = current.id.clone();
            next.kind = current.kind;
            next.input = current.input.clone();
            next.created_at = current.created_at;

            if !current.status.can_transition(next.status) {
                return Err(RegistryError::InvalidTransition {
                    from: current.status,
                    to: next.status,
                });
            }

            next.percentage = next.percentage.clamp(current.percentage, 100);
            next.updated_at = Utc::now();

            *current = next.clone();
            let snapshot = self.capture_snapshot(&tasks);
            (next, snapshot)
        };

        self.send_snapshot(snapshot).await;
        Ok(updated)
    }

    /// Consistent snapshot of all records, newest creation first.
    pub async fn list(&self) -> Vec<TaskRecord> {
        let tasks = self.inner.tasks.read().await;
        let mut all: Vec<TaskRecord> = tasks.values().cloned().collect();
        // Tie-break on id so the order is stable within one timestamp granule.
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        all
    }

    /// Must be called while the write lock is held: the sequence number and
    /// the captured state have to agree, or a slow writer could persist an
    /// older state over a newer one.
    fn capture_snapshot(
        &self,
        tasks: &HashMap<String, TaskRecord>,
    ) -> Option<(u64, Vec<TaskRecord>)> {
        self.inner.persist.as_ref()?;
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        Some((seq, tasks.values().cloned().collect()))
    }

    async fn send_snapshot(&self, snapshot: Option<(u64, Vec<TaskRecord>)>) {
        if let (Some((seq, records)), Some(tx)) = (snapshot, self.inner.persist.as_ref()) {
            tx.send(seq, records).await;
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

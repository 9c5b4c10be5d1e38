//! Background snapshot writer for the registry.
//!
//! Snapshots are whole-registry JSON documents sent over an mpsc channel to a
//! single writer task, so file I/O never happens inside the registry lock.
//! Each snapshot carries the sequence number assigned while the registry's
//! write lock was held; the writer persists them in sequence order and drops
//! any that arrive late, so a stale snapshot can never overwrite a newer one.
//! Writes go to a temp file first and are renamed into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::task::TaskRecord;

#[derive(Clone)]
pub(crate) struct PersistTx {
    tx: mpsc::Sender<(u64, Vec<TaskRecord>)>,
}

impl PersistTx {
    pub(crate) async fn send(&self, seq: u64, snapshot: Vec<TaskRecord>) {
        if self.tx.send((seq, snapshot)).await.is_err() {
            tracing::warn!("persist writer closed; snapshot dropped");
        }
    }
}

pub(crate) fn start_persist_writer(path: PathBuf) -> (PersistTx, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<(u64, Vec<TaskRecord>)>(64);

    let handle = tokio::spawn(async move {
        let mut last_seq = 0u64;
        while let Some((mut seq, mut snapshot)) = rx.recv().await {
            // Coalesce: only the newest queued snapshot matters.
            while let Ok((s, newer)) = rx.try_recv() {
                if s > seq {
                    seq = s;
                    snapshot = newer;
                }
            }
            if seq <= last_seq {
                continue;
            }
            last_seq = seq;
            if let Err(e) = write_snapshot(&path, &snapshot).await {
                tracing::warn!(error = %e, path = %path.display(), "task snapshot write failed");
            }
        }
    });

    (PersistTx { tx }, handle)
}

async fn write_snapshot(path: &Path, snapshot: &[TaskRecord]) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(snapshot).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Load a previously written snapshot; an absent file is an empty registry.
pub(crate) async fn load_snapshot(path: &Path) -> anyhow::Result<HashMap<String, TaskRecord>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let records: Vec<TaskRecord> = serde_json::from_slice(&bytes)
                .map_err(|e| anyhow::anyhow!("corrupt task snapshot {}: {e}", path.display()))?;
            Ok(records.into_iter().map(|r| (r.id.clone(), r)).collect())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;
    use std::time::Duration;

    fn record(id: &str) -> TaskRecord {
        TaskRecord::new(id.to_string(), TaskKind::Download, "u".into())
    }

    #[tokio::test]
    async fn late_stale_snapshot_never_overwrites_a_newer_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let (tx, handle) = start_persist_writer(path.clone());

        tx.send(2, vec![record("dl-new")]).await;

        // Wait until the newer snapshot is durable before the stale arrives.
        for _ in 0..100 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(path.exists());

        tx.send(1, vec![record("dl-old")]).await;
        drop(tx);
        handle.await.unwrap();

        let restored = load_snapshot(&path).await.unwrap();
        assert!(restored.contains_key("dl-new"));
        assert!(!restored.contains_key("dl-old"));
    }
}

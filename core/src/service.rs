//! Application service: validates tool inputs, fills defaults, launches
//! runners, and shapes responses. Both the stdio RPC dispatcher and the HTTP
//! routes sit on top of this, so the two surfaces cannot drift apart.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{RegistryError, TaskError};
use crate::registry::TaskRegistry;
use crate::runner::{
    spawn_download, spawn_transcribe, DownloadMethod, DownloadSpec, TranscribeSpec,
};
use crate::task::{TaskKind, TaskRecord, TaskStatus};

#[derive(Clone)]
pub struct TaskService {
    registry: TaskRegistry,
    cfg: Arc<AppConfig>,
}

/// Acknowledgement for a newly launched download.
#[derive(Debug, Serialize)]
pub struct DownloadStarted {
    pub task_id: String,
    pub status: TaskStatus,
    pub output_dir: String,
    pub filename: String,
    pub message: String,
}

/// Acknowledgement for a newly launched transcription, including where the
/// intermediate audio and the transcript will land.
#[derive(Debug, Serialize)]
pub struct TranscribeStarted {
    pub task_id: String,
    pub status: TaskStatus,
    pub mp3_path: String,
    pub txt_path: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub downloads: Vec<TaskRecord>,
    pub transcribes: Vec<TaskRecord>,
    pub summary: TaskSummary,
}

#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TaskService {
    pub fn new(registry: TaskRegistry, cfg: Arc<AppConfig>) -> Self {
        Self { registry, cfg }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.cfg
    }

    /// Launch a download task. Returns immediately with the task id; progress
    /// is observed through `get_progress`.
    pub async fn create_download(
        &self,
        url: &str,
        output_dir: Option<&str>,
        filename: Option<&str>,
    ) -> Result<DownloadStarted, TaskError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TaskError::Validation("url must not be empty".into()));
        }

        let output_dir = self.resolve_download_dir(output_dir);
        let record = self
            .registry
            .create(TaskKind::Download, url.to_string())
            .await;
        let filename = match filename {
            Some(f) if !f.trim().is_empty() => f.trim().to_string(),
            _ => format!("video_{}", record.id),
        };

        let spec = DownloadSpec {
            id: record.id.clone(),
            url: url.to_string(),
            output_dir: output_dir.clone(),
            filename: filename.clone(),
            method: DownloadMethod::for_url(url),
        };
        spawn_download(self.registry.clone(), Arc::clone(&self.cfg), spec);

        Ok(DownloadStarted {
            task_id: record.id.clone(),
            status: record.status,
            output_dir: output_dir.to_string_lossy().to_string(),
            filename,
            message: format!(
                "download task {} started; call get_progress with this task_id to follow it",
                record.id
            ),
        })
    }

    /// Launch a transcription task for a local video file.
    pub async fn create_transcribe(
        &self,
        video_path: &str,
        output_dir: Option<&str>,
        output_filename: Option<&str>,
        language: Option<&str>,
    ) -> Result<TranscribeStarted, TaskError> {
        let video_path = video_path.trim();
        if video_path.is_empty() {
            return Err(TaskError::Validation("video_path must not be empty".into()));
        }
        let video_path = PathBuf::from(shellexpand::tilde(video_path).into_owned());
        match tokio::fs::metadata(&video_path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(TaskError::Validation(format!(
                    "video file not found: {}",
                    video_path.display()
                )));
            }
        }

        let output_dir = match output_dir {
            Some(d) if !d.trim().is_empty() => {
                PathBuf::from(shellexpand::tilde(d.trim()).into_owned())
            }
            _ => video_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let stem = match output_filename {
            Some(f) if !f.trim().is_empty() => f.trim().to_string(),
            _ => video_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "transcript".to_string()),
        };
        let language = match language {
            Some(l) if !l.trim().is_empty() => l.trim().to_string(),
            _ => self.cfg.transcribe.default_language.clone(),
        };

        let record = self
            .registry
            .create(TaskKind::Transcribe, video_path.to_string_lossy().to_string())
            .await;

        let mp3_path = output_dir.join(format!("{stem}.mp3"));
        let txt_path = output_dir.join(format!("{stem}.txt"));
        let spec = TranscribeSpec {
            id: record.id.clone(),
            video_path,
            output_dir,
            output_filename: stem,
            language,
        };
        spawn_transcribe(self.registry.clone(), Arc::clone(&self.cfg), spec);

        Ok(TranscribeStarted {
            task_id: record.id.clone(),
            status: record.status,
            mp3_path: mp3_path.to_string_lossy().to_string(),
            txt_path: txt_path.to_string_lossy().to_string(),
            message: format!(
                "transcription task {} started; the transcript grows incrementally at txt_path",
                record.id
            ),
        })
    }

    /// Fetch one task's current state. When `task_type` is given it must both
    /// parse and match the record's kind.
    pub async fn get_progress(
        &self,
        task_id: &str,
        task_type: Option<&str>,
    ) -> Result<TaskRecord, TaskError> {
        let expected = match task_type {
            Some(t) => Some(
                TaskKind::from_wire(t).ok_or_else(|| TaskError::UnknownKind(t.to_string()))?,
            ),
            None => None,
        };
        let record = self.get_record(task_id).await?;
        if let Some(kind) = expected {
            if record.kind != kind {
                return Err(TaskError::NotFound(format!(
                    "{task_id} (no {} task with that id)",
                    kind.as_str()
                )));
            }
        }
        Ok(record)
    }

    /// All known tasks, newest first, partitioned by kind.
    pub async fn list_tasks(&self) -> TaskList {
        let all = self.registry.list().await;
        let summary = TaskSummary {
            total: all.len(),
            running: all
                .iter()
                .filter(|r| matches!(r.status, TaskStatus::Pending | TaskStatus::Running))
                .count(),
            completed: all
                .iter()
                .filter(|r| r.status == TaskStatus::Completed)
                .count(),
            failed: all
                .iter()
                .filter(|r| matches!(r.status, TaskStatus::Failed | TaskStatus::Cancelled))
                .count(),
        };
        let (downloads, transcribes) = all
            .into_iter()
            .partition(|r| r.kind == TaskKind::Download);
        TaskList {
            downloads,
            transcribes,
            summary,
        }
    }

    /// Mark a task cancelled. The record stops accepting progress writes; an
    /// already-terminal task is left untouched and returned as-is.
    pub async fn cancel(&self, task_id: &str) -> Result<TaskRecord, TaskError> {
        self.get_record(task_id).await?;
        let record = self
            .registry
            .update(task_id, |r| {
                r.status = TaskStatus::Cancelled;
                r.error = Some("cancelled by user".into());
            })
            .await?;
        Ok(record)
    }

    async fn get_record(&self, task_id: &str) -> Result<TaskRecord, TaskError> {
        self.registry.get(task_id).await.map_err(|e| match e {
            RegistryError::NotFound(id) => TaskError::NotFound(id),
            other => TaskError::Registry(other),
        })
    }

    fn resolve_download_dir(&self, requested: Option<&str>) -> PathBuf {
        if let Some(d) = requested {
            let d = d.trim();
            if !d.is_empty() {
                return PathBuf::from(shellexpand::tilde(d).into_owned());
            }
        }
        if let Some(d) = &self.cfg.download.output_dir {
            return PathBuf::from(shellexpand::tilde(d).into_owned());
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn service() -> TaskService {
        TaskService::new(TaskRegistry::new(), Arc::new(AppConfig::default()))
    }

    #[tokio::test]
    async fn download_rejects_empty_url() {
        let svc = service();
        let err = svc.create_download("  ", None, None).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(svc.list_tasks().await.summary.total, 0);
    }

    #[tokio::test]
    async fn download_defaults_filename_to_task_id() {
        let svc = service();
        let ack = svc
            .create_download("https://example.com/watch?v=1", Some("/tmp/dl"), None)
            .await
            .unwrap();
        assert!(ack.task_id.starts_with("dl-"));
        assert_eq!(ack.filename, format!("video_{}", ack.task_id));
        assert_eq!(ack.output_dir, "/tmp/dl");
    }

    #[tokio::test]
    async fn transcribe_rejects_missing_file() {
        let svc = service();
        let err = svc
            .create_transcribe("/definitely/not/here.mp4", None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
    }

    #[tokio::test]
    async fn transcribe_plans_paths_next_to_the_video() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("lecture.mp4");
        std::fs::write(&video, b"x").unwrap();

        let svc = service();
        let ack = svc
            .create_transcribe(&video.to_string_lossy(), None, None, None)
            .await
            .unwrap();
        assert!(ack.task_id.starts_with("tr-"));
        assert_eq!(
            ack.mp3_path,
            dir.path().join("lecture.mp3").to_string_lossy()
        );
        assert_eq!(
            ack.txt_path,
            dir.path().join("lecture.txt").to_string_lossy()
        );
    }

    #[tokio::test]
    async fn transcribe_honors_explicit_output_filename() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("lecture.mp4");
        std::fs::write(&video, b"x").unwrap();

        let svc = service();
        let ack = svc
            .create_transcribe(&video.to_string_lossy(), None, Some("notes"), None)
            .await
            .unwrap();
        assert_eq!(
            ack.txt_path,
            dir.path().join("notes.txt").to_string_lossy()
        );
    }

    #[tokio::test]
    async fn get_progress_enforces_kind_when_given() {
        let svc = service();
        let rec = svc
            .registry()
            .create(TaskKind::Download, "u".into())
            .await;

        assert!(svc.get_progress(&rec.id, None).await.is_ok());
        assert!(svc.get_progress(&rec.id, Some("download")).await.is_ok());
        assert!(matches!(
            svc.get_progress(&rec.id, Some("transcribe")).await,
            Err(TaskError::NotFound(_))
        ));
        assert!(matches!(
            svc.get_progress(&rec.id, Some("upload")).await,
            Err(TaskError::UnknownKind(_))
        ));
    }

    #[tokio::test]
    async fn cancel_is_idempotent_against_completed() {
        let svc = service();
        let rec = svc.registry().create(TaskKind::Download, "u".into()).await;
        svc.registry()
            .update(&rec.id, |r| {
                r.status = TaskStatus::Completed;
                r.percentage = 100;
            })
            .await
            .unwrap();

        let after = svc.cancel(&rec.id).await.unwrap();
        assert_eq!(after.status, TaskStatus::Completed);
        assert_eq!(after.percentage, 100);
    }

    #[tokio::test]
    async fn list_partitions_and_counts() {
        let svc = service();
        let d = svc.registry().create(TaskKind::Download, "u".into()).await;
        svc.registry().create(TaskKind::Transcribe, "v".into()).await;
        svc.registry()
            .update(&d.id, |r| r.status = TaskStatus::Failed)
            .await
            .unwrap();

        let list = svc.list_tasks().await;
        assert_eq!(list.downloads.len(), 1);
        assert_eq!(list.transcribes.len(), 1);
        assert_eq!(list.summary.total, 2);
        assert_eq!(list.summary.running, 1);
        assert_eq!(list.summary.failed, 1);
    }
}

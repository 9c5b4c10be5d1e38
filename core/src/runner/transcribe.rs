//! Transcription runner: audio extraction, then whisper.
//!
//! Phase 1 has no parsable progress at all, so the growing mp3 is polled on
//! an interval and mapped against the duration-derived expected size. Phase 2
//! parses whisper's verbose segment lines, appending each recognized text
//! segment to the output `.txt` and flushing immediately, so a partial
//! transcript exists even if the process dies mid-run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::error::TaskError;
use crate::probe;
use crate::progress::{extraction_percentage, ProgressParser, TranscriptParser};
use crate::registry::TaskRegistry;
use crate::supervisor::{ArtifactCheck, CommandSpec, ProcessSupervisor};
use crate::task::TaskStatus;

#[derive(Debug, Clone)]
pub struct TranscribeSpec {
    pub id: String,
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub language: String,
}

/// Start transcription as a detached background unit of work.
pub fn spawn_transcribe(
    registry: TaskRegistry,
    cfg: Arc<AppConfig>,
    spec: TranscribeSpec,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let id = spec.id.clone();
        let started = Instant::now();
        if let Err(e) = run(&registry, &cfg, spec, started).await {
            super::fail(&registry, &id, e.to_string(), started).await;
        }
    })
}

async fn run(
    registry: &TaskRegistry,
    cfg: &AppConfig,
    spec: TranscribeSpec,
    started: Instant,
) -> Result<(), TaskError> {
    let duration = probe::media_duration_or(
        &cfg.tools.ffprobe,
        &spec.video_path,
        cfg.transcribe.fallback_duration_secs,
    )
    .await;

    registry
        .update(&spec.id, |r| {
            r.status = TaskStatus::Running;
            r.percentage = 1;
            r.stage = Some(format!(
                "extracting audio ({:.0} min of source)",
                duration / 60.0
            ));
        })
        .await?;

    tokio::fs::create_dir_all(&spec.output_dir).await?;
    let mp3_path = spec.output_dir.join(format!("{}.mp3", spec.output_filename));
    let txt_path = spec.output_dir.join(format!("{}.txt", spec.output_filename));

    extract_audio(registry, cfg, &spec, &mp3_path, duration, started)
        .await
        .map_err(|e| TaskError::Runtime(format!("audio extraction failed: {e}")))?;

    registry
        .update(&spec.id, |r| {
            r.percentage = cfg.transcribe.band_floor;
            r.stage = Some(format!(
                "transcribing (whisper {} model)",
                cfg.tools.whisper_model
            ));
            r.elapsed_seconds = started.elapsed().as_secs();
        })
        .await?;

    transcribe_audio(registry, cfg, &spec, &mp3_path, &txt_path, duration, started).await?;

    let artifacts = vec![
        mp3_path.to_string_lossy().to_string(),
        txt_path.to_string_lossy().to_string(),
    ];
    super::complete(registry, &spec.id, artifacts, started).await;
    Ok(())
}

async fn extract_audio(
    registry: &TaskRegistry,
    cfg: &AppConfig,
    spec: &TranscribeSpec,
    mp3_path: &Path,
    duration: f64,
    started: Instant,
) -> Result<(), TaskError> {
    let cmd = CommandSpec::new(&cfg.tools.ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(spec.video_path.to_string_lossy())
        .args(["-q:a", "9"])
        .arg(mp3_path.to_string_lossy());

    let mut proc = ProcessSupervisor::new(cmd).spawn()?;

    // Size-poll heuristic: the only progress signal this phase has.
    let watcher = spawn_size_watcher(
        registry.clone(),
        spec.id.clone(),
        mp3_path.to_path_buf(),
        duration,
        cfg.transcribe.clone(),
        started,
    );

    // ffmpeg chatters on stderr; nothing in it is parsable progress here.
    while proc.next_line().await.is_some() {}
    let result = proc
        .finish(&ArtifactCheck::NonEmptyFile(mp3_path.to_path_buf()))
        .await;
    watcher.abort();

    result.map(|_| ())
}

fn spawn_size_watcher(
    registry: TaskRegistry,
    id: String,
    mp3_path: PathBuf,
    duration: f64,
    transcribe_cfg: crate::config::TranscribeConfig,
    started: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = 0u8;
        loop {
            tokio::time::sleep(Duration::from_millis(transcribe_cfg.poll_interval_ms)).await;
            let Ok(meta) = tokio::fs::metadata(&mp3_path).await else {
                continue;
            };
            let pct = extraction_percentage(
                meta.len(),
                duration,
                transcribe_cfg.bytes_per_minute,
                transcribe_cfg.extract_ceiling,
            );
            if pct > last {
                last = pct;
                let elapsed = started.elapsed().as_secs();
                let _ = registry
                    .update(&id, move |r| {
                        r.percentage = pct;
                        r.elapsed_seconds = elapsed;
                    })
                    .await;
            }
        }
    })
}

async fn transcribe_audio(
    registry: &TaskRegistry,
    cfg: &AppConfig,
    spec: &TranscribeSpec,
    mp3_path: &Path,
    txt_path: &Path,
    duration: f64,
    started: Instant,
) -> Result<(), TaskError> {
    // Created up front and appended to segment by segment.
    let mut txt_file = tokio::fs::File::create(txt_path).await?;

    let cmd = CommandSpec::new(&cfg.tools.whisper)
        .arg(mp3_path.to_string_lossy())
        .args(["--output_format", "txt"])
        .arg("--output_dir")
        .arg(spec.output_dir.to_string_lossy())
        .arg("--language")
        .arg(&spec.language)
        .arg("--model")
        .arg(&cfg.tools.whisper_model)
        .args(["--verbose", "True"]);

    let mut parser = TranscriptParser::new(
        duration,
        cfg.transcribe.band_floor,
        cfg.transcribe.band_ceiling,
    );

    let mut proc = ProcessSupervisor::new(cmd).spawn()?;
    while let Some(line) = proc.next_line().await {
        let Some(upd) = parser.consume_line(&line) else {
            continue;
        };
        // Timestamps stay out of the artifact; only the text lands there,
        // flushed so a killed run still leaves a usable partial result.
        if let Some(text) = upd.text.as_deref() {
            txt_file.write_all(text.as_bytes()).await?;
            txt_file.write_all(b"\n").await?;
            txt_file.sync_data().await?;
        }
        if upd.percentage.is_some() {
            super::apply_progress(registry, &spec.id, &upd, started).await;
        }
    }

    proc.finish(&ArtifactCheck::NonEmptyFile(txt_path.to_path_buf()))
        .await
        .map_err(|e| match e {
            TaskError::Runtime(msg) => TaskError::Runtime(format!("transcription failed: {msg}")),
            other => other,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testutil::fake_tool;
    use crate::task::TaskKind;
    use pretty_assertions::assert_eq;

    /// Config pointing every tool at scripts inside `dir`.
    fn test_cfg(dir: &std::path::Path) -> Arc<AppConfig> {
        let mut cfg = AppConfig::default();
        cfg.tools.ffmpeg = dir.join("ffmpeg").to_string_lossy().to_string();
        cfg.tools.ffprobe = dir.join("ffprobe").to_string_lossy().to_string();
        cfg.tools.whisper = dir.join("whisper").to_string_lossy().to_string();
        cfg.transcribe.poll_interval_ms = 20;
        Arc::new(cfg)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn full_pipeline_writes_incremental_transcript() {
        let tools = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        fake_tool(tools.path(), "ffprobe", "echo 120.000000");
        // "ffmpeg": writes the mp3 it was asked to produce (last argument).
        fake_tool(
            tools.path(),
            "ffmpeg",
            r#"for a; do last=$a; done; echo "audio bytes" > "$last""#,
        );
        fake_tool(
            tools.path(),
            "whisper",
            r#"echo "Detecting language..."
echo "[00:00.000 --> 00:30.000] 你好"
echo "[00:30.000 --> 01:00.000] world"
echo "[01:00.000 --> 02:00.000] end""#,
        );

        let cfg = test_cfg(tools.path());
        let registry = TaskRegistry::new();
        let rec = registry
            .create(TaskKind::Transcribe, "talk.mp4".into())
            .await;

        spawn_transcribe(
            registry.clone(),
            cfg,
            TranscribeSpec {
                id: rec.id.clone(),
                video_path: PathBuf::from("talk.mp4"),
                output_dir: out.path().to_path_buf(),
                output_filename: "talk".into(),
                language: "zh".into(),
            },
        )
        .await
        .unwrap();

        let got = registry.get(&rec.id).await.unwrap();
        assert_eq!(got.status, TaskStatus::Completed);
        assert_eq!(got.percentage, 100);
        assert_eq!(got.artifacts.len(), 2);

        // Only the text, no timestamps, one segment per line.
        let txt = std::fs::read_to_string(out.path().join("talk.txt")).unwrap();
        assert_eq!(txt, "你好\nworld\nend\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_extraction_fails_the_task() {
        let tools = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        fake_tool(tools.path(), "ffprobe", "echo 60.0");
        fake_tool(tools.path(), "ffmpeg", "echo 'codec not supported' >&2; exit 1");
        fake_tool(tools.path(), "whisper", "exit 0");

        let cfg = test_cfg(tools.path());
        let registry = TaskRegistry::new();
        let rec = registry
            .create(TaskKind::Transcribe, "bad.mp4".into())
            .await;

        spawn_transcribe(
            registry.clone(),
            cfg,
            TranscribeSpec {
                id: rec.id.clone(),
                video_path: PathBuf::from("bad.mp4"),
                output_dir: out.path().to_path_buf(),
                output_filename: "bad".into(),
                language: "zh".into(),
            },
        )
        .await
        .unwrap();

        let got = registry.get(&rec.id).await.unwrap();
        assert_eq!(got.status, TaskStatus::Failed);
        let err = got.error.unwrap();
        assert!(err.contains("audio extraction failed"), "{err}");
        assert!(err.contains("codec not supported"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn whisper_with_no_output_fails_artifact_check() {
        let tools = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        fake_tool(tools.path(), "ffprobe", "echo 60.0");
        fake_tool(
            tools.path(),
            "ffmpeg",
            r#"for a; do last=$a; done; echo "audio" > "$last""#,
        );
        // Exits cleanly without emitting a single segment.
        fake_tool(tools.path(), "whisper", "echo 'model loaded'; exit 0");

        let cfg = test_cfg(tools.path());
        let registry = TaskRegistry::new();
        let rec = registry
            .create(TaskKind::Transcribe, "silent.mp4".into())
            .await;

        spawn_transcribe(
            registry.clone(),
            cfg,
            TranscribeSpec {
                id: rec.id.clone(),
                video_path: PathBuf::from("silent.mp4"),
                output_dir: out.path().to_path_buf(),
                output_filename: "silent".into(),
                language: "zh".into(),
            },
        )
        .await
        .unwrap();

        let got = registry.get(&rec.id).await.unwrap();
        assert_eq!(got.status, TaskStatus::Failed);
        assert!(got.error.unwrap().contains("empty"));
    }
}

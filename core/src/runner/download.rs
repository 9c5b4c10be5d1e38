//! Download runner.
//!
//! Two acquisition methods, matching the two tool contracts:
//!
//! - `Acquire`: a downloader script that resolves the source itself, names
//!   its own output file and prints free-text lines containing a percent
//!   figure. Success is the newest fresh `.mp4` in the output directory.
//! - `StreamCopy`: ffmpeg remuxing a direct media URL
//!   (`-c copy -progress pipe:1`), which emits `progress=` marker lines but
//!   no usable figure. Success is the exact output file, non-empty.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::error::TaskError;
use crate::progress::{MarkerParser, PercentParser, ProgressParser};
use crate::registry::TaskRegistry;
use crate::supervisor::{ArtifactCheck, CommandSpec, ProcessSupervisor};
use crate::task::TaskStatus;

/// Grace window applied when accepting pre-existing output files, as the
/// downloader may have started writing before we sampled the clock.
const FRESHNESS_GRACE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMethod {
    Acquire,
    StreamCopy,
}

impl DownloadMethod {
    /// Direct media URLs go straight through ffmpeg; everything else needs
    /// the acquisition script.
    pub fn for_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if [".m3u8", ".mp4", ".ts", ".flv"].iter().any(|ext| path.ends_with(ext)) {
            DownloadMethod::StreamCopy
        } else {
            DownloadMethod::Acquire
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadSpec {
    pub id: String,
    pub url: String,
    pub output_dir: PathBuf,
    pub filename: String,
    pub method: DownloadMethod,
}

/// Start the download as a detached background unit of work; the subprocess
/// runs to completion regardless of who is still polling.
pub fn spawn_download(
    registry: TaskRegistry,
    cfg: Arc<AppConfig>,
    spec: DownloadSpec,
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
    spec: DownloadSpec,
    started: Instant,
) -> Result<(), TaskError> {
    registry
        .update(&spec.id, |r| {
            r.status = TaskStatus::Running;
            r.stage = Some("downloading".into());
        })
        .await?;

    tokio::fs::create_dir_all(&spec.output_dir).await?;
    let not_before = SystemTime::now() - FRESHNESS_GRACE;

    let (command, mut parser, check): (CommandSpec, Box<dyn ProgressParser>, ArtifactCheck) =
        match spec.method {
            DownloadMethod::Acquire => {
                let cmd = CommandSpec::new(&cfg.tools.downloader)
                    .args(cfg.tools.downloader_args.iter().cloned())
                    .arg(&spec.url)
                    .arg("-o")
                    .arg(spec.output_dir.to_string_lossy())
                    .arg("-q")
                    .arg(&cfg.download.quality);
                let check = ArtifactCheck::NewestMatch {
                    dir: spec.output_dir.clone(),
                    extension: "mp4".into(),
                    not_before,
                };
                (cmd, Box::new(PercentParser::with_start(started)), check)
            }
            DownloadMethod::StreamCopy => {
                let out = spec.output_dir.join(format!("{}.mp4", spec.filename));
                let cmd = CommandSpec::new(&cfg.tools.ffmpeg)
                    .arg("-y")
                    .arg("-i")
                    .arg(&spec.url)
                    .args(["-c", "copy", "-progress", "pipe:1"])
                    .arg(out.to_string_lossy());
                (
                    cmd,
                    Box::new(MarkerParser::with_start("progress=", started)),
                    ArtifactCheck::NonEmptyFile(out),
                )
            }
        };

    let mut proc = ProcessSupervisor::new(command).spawn()?;
    while let Some(line) = proc.next_line().await {
        if let Some(upd) = parser.consume_line(&line) {
            super::apply_progress(registry, &spec.id, &upd, started).await;
        }
    }

    let artifacts = proc.finish(&check).await?;
    let artifacts = artifacts
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    super::complete(registry, &spec.id, artifacts, started).await;
    Ok(())
}

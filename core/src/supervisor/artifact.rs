//! Post-exit artifact sanity checks.
//!
//! A zero exit code is not trusted on its own: a tool that "succeeds" while
//! leaving a missing or empty output file is still a failure.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What the supervisor verifies after a clean exit.
#[derive(Debug, Clone)]
pub enum ArtifactCheck {
    /// No artifact expected (probe-style invocations).
    None,
    /// The exact output path must exist and be non-empty.
    NonEmptyFile(PathBuf),
    /// The tool names its output itself: accept the newest non-empty file in
    /// `dir` with the given extension, modified at or after `not_before`.
    NewestMatch {
        dir: PathBuf,
        extension: String,
        not_before: SystemTime,
    },
}

/// Returns the verified artifact paths, or a diagnostic for the `Failed`
/// record.
pub async fn verify(check: &ArtifactCheck) -> Result<Vec<PathBuf>, String> {
    match check {
        ArtifactCheck::None => Ok(Vec::new()),
        ArtifactCheck::NonEmptyFile(path) => verify_non_empty(path).await.map(|p| vec![p]),
        ArtifactCheck::NewestMatch {
            dir,
            extension,
            not_before,
        } => newest_match(dir, extension, *not_before).await.map(|p| vec![p]),
    }
}

async fn verify_non_empty(path: &Path) -> Result<PathBuf, String> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(path.to_path_buf()),
        Ok(_) => Err(format!("output file is empty: {}", path.display())),
        Err(_) => Err(format!("output file missing: {}", path.display())),
    }
}

async fn newest_match(
    dir: &Path,
    extension: &str,
    not_before: SystemTime,
) -> Result<PathBuf, String> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| format!("cannot read output dir {}: {e}", dir.display()))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if meta.len() == 0 {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if modified < not_before {
            continue;
        }
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, path));
        }
    }

    newest.map(|(_, p)| p).ok_or_else(|| {
        format!(
            "no new .{extension} file found in {}",
            dir.display()
        )
    })
}

//! Source duration probe.
//!
//! `ffprobe -v error -show_entries format=duration -of
//! default=noprint_wrappers=1:nokey=1 <file>` prints a single floating-point
//! seconds value. The duration feeds the transcription progress band; when
//! the probe fails the configured fallback keeps the heuristic usable.

use std::path::Path;

use tokio::process::Command;

pub async fn media_duration_secs(ffprobe: &str, path: &Path) -> anyhow::Result<f64> {
    let output = Command::new(ffprobe)
        .args(["-v", "error", "-show_entries", "format=duration"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let duration: f64 = text.trim().parse().map_err(|_| {
        anyhow::anyhow!("ffprobe printed no parsable duration: {:?}", text.trim())
    })?;
    Ok(duration)
}

/// Probe with fallback; never fails the task over a broken probe.
pub async fn media_duration_or(ffprobe: &str, path: &Path, fallback_secs: f64) -> f64 {
    match media_duration_secs(ffprobe, path).await {
        Ok(d) if d > 0.0 => d,
        Ok(_) => fallback_secs,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "duration probe failed; using fallback");
            fallback_secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_applies_when_probe_is_unavailable() {
        let d = media_duration_or("/definitely/not/ffprobe", Path::new("x.mp4"), 3600.0).await;
        assert_eq!(d, 3600.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn parses_a_plain_seconds_value() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in probe that prints what the real one would.
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffprobe");
        std::fs::write(&fake, "#!/bin/sh\necho 120.500000\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let d = media_duration_secs(fake.to_str().unwrap(), Path::new("x.mp4"))
            .await
            .unwrap();
        assert!((d - 120.5).abs() < 1e-9);
    }
}

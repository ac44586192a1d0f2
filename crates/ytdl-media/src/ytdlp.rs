//! Primary acquisition strategy driving the yt-dlp executable.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};
use ytdl_models::{sanitize_filename, ProgressStage, Quality};

use crate::error::{FetchError, FetchResult};
use crate::fetcher::{FetchStrategy, FetchedMedia};
use crate::progress::ProgressSink;

/// Metadata fields consumed from `yt-dlp --dump-json`.
#[derive(Debug, Deserialize)]
struct VideoMetadata {
    id: String,
    title: String,
}

/// Fetches videos by shelling out to yt-dlp, remuxing to mp4 when needed.
pub struct YtDlpStrategy;

impl YtDlpStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Probe metadata without downloading anything.
    async fn probe(&self, url: &str) -> FetchResult<VideoMetadata> {
        let ytdlp = which::which("yt-dlp").map_err(|_| FetchError::YtDlpNotFound)?;

        let output = Command::new(&ytdlp)
            .args(["--dump-json", "--skip-download", "--no-playlist", url])
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::fetch_failed(stderr.trim().to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::fetch_failed(format!("unparseable metadata: {e}")))
    }

    /// Run the actual download, forwarding stdout progress to the sink.
    async fn download(
        &self,
        url: &str,
        quality: Quality,
        work_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> FetchResult<()> {
        let ytdlp = which::which("yt-dlp").map_err(|_| FetchError::YtDlpNotFound)?;
        let template = work_dir.join("%(id)s.%(ext)s");

        let mut child = Command::new(&ytdlp)
            .args(["-f", quality.format_selector()])
            .args(["-o", &template.to_string_lossy()])
            .args(["--newline", "--no-playlist", url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Drain stderr concurrently so a chatty tool cannot deadlock on a
        // full pipe while we read progress from stdout.
        let stderr = child.stderr.take().expect("stderr not captured");
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut buf = String::new();
            while let Ok(Some(line)) = lines.next_line().await {
                buf.push_str(&line);
                buf.push('\n');
            }
            buf
        });

        let stdout = child.stdout.take().expect("stdout not captured");
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(pct) = parse_progress_line(&line) {
                progress.report(ProgressStage::Downloading, pct).await;
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let stderr_buf = stderr_task.await.unwrap_or_default();
            return Err(FetchError::fetch_failed(stderr_buf.trim().to_string()));
        }
        Ok(())
    }

    /// Remux into mp4 with stream copy. Non-zero exit is fatal.
    async fn remux_to_mp4(&self, input: &Path, output: &Path) -> FetchResult<()> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| FetchError::FfmpegNotFound)?;

        debug!(input = %input.display(), output = %output.display(), "remuxing to mp4");
        let result = Command::new(&ffmpeg)
            .args(["-y", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(FetchError::merge_failed(stderr.trim().to_string()));
        }

        if let Err(e) = tokio::fs::remove_file(input).await {
            warn!(path = %input.display(), error = %e, "failed to remove pre-remux artifact");
        }
        Ok(())
    }
}

impl Default for YtDlpStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchStrategy for YtDlpStrategy {
    async fn fetch(
        &self,
        url: &str,
        quality: Quality,
        work_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> FetchResult<FetchedMedia> {
        let metadata = self.probe(url).await?;
        debug!(video_id = %metadata.id, title = %metadata.title, "probed video metadata");

        self.download(url, quality, work_dir, progress).await?;

        let artifact = find_artifact(work_dir, &metadata.id)?;
        let path = if artifact.extension().and_then(|e| e.to_str()) == Some("mp4") {
            artifact
        } else {
            progress.report(ProgressStage::Processing, 0).await;
            let output = work_dir.join(format!("{}.mp4", metadata.id));
            self.remux_to_mp4(&artifact, &output).await?;
            output
        };

        let mut stem = sanitize_filename(&metadata.title);
        if stem.is_empty() {
            stem = "video".to_string();
        }
        Ok(FetchedMedia {
            path,
            filename: format!("{stem}.mp4"),
        })
    }
}

/// Parse a percentage out of a `[download]  42.3% of ...` progress line.
fn parse_progress_line(line: &str) -> Option<u8> {
    let rest = line.trim().strip_prefix("[download]")?;
    let token = rest.split_whitespace().find(|t| t.ends_with('%'))?;
    let pct: f64 = token.trim_end_matches('%').parse().ok()?;
    Some(pct.clamp(0.0, 100.0).round() as u8)
}

/// Locate the downloaded artifact by video id, preferring the mp4 container.
fn find_artifact(work_dir: &Path, video_id: &str) -> FetchResult<PathBuf> {
    let mut fallback = None;
    for entry in std::fs::read_dir(work_dir)? {
        let path = entry?.path();
        if path.file_stem().and_then(|s| s.to_str()) != Some(video_id) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("mp4") {
            return Ok(path);
        }
        fallback = Some(path);
    }
    fallback.ok_or_else(|| {
        FetchError::fetch_failed(format!("no output file produced for video {video_id}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_progress_lines() {
        assert_eq!(
            parse_progress_line("[download]  42.3% of 10.00MiB at 2.00MiB/s ETA 00:03"),
            Some(42)
        );
        assert_eq!(parse_progress_line("[download] 100% of 10.00MiB"), Some(100));
        assert_eq!(parse_progress_line("[download] Destination: abc.mp4"), None);
        assert_eq!(parse_progress_line("[info] extracting"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn finds_artifact_preferring_mp4() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc12345678.webm"), b"x").unwrap();
        std::fs::write(dir.path().join("abc12345678.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("other.mp4"), b"x").unwrap();

        let found = find_artifact(dir.path(), "abc12345678").unwrap();
        assert_eq!(
            found.extension().and_then(|e| e.to_str()),
            Some("mp4"),
            "mp4 should win over webm"
        );
        assert!(found
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s == "abc12345678"));
    }

    #[test]
    fn missing_artifact_is_a_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_artifact(dir.path(), "abc12345678").unwrap_err();
        assert!(matches!(err, FetchError::FetchFailed(_)));
    }
}

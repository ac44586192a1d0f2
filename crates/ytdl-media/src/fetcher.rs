//! Strategy interface and primary/fallback orchestration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};
use ytdl_models::Quality;

use crate::error::{FetchError, FetchResult};
use crate::progress::ProgressSink;

/// Messages that indicate the extractor hit a sign-in or bot wall.
const BOT_DETECTION_PATTERNS: &[&str] = &[
    "sign in",
    "signin",
    "bot",
    "confirm you",
    "verify",
    "captcha",
    "unusual traffic",
    "blocked",
];

/// A downloaded media file ready for upload.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    /// Path of the artifact inside the work directory
    pub path: PathBuf,
    /// Sanitized filename to store the artifact under
    pub filename: String,
}

/// One way of acquiring a video.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Download `url` at the requested quality into `work_dir`.
    async fn fetch(
        &self,
        url: &str,
        quality: Quality,
        work_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> FetchResult<FetchedMedia>;
}

/// Check whether a primary-strategy failure looks like bot detection.
pub fn is_bot_detection(message: &str) -> bool {
    let lower = message.to_lowercase();
    BOT_DETECTION_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Refine a generic primary failure into the upstream-unavailable class
/// when the message says the video cannot be served at all.
pub fn classify_primary(error: FetchError) -> FetchError {
    match error {
        FetchError::FetchFailed(msg) => {
            let lower = msg.to_lowercase();
            if lower.contains("unavailable") || lower.contains("private") {
                FetchError::UpstreamUnavailable(msg)
            } else {
                FetchError::FetchFailed(msg)
            }
        }
        other => other,
    }
}

/// Orchestrates the primary strategy with a classified fallback.
pub struct MediaFetcher {
    primary: Box<dyn FetchStrategy>,
    fallback: Box<dyn FetchStrategy>,
}

impl MediaFetcher {
    pub fn new(primary: Box<dyn FetchStrategy>, fallback: Box<dyn FetchStrategy>) -> Self {
        Self { primary, fallback }
    }

    /// Fetch a video, retrying with the fallback strategy when the primary
    /// failure is classified as bot detection. Any other primary failure
    /// surfaces directly.
    pub async fn fetch(
        &self,
        url: &str,
        quality: Quality,
        work_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> FetchResult<FetchedMedia> {
        match self.primary.fetch(url, quality, work_dir, progress).await {
            Ok(media) => Ok(media),
            Err(FetchError::FetchFailed(msg)) if is_bot_detection(&msg) => {
                warn!(reason = %msg, "primary strategy hit bot detection, trying fallback");
                let media = self.fallback.fetch(url, quality, work_dir, progress).await?;
                info!("fallback strategy succeeded");
                Ok(media)
            }
            Err(err) => Err(classify_primary(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ytdl_models::ErrorCode;

    use crate::progress::NullSink;

    struct FixedStrategy {
        calls: AtomicUsize,
        result: fn() -> FetchResult<FetchedMedia>,
    }

    impl FixedStrategy {
        fn new(result: fn() -> FetchResult<FetchedMedia>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result,
            }
        }
    }

    #[async_trait]
    impl FetchStrategy for FixedStrategy {
        async fn fetch(
            &self,
            _url: &str,
            _quality: Quality,
            _work_dir: &Path,
            _progress: &dyn ProgressSink,
        ) -> FetchResult<FetchedMedia> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn ok_media() -> FetchResult<FetchedMedia> {
        Ok(FetchedMedia {
            path: PathBuf::from("/tmp/x/video.mp4"),
            filename: "video.mp4".to_string(),
        })
    }

    #[test]
    fn bot_detection_patterns_match_case_insensitively() {
        assert!(is_bot_detection("Sign in to confirm you're not a bot"));
        assert!(is_bot_detection("CAPTCHA required"));
        assert!(is_bot_detection("unusual traffic from your network"));
        assert!(is_bot_detection("This request was Blocked"));
        assert!(!is_bot_detection("network timed out"));
    }

    #[test]
    fn primary_failures_classify_by_message() {
        let err = classify_primary(FetchError::fetch_failed("Video unavailable"));
        assert!(matches!(err, FetchError::UpstreamUnavailable(_)));
        assert_eq!(err.error_code(), ErrorCode::UpstreamFailure);

        let err = classify_primary(FetchError::fetch_failed("This video is Private"));
        assert!(matches!(err, FetchError::UpstreamUnavailable(_)));

        let err = classify_primary(FetchError::fetch_failed("connection reset"));
        assert!(matches!(err, FetchError::FetchFailed(_)));
        assert_eq!(err.error_code(), ErrorCode::DownloadFailed);

        // Remux failures keep their class.
        let err = classify_primary(FetchError::merge_failed("exit code 1"));
        assert!(matches!(err, FetchError::MergeFailed(_)));
    }

    #[tokio::test]
    async fn bot_detection_triggers_fallback() {
        let fetcher = MediaFetcher::new(
            Box::new(FixedStrategy::new(|| {
                Err(FetchError::fetch_failed(
                    "Sign in to confirm you are not a robot",
                ))
            })),
            Box::new(FixedStrategy::new(ok_media)),
        );

        let media = fetcher
            .fetch(
                "https://youtu.be/abc12345678",
                Quality::Q720,
                Path::new("/tmp/x"),
                &NullSink,
            )
            .await
            .unwrap();
        assert_eq!(media.filename, "video.mp4");
    }

    #[tokio::test]
    async fn non_bot_failures_do_not_fall_back() {
        let fallback = Box::new(FixedStrategy::new(ok_media));
        let fetcher = MediaFetcher::new(
            Box::new(FixedStrategy::new(|| {
                Err(FetchError::fetch_failed("Video unavailable"))
            })),
            fallback,
        );

        let err = fetcher
            .fetch(
                "https://youtu.be/abc12345678",
                Quality::Q720,
                Path::new("/tmp/x"),
                &NullSink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn fallback_failure_surfaces() {
        let fetcher = MediaFetcher::new(
            Box::new(FixedStrategy::new(|| {
                Err(FetchError::fetch_failed("captcha required"))
            })),
            Box::new(FixedStrategy::new(|| {
                Err(FetchError::fetch_failed("tunnel expired"))
            })),
        );

        let err = fetcher
            .fetch(
                "https://youtu.be/abc12345678",
                Quality::Q720,
                Path::new("/tmp/x"),
                &NullSink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::FetchFailed(_)));
    }
}

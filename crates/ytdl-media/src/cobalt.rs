//! Fallback acquisition strategy using a Cobalt-compatible HTTP API.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;
use ytdl_models::{extract_video_id, ProgressStage, Quality};

use crate::error::{FetchError, FetchResult};
use crate::fetcher::{FetchStrategy, FetchedMedia};
use crate::progress::ProgressSink;

/// Settings for the Cobalt API endpoint.
#[derive(Debug, Clone)]
pub struct CobaltConfig {
    /// Base URL of the Cobalt instance
    pub api_url: String,
    /// Optional `Api-Key` credential
    pub api_key: Option<String>,
}

impl CobaltConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("COBALT_API_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            api_key: std::env::var("COBALT_API_KEY").ok(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CobaltRequest<'a> {
    url: &'a str,
    #[serde(rename = "videoQuality")]
    video_quality: &'a str,
    #[serde(rename = "filenameStyle")]
    filename_style: &'a str,
}

/// Fields consumed from the Cobalt response.
#[derive(Debug, Deserialize)]
struct CobaltResponse {
    status: String,
    #[serde(default)]
    url: Option<String>,
}

/// Fetches videos through a Cobalt instance when the primary strategy is
/// blocked. Cobalt runs server-side extraction, so it often succeeds where
/// direct extraction hits a sign-in wall.
pub struct CobaltStrategy {
    config: CobaltConfig,
    client: reqwest::Client,
}

impl CobaltStrategy {
    pub fn new(config: CobaltConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Ask Cobalt to resolve the video into a downloadable URL.
    async fn resolve(&self, url: &str, quality: Quality) -> FetchResult<String> {
        let body = CobaltRequest {
            url,
            video_quality: quality.cobalt_param(),
            filename_style: "basic",
        };

        let mut request = self
            .client
            .post(&self.config.api_url)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Api-Key {key}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::fetch_failed(format!(
                "cobalt returned HTTP {}",
                response.status()
            )));
        }

        let parsed: CobaltResponse = response.json().await?;
        match parsed.status.as_str() {
            "tunnel" | "redirect" => parsed
                .url
                .ok_or_else(|| FetchError::fetch_failed("cobalt response missing url")),
            "error" => Err(FetchError::fetch_failed("cobalt reported an error status")),
            other => Err(FetchError::fetch_failed(format!(
                "cobalt returned unrecognized status: {other}"
            ))),
        }
    }

    /// Stream the resolved URL to disk, reporting progress when the server
    /// advertises a content length.
    async fn download_to(
        &self,
        media_url: &str,
        dest: &Path,
        progress: &dyn ProgressSink,
    ) -> FetchResult<()> {
        let response = self.client.get(media_url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::fetch_failed(format!(
                "media download returned HTTP {}",
                response.status()
            )));
        }

        let total = response.content_length();
        progress.report(ProgressStage::Downloading, 0).await;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let mut last_pct: u8 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            received += chunk.len() as u64;
            file.write_all(&chunk).await?;

            if let Some(total) = total {
                if total > 0 {
                    let pct = ((received * 100) / total).min(100) as u8;
                    if pct > last_pct {
                        last_pct = pct;
                        progress.report(ProgressStage::Downloading, pct).await;
                    }
                }
            }
        }
        file.flush().await?;

        if received == 0 {
            return Err(FetchError::fetch_failed("cobalt tunnel produced no data"));
        }
        Ok(())
    }
}

#[async_trait]
impl FetchStrategy for CobaltStrategy {
    async fn fetch(
        &self,
        url: &str,
        quality: Quality,
        work_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> FetchResult<FetchedMedia> {
        let media_url = self.resolve(url, quality).await?;
        debug!("cobalt resolved media url");

        let video_id = Url::parse(url)
            .ok()
            .and_then(|u| extract_video_id(&u))
            .unwrap_or_else(|| "video".to_string());
        let filename = format!("cobalt_{video_id}.mp4");
        let dest = work_dir.join(&filename);

        self.download_to(&media_url, &dest, progress).await?;

        Ok(FetchedMedia {
            path: dest,
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::progress::NullSink;

    struct RecordingSink {
        updates: Mutex<Vec<(ProgressStage, u8)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                updates: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn report(&self, stage: ProgressStage, pct: u8) {
            self.updates.lock().await.push((stage, pct));
        }
    }

    fn strategy_for(server: &MockServer) -> CobaltStrategy {
        CobaltStrategy::new(CobaltConfig {
            api_url: server.uri(),
            api_key: None,
        })
    }

    #[tokio::test]
    async fn tunnel_status_downloads_the_file() {
        let server = MockServer::start().await;
        let payload = vec![0u8; 4096];

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(serde_json::json!({
                "videoQuality": "720",
                "filenameStyle": "basic",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "tunnel",
                "url": format!("{}/media", server.uri()),
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::new();
        let media = strategy_for(&server)
            .fetch(
                "https://youtu.be/dQw4w9WgXcQ",
                Quality::Q720,
                dir.path(),
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(media.filename, "cobalt_dQw4w9WgXcQ.mp4");
        assert_eq!(std::fs::read(&media.path).unwrap(), payload);

        let updates = sink.updates.lock().await;
        assert!(updates
            .iter()
            .all(|(stage, _)| *stage == ProgressStage::Downloading));
        // Progress is monotone and finishes at 100.
        assert!(updates.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(updates.last().unwrap().1, 100);
    }

    #[tokio::test]
    async fn api_key_is_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("Authorization", "Api-Key secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let strategy = CobaltStrategy::new(CobaltConfig {
            api_url: server.uri(),
            api_key: Some("secret".to_string()),
        });
        let dir = tempfile::tempdir().unwrap();
        let err = strategy
            .fetch(
                "https://youtu.be/dQw4w9WgXcQ",
                Quality::Q720,
                dir.path(),
                &NullSink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = strategy_for(&server)
            .fetch(
                "https://youtu.be/dQw4w9WgXcQ",
                Quality::Best,
                dir.path(),
                &NullSink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn unrecognized_status_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "picker",
                "url": "http://example.com/x",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = strategy_for(&server)
            .fetch(
                "https://youtu.be/dQw4w9WgXcQ",
                Quality::Q1080,
                dir.path(),
                &NullSink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn non_2xx_response_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = strategy_for(&server)
            .fetch(
                "https://youtu.be/dQw4w9WgXcQ",
                Quality::Q480,
                dir.path(),
                &NullSink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::FetchFailed(_)));
    }
}

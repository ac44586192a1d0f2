//! Job submission and status handlers.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::info;

use ytdl_models::{
    validate_video_url, CreateJobRequest, CreateJobResponse, JobId, JobRecord, JobStatusResponse,
};
use ytdl_queue::{DownloadJob, JobStore};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_WAIT_SECS: u64 = 300;
const MAX_WAIT_SECS: u64 = 600;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Long-poll options accepted on create and query.
#[derive(Debug, Default, Deserialize)]
pub struct WaitParams {
    /// Block until the job is terminal (or the timeout passes)
    #[serde(default)]
    pub wait: bool,
    /// Wait budget in seconds, defaults to 300 and is capped at 600
    pub timeout: Option<u64>,
}

/// `POST /api/jobs`
pub async fn create_job(
    State(state): State<AppState>,
    Query(params): Query<WaitParams>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<Response> {
    state.rate_limiter.check(&state.config.api_token).await?;

    let url = validate_video_url(&request.url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

    let record = JobRecord::new(url.as_str(), request.quality);
    let job_id = record.job_id.clone();
    state.store.create(&record).await?;
    state.queue.enqueue(&DownloadJob::new(job_id.clone())).await?;
    info!(job_id = %job_id, quality = %request.quality, "job created");

    if params.wait {
        let record = wait_for_terminal(&state.store, &job_id, params.timeout).await?;
        return Ok(Json(JobStatusResponse::from(record)).into_response());
    }

    Ok((StatusCode::CREATED, Json(CreateJobResponse::from(&record))).into_response())
}

/// `GET /api/jobs/{id}`
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<WaitParams>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job_id = JobId::from_string(id);

    let record = if params.wait {
        wait_for_terminal(&state.store, &job_id, params.timeout).await?
    } else {
        state
            .store
            .get(&job_id)
            .await?
            .ok_or(ApiError::JobNotFound)?
    };

    Ok(Json(JobStatusResponse::from(record)))
}

/// Poll the store until the job is terminal or the wait budget runs out,
/// returning the latest record either way.
async fn wait_for_terminal(
    store: &JobStore,
    job_id: &JobId,
    timeout: Option<u64>,
) -> ApiResult<JobRecord> {
    let deadline = Instant::now() + Duration::from_secs(clamp_timeout(timeout));

    loop {
        let record = store.get(job_id).await?.ok_or(ApiError::JobNotFound)?;
        if record.is_terminal() || Instant::now() >= deadline {
            return Ok(record);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn clamp_timeout(requested: Option<u64>) -> u64 {
    requested.unwrap_or(DEFAULT_WAIT_SECS).min(MAX_WAIT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_timeout_defaults_and_clamps() {
        assert_eq!(clamp_timeout(None), 300);
        assert_eq!(clamp_timeout(Some(60)), 60);
        assert_eq!(clamp_timeout(Some(600)), 600);
        assert_eq!(clamp_timeout(Some(4000)), 600);
    }

    #[test]
    fn wait_defaults_to_false() {
        let params = WaitParams::default();
        assert!(!params.wait);
        assert_eq!(params.timeout, None);
    }
}

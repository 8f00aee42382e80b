use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use job_notifications::{Error, JobDetails, JobFilter};
use serde::Deserialize;

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestJobQuery {
    /// Comma separated job types.
    pub job_types: Option<String>,
}

impl LatestJobQuery {
    fn job_types(&self) -> Vec<String> {
        self.job_types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

async fn fetch(state: &AppState, filter: JobFilter) -> Result<Json<JobDetails>, ApiError> {
    match state.jobs.latest_job(&filter).await {
        Ok(Some(job)) => Ok(Json(job.details())),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "No job found")),
        Err(Error::InvalidFilter(message)) => Err(api_error(StatusCode::BAD_REQUEST, message)),
        Err(error) => {
            tracing::warn!(error = %error, "jobs api lookup failed");
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                "Could not retrieve job status",
            ))
        }
    }
}

/// GET /api/jobs/latest/:specificationId?jobTypes=a,b
pub async fn get_latest_job(
    Extension(state): Extension<AppState>,
    Path(specification_id): Path<String>,
    Query(query): Query<LatestJobQuery>,
) -> Result<Json<JobDetails>, ApiError> {
    let filter = JobFilter::for_specification(specification_id, query.job_types());
    fetch(&state, filter).await
}

/// GET /api/jobs/:jobId
pub async fn get_job(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetails>, ApiError> {
    fetch(&state, JobFilter::for_job(job_id)).await
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use job_notifications::{CompletionStatus, JobSummary, NotificationSource, RunningStatus};

    use super::*;

    /// Records the last filter and answers with a fixed job for specification "spec-1".
    #[derive(Default)]
    struct RecordingSource {
        last_filter: Mutex<Option<JobFilter>>,
    }

    #[async_trait]
    impl NotificationSource for RecordingSource {
        async fn latest_job(&self, filter: &JobFilter) -> job_notifications::Result<Option<JobSummary>> {
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            match (filter.specification_id.as_deref(), filter.job_id.as_deref()) {
                (Some("spec-1"), _) => Ok(Some(
                    JobSummary::new("j1", RunningStatus::Completed)
                        .with_completion(CompletionStatus::Failed)
                        .with_job_type("RefreshFundingJob"),
                )),
                (_, Some("broken")) => Err(Error::UnexpectedStatus {
                    status: 500,
                    url: "http://jobs/api/jobs/broken".to_string(),
                }),
                (_, Some("")) => Err(Error::InvalidFilter("empty".to_string())),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn latest_job_passes_job_types_and_derives_status() {
        let source = Arc::new(RecordingSource::default());
        let state = AppState::new(source.clone());

        let Json(details) = get_latest_job(
            Extension(state),
            Path("spec-1".to_string()),
            Query(LatestJobQuery {
                job_types: Some("RefreshFundingJob, ,MapDatasetJob".to_string()),
            }),
        )
        .await
        .unwrap();

        assert!(details.is_failed);
        assert_eq!(details.job_description, "Refreshing funding");
        assert_eq!(
            source.last_filter.lock().unwrap().as_ref().unwrap().job_types,
            vec!["RefreshFundingJob".to_string(), "MapDatasetJob".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_job_is_not_found() {
        let state = AppState::new(Arc::new(RecordingSource::default()));

        let result = get_job(Extension(state), Path("nope".to_string())).await;

        assert_eq!(result.unwrap_err().0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upstream_failures_map_to_bad_gateway_or_bad_request() {
        let state = AppState::new(Arc::new(RecordingSource::default()));

        let broken = get_job(Extension(state.clone()), Path("broken".to_string())).await;
        assert_eq!(broken.unwrap_err().0, StatusCode::BAD_GATEWAY);

        let invalid = get_job(Extension(state), Path(String::new())).await;
        assert_eq!(invalid.unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

use crate::{Error, JobFilter, JobSummary, Result};

/// Anything that can answer "what is the latest job for this filter".
///
/// The watcher and the server only talk to this trait, so the real jobs API
/// can be swapped for a fake in tests.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn latest_job(&self, filter: &JobFilter) -> Result<Option<JobSummary>>;
}

#[async_trait]
impl<S: NotificationSource + ?Sized> NotificationSource for Arc<S> {
    async fn latest_job(&self, filter: &JobFilter) -> Result<Option<JobSummary>> {
        (**self).latest_job(filter).await
    }
}

#[derive(Debug, Clone)]
pub struct JobsApiClient {
    client: reqwest::Client,
    base_url: Url,
    authorization: Option<HeaderValue>,
}

impl JobsApiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let authorization = api_key
            .map(|key| {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|_| Error::InvalidApiKey)?;
                value.set_sensitive(true);
                Ok::<_, Error>(value)
            })
            .transpose()?;
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
            base_url,
            authorization,
        })
    }

    /// `GET api/jobs/{jobId}` for a single job, otherwise
    /// `GET api/jobs/latest/{specificationId}?jobTypes=a,b`.
    pub fn job_url(&self, filter: &JobFilter) -> Result<Url> {
        let mut url = self.base_url.clone();
        let mut path: Vec<&str> = vec!["api", "jobs"];
        let job_id = filter.job_id.as_deref().filter(|id| !id.is_empty());

        match (job_id, &filter.specification_id) {
            (Some(job_id), _) => path.push(job_id),
            (_, Some(specification_id)) if !specification_id.is_empty() => {
                path.push("latest");
                path.push(specification_id);
            }
            _ => {
                return Err(Error::InvalidFilter(
                    "a job id or specification id is required".to_string(),
                ))
            }
        }

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path);
        }
        if job_id.is_none() && !filter.job_types.is_empty() {
            url.query_pairs_mut()
                .append_pair("jobTypes", &filter.job_types.join(","));
        }
        Ok(url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(value) = &self.authorization {
            headers.insert(AUTHORIZATION, value.clone());
        }
        headers
    }
}

#[async_trait]
impl NotificationSource for JobsApiClient {
    async fn latest_job(&self, filter: &JobFilter) -> Result<Option<JobSummary>> {
        let url = self.job_url(filter)?;
        tracing::trace!(url = %url, "fetching latest job");

        let response = self
            .client
            .get(url.clone())
            .headers(self.headers())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<JobSummary>().await?)),
            status => Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::{CompletionStatus, RunningStatus};

    fn client(base: &str) -> JobsApiClient {
        JobsApiClient::new(base, None).unwrap()
    }

    #[test]
    fn builds_latest_job_url_with_job_types() {
        let filter = JobFilter::for_specification(
            "spec-1",
            vec!["RefreshFundingJob".to_string(), "MapDatasetJob".to_string()],
        );

        let url = client("https://jobs.example.com/").job_url(&filter).unwrap();

        assert_eq!(
            url.as_str(),
            "https://jobs.example.com/api/jobs/latest/spec-1?jobTypes=RefreshFundingJob%2CMapDatasetJob"
        );
    }

    #[test]
    fn builds_single_job_url_under_a_base_path() {
        let url = client("https://gateway.example.com/jobs-service")
            .job_url(&JobFilter::for_job("job 7"))
            .unwrap();

        assert_eq!(url.as_str(), "https://gateway.example.com/jobs-service/api/jobs/job%207");
    }

    #[test]
    fn job_id_takes_precedence_over_specification() {
        let filter = JobFilter {
            specification_id: Some("spec".to_string()),
            job_id: Some("job".to_string()),
            job_types: vec!["RefreshFundingJob".to_string()],
        };

        let url = client("http://localhost:5000").job_url(&filter).unwrap();

        assert_eq!(url.as_str(), "http://localhost:5000/api/jobs/job");
    }

    #[test]
    fn empty_filter_is_rejected() {
        let result = client("http://localhost:5000").job_url(&JobFilter::default());

        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(JobsApiClient::new("not a url", None).is_err());
        assert!(JobsApiClient::new("mailto:jobs@example.com", None).is_err());
    }

    #[test]
    fn sends_bearer_key_when_configured() {
        let client = JobsApiClient::new("http://localhost", Some("k3y".to_string())).unwrap();

        let headers = client.headers();

        assert_eq!(headers[AUTHORIZATION], "Bearer k3y");
    }

    #[test]
    fn malformed_api_key_is_rejected_up_front() {
        let result = JobsApiClient::new("http://localhost", Some("k3y\nInjected: 1".to_string()));

        assert!(matches!(result, Err(Error::InvalidApiKey)));
    }

    #[test]
    fn empty_job_id_falls_back_to_latest_with_job_types() {
        let filter = JobFilter {
            specification_id: Some("spec".to_string()),
            job_id: Some(String::new()),
            job_types: vec!["RefreshFundingJob".to_string()],
        };

        let url = client("http://localhost:5000").job_url(&filter).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/jobs/latest/spec?jobTypes=RefreshFundingJob"
        );
    }

    /// Serves one canned HTTP response on a local port and hands back the
    /// request head it received.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = if status.starts_with("204") {
            format!("HTTP/1.1 {}\r\nconnection: close\r\n\r\n", status)
        } else {
            format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
        };

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn parses_a_camel_case_job_body() {
        let body = r#"{
            "jobId": "j1",
            "jobType": "RefreshFundingJob",
            "specificationId": "spec-1",
            "runningStatus": "Completed",
            "completionStatus": "Succeeded",
            "lastUpdated": "2024-03-01T09:30:00Z"
        }"#;
        let (base, request) = serve_once("200 OK", body).await;
        let client = JobsApiClient::new(&base, Some("k3y".to_string())).unwrap();
        let filter = JobFilter::for_specification("spec-1", vec!["RefreshFundingJob".to_string()]);

        let job = client.latest_job(&filter).await.unwrap().unwrap();

        assert_eq!(job.job_id, "j1");
        assert_eq!(job.job_type.as_deref(), Some("RefreshFundingJob"));
        assert_eq!(job.running_status, RunningStatus::Completed);
        assert_eq!(job.completion_status, Some(CompletionStatus::Succeeded));
        assert_eq!(
            job.last_updated,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
        );

        let head = request.await.unwrap().to_lowercase();
        assert!(head.starts_with("get /api/jobs/latest/spec-1?jobtypes=refreshfundingjob "));
        assert!(head.contains("authorization: bearer k3y"));
    }

    #[tokio::test]
    async fn not_found_means_no_job() {
        let (base, _) = serve_once("404 Not Found", "").await;

        let job = client(&base).latest_job(&JobFilter::for_job("j1")).await.unwrap();

        assert!(job.is_none());
    }

    #[tokio::test]
    async fn no_content_means_no_job() {
        let (base, _) = serve_once("204 No Content", "").await;

        let job = client(&base).latest_job(&JobFilter::for_job("j1")).await.unwrap();

        assert!(job.is_none());
    }

    #[tokio::test]
    async fn server_error_is_an_unexpected_status() {
        let (base, _) = serve_once("500 Internal Server Error", r#"{"message":"boom"}"#).await;

        let result = client(&base).latest_job(&JobFilter::for_job("j1")).await;

        match result {
            Err(Error::UnexpectedStatus { status, url }) => {
                assert_eq!(status, 500);
                assert!(url.ends_with("/api/jobs/j1"));
            }
            other => panic!("expected unexpected status, got {:?}", other),
        }
    }
}

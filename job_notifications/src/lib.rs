pub mod error;
pub mod jobs_api;
pub mod search;
pub mod status;
pub mod store;
pub mod utils;
pub mod watcher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::{Error, ErrorMessage, ErrorSummary, Result};
pub use jobs_api::{JobsApiClient, NotificationSource};
pub use search::{FacetPanel, SearchCriteria};
pub use status::{JobDetails, StatusCategory};
pub use store::{MergeOutcome, NotificationStore};
pub use watcher::JobWatcher;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunningStatus {
    Queued,
    QueuedWithService,
    InProgress,
    Completing,
    Completed,
}

/// Terminal outcome of a job. Only meaningful once the job is `Completed`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionStatus {
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
    Superseded,
}

/// Latest known state of one backend job, as reported by the jobs API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_id: String,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub specification_id: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub parent_job_id: Option<String>,
    #[serde(default)]
    pub invoker_user_display_name: Option<String>,
    pub running_status: RunningStatus,
    #[serde(default)]
    pub completion_status: Option<CompletionStatus>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outcome: Option<String>,
}

impl JobSummary {
    pub fn new(job_id: impl Into<String>, running_status: RunningStatus) -> Self {
        Self {
            job_id: job_id.into(),
            job_type: None,
            specification_id: None,
            entity_id: None,
            parent_job_id: None,
            invoker_user_display_name: None,
            running_status,
            completion_status: None,
            created: None,
            last_updated: None,
            outcome: None,
        }
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = Some(last_updated);
        self
    }

    pub fn with_completion(mut self, completion_status: CompletionStatus) -> Self {
        self.running_status = RunningStatus::Completed;
        self.completion_status = Some(completion_status);
        self
    }

    pub fn with_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }
}

/// What a subscription is interested in. Either a single job id, or the
/// latest job for a specification (optionally narrowed by job type).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    #[serde(default)]
    pub specification_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_types: Vec<String>,
}

impl JobFilter {
    pub fn for_specification(specification_id: impl Into<String>, job_types: Vec<String>) -> Self {
        Self {
            specification_id: Some(specification_id.into()),
            job_id: None,
            job_types,
        }
    }

    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            specification_id: None,
            job_id: Some(job_id.into()),
            job_types: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobSubscription {
    pub id: String,
    pub filter: JobFilter,
    pub is_enabled: bool,
}

impl JobSubscription {
    pub fn new(filter: JobFilter) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filter,
            is_enabled: true,
        }
    }

    pub fn with_id(id: impl Into<String>, filter: JobFilter) -> Self {
        Self {
            id: id.into(),
            filter,
            is_enabled: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionRef {
    pub id: String,
}

/// A job status event for one subscription. `latest_job == None` is a valid
/// "no job yet" signal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobNotification {
    pub subscription: SubscriptionRef,
    #[serde(default)]
    pub latest_job: Option<JobSummary>,
}

impl JobNotification {
    pub fn new(subscription_id: impl Into<String>, latest_job: Option<JobSummary>) -> Self {
        Self {
            subscription: SubscriptionRef {
                id: subscription_id.into(),
            },
            latest_job,
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription.id
    }

    /// Missing job or missing timestamp both yield `None`, which orders
    /// before any real timestamp.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.latest_job.as_ref().and_then(|job| job.last_updated)
    }
}

/// Store entry. The winning event is kept whole, so an entry has exactly
/// the shape of the event that produced it.
pub type Notification = JobNotification;

use serde::Serialize;

use crate::{CompletionStatus, JobSummary, RunningStatus};

/// Coarse outcome bucket that every banner renders from.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Queued,
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
    Superseded,
}

/// Completed with no completion status is treated as success.
pub fn status_category(
    running_status: RunningStatus,
    completion_status: Option<CompletionStatus>,
) -> StatusCategory {
    match (running_status, completion_status) {
        (RunningStatus::Queued | RunningStatus::QueuedWithService, _) => StatusCategory::Queued,
        (RunningStatus::InProgress | RunningStatus::Completing, _) => StatusCategory::InProgress,
        (RunningStatus::Completed, None | Some(CompletionStatus::Succeeded)) => {
            StatusCategory::Succeeded
        }
        (RunningStatus::Completed, Some(CompletionStatus::Failed)) => StatusCategory::Failed,
        (RunningStatus::Completed, Some(CompletionStatus::Cancelled)) => StatusCategory::Cancelled,
        (RunningStatus::Completed, Some(CompletionStatus::TimedOut)) => StatusCategory::TimedOut,
        (RunningStatus::Completed, Some(CompletionStatus::Superseded)) => {
            StatusCategory::Superseded
        }
    }
}

impl StatusCategory {
    pub fn is_active(self) -> bool {
        matches!(self, StatusCategory::Queued | StatusCategory::InProgress)
    }

    pub fn is_complete(self) -> bool {
        !self.is_active()
    }

    pub fn is_successful(self) -> bool {
        self == StatusCategory::Succeeded
    }

    pub fn is_failed(self) -> bool {
        self.is_complete() && !self.is_successful()
    }

    pub fn description(self) -> &'static str {
        match self {
            StatusCategory::Queued => "Job in queue",
            StatusCategory::InProgress => "Job in progress",
            StatusCategory::Succeeded => "Job completed successfully",
            StatusCategory::Failed => "Job failed",
            StatusCategory::Cancelled => "Job cancelled",
            StatusCategory::TimedOut => "Job timed out",
            StatusCategory::Superseded => "Job superseded",
        }
    }
}

/// Human readable phrase for a job type. Unknown types are shown as-is.
pub fn job_description(job_type: Option<&str>) -> String {
    let phrase = match job_type {
        None => return "Job".to_string(),
        Some("CreateInstructAllocationJob") => "Calculating specification",
        Some("CreateInstructGenerateAggregationsAllocationJob") => "Calculating aggregations",
        Some("AssignTemplateCalculationsJob") => "Assigning template calculations",
        Some("GenerateCalcCsvResultsJob") => "Generating calculation results CSV",
        Some("GenerateCalculationAggregationsJob") => "Generating calculation aggregations",
        Some("MapDatasetJob") => "Mapping dataset",
        Some("MapFdzDatasetsJob") => "Mapping FDZ datasets",
        Some("RefreshFundingJob") => "Refreshing funding",
        Some("ApproveAllProviderFundingJob") => "Approving all provider funding",
        Some("ApproveBatchProviderFundingJob") => "Approving batch provider funding",
        Some("PublishAllProviderFundingJob") => "Releasing all provider funding",
        Some("PublishBatchProviderFundingJob") => "Releasing batch provider funding",
        Some("ReIndexPublishedProvidersJob") => "Re-indexing published providers",
        Some("GeneratePublishedFundingCsvJob") => "Generating published funding CSV",
        Some("ProviderSnapshotDataLoadJob") => "Loading provider snapshot data",
        Some(other) => return other.to_string(),
    };
    phrase.to_string()
}

/// A job summary together with everything banners derive from it.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    #[serde(flatten)]
    pub summary: JobSummary,
    pub category: StatusCategory,
    pub is_active: bool,
    pub is_complete: bool,
    pub is_failed: bool,
    pub is_successful: bool,
    pub status_description: String,
    pub job_description: String,
}

impl From<JobSummary> for JobDetails {
    fn from(summary: JobSummary) -> Self {
        let category = status_category(summary.running_status, summary.completion_status);
        let job_description = job_description(summary.job_type.as_deref());
        Self {
            category,
            is_active: category.is_active(),
            is_complete: category.is_complete(),
            is_failed: category.is_failed(),
            is_successful: category.is_successful(),
            status_description: category.description().to_string(),
            job_description,
            summary,
        }
    }
}

impl JobSummary {
    pub fn category(&self) -> StatusCategory {
        status_category(self.running_status, self.completion_status)
    }

    pub fn is_active(&self) -> bool {
        self.category().is_active()
    }

    pub fn is_complete(&self) -> bool {
        self.running_status == RunningStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.category().is_failed()
    }

    pub fn is_successful(&self) -> bool {
        self.category().is_successful()
    }

    pub fn details(&self) -> JobDetails {
        JobDetails::from(self.clone())
    }
}

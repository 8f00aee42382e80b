use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::{ErrorSummary, Notification, Result};

pub fn save_json<T: Serialize + ?Sized>(data: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    file.write_all(serde_json::to_string_pretty(data)?.as_bytes())?;
    tracing::info!(path = %path.as_ref().display(), "wrote json snapshot");
    Ok(())
}

pub fn save_text(content: &str, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    file.write_all(content.as_bytes())?;
    tracing::info!(path = %path.as_ref().display(), "wrote text report");
    Ok(())
}

/// One status line per notification, the text a job banner would show.
pub fn banner_line(notification: &Notification) -> String {
    let Some(job) = &notification.latest_job else {
        return format!("[{}] no job found", notification.subscription.id);
    };
    let details = job.details();
    let mut line = format!(
        "[{}] {}: {} (job {})",
        notification.subscription.id, details.job_description, details.status_description, job.job_id
    );
    if let Some(when) = job.last_updated {
        line.push_str(&format!(" at {}", when.to_rfc3339()));
    }
    if details.is_failed {
        if let Some(outcome) = &job.outcome {
            line.push_str(&format!(" - {}", outcome));
        }
    }
    line
}

pub fn report(notifications: &[Notification], errors: &ErrorSummary) -> String {
    let mut report = String::new();
    for notification in notifications {
        report.push_str(&banner_line(notification));
        report.push('\n');
    }
    for error in errors.messages() {
        match &error.subscription_id {
            Some(id) => report.push_str(&format!("[{}] error: {}\n", id, error.message)),
            None => report.push_str(&format!("error: {}\n", error.message)),
        }
    }
    report
}

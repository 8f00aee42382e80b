use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::{
    ErrorSummary, JobNotification, JobSubscription, NotificationSource, NotificationStore,
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interval: Duration,
    /// Stop after this many polls. `None` polls until stopped some other way.
    pub max_polls: Option<usize>,
    /// Stop once every enabled subscription has a completed job.
    pub until_complete: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_polls: None,
            until_complete: false,
        }
    }
}

/// Polls a [`NotificationSource`] for each subscription and merges the
/// results into one private [`NotificationStore`].
///
/// Fetches run concurrently but merging happens on the caller's task, in
/// subscription order, so the store only ever has one writer.
pub struct JobWatcher<S> {
    source: S,
    subscriptions: Vec<JobSubscription>,
    store: NotificationStore,
    errors: ErrorSummary,
    concurrency: usize,
}

impl<S: NotificationSource> JobWatcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            subscriptions: Vec::new(),
            store: NotificationStore::new(),
            errors: ErrorSummary::new(),
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn add_subscription(&mut self, subscription: JobSubscription) {
        self.subscriptions.retain(|s| s.id != subscription.id);
        self.subscriptions.push(subscription);
    }

    pub fn remove_subscription(&mut self, subscription_id: &str) {
        self.subscriptions.retain(|s| s.id != subscription_id);
        self.store.remove(subscription_id);
        self.errors.clear_subscription(subscription_id);
    }

    pub fn replace_subscriptions(&mut self, subscriptions: Vec<JobSubscription>) {
        let stale: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|old| !subscriptions.iter().any(|new| new.id == old.id))
            .map(|old| old.id.clone())
            .collect();
        for id in stale {
            self.store.remove(&id);
            self.errors.clear_subscription(&id);
        }
        self.subscriptions = subscriptions;
    }

    pub fn remove_all_subscriptions(&mut self) {
        self.subscriptions.clear();
        self.store.clear();
        self.errors.clear();
    }

    pub fn subscriptions(&self) -> &[JobSubscription] {
        &self.subscriptions
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn errors(&self) -> &ErrorSummary {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// True when every enabled subscription has seen a completed job.
    pub fn all_complete(&self) -> bool {
        self.subscriptions
            .iter()
            .filter(|s| s.is_enabled)
            .all(|s| {
                self.store
                    .get(&s.id)
                    .and_then(|n| n.latest_job.as_ref())
                    .is_some_and(|job| job.is_complete())
            })
    }

    /// Fetches once for every enabled subscription. Returns how many store
    /// entries changed.
    ///
    /// A failure replaces that subscription's previous error and a success
    /// clears it, so the summary holds at most one message per subscription.
    pub async fn poll_once(&mut self) -> usize {
        let enabled: Vec<JobSubscription> = self
            .subscriptions
            .iter()
            .filter(|s| s.is_enabled)
            .cloned()
            .collect();

        let source = &self.source;
        let results = stream::iter(enabled)
            .map(|subscription| async move {
                let result = source.latest_job(&subscription.filter).await;
                (subscription, result)
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut changed = 0;
        for (subscription, result) in results {
            match result {
                Ok(latest_job) => {
                    self.errors.clear_subscription(&subscription.id);
                    let before = self.store.get(&subscription.id).cloned();
                    self.store
                        .add_notification(JobNotification::new(subscription.id.clone(), latest_job));
                    if self.store.get(&subscription.id) != before.as_ref() {
                        changed += 1;
                    }
                }
                Err(error) => {
                    tracing::warn!(subscription_id = %subscription.id, error = %error, "failed to fetch latest job");
                    self.errors.set_error(
                        &subscription.id,
                        format!("Could not check job status: {}", error),
                    );
                }
            }
        }
        changed
    }

    /// Polls on a fixed interval, calling `on_change` after every poll that
    /// changed the store or the error summary. Returns the number of polls
    /// made.
    pub async fn run<F>(&mut self, options: &RunOptions, mut on_change: F) -> usize
    where
        F: FnMut(&NotificationStore, &ErrorSummary),
    {
        let mut ticker = tokio::time::interval(options.interval);
        let mut polls = 0;
        loop {
            ticker.tick().await;
            let errors_before = self.errors.messages().to_vec();
            let changed = self.poll_once().await;
            polls += 1;
            if changed > 0 || self.errors.messages() != errors_before.as_slice() {
                on_change(&self.store, &self.errors);
            }

            if options.max_polls.is_some_and(|max| polls >= max) {
                break;
            }
            if options.until_complete && self.all_complete() {
                tracing::info!(polls, "all watched jobs complete");
                break;
            }
        }
        polls
    }
}

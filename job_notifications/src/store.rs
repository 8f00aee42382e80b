use std::collections::HashMap;

use serde::Serialize;

use crate::{JobNotification, Notification};

/// What `add_notification` did with an incoming event.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MergeOutcome {
    /// First event for this subscription.
    Inserted,
    /// Event was at least as recent as the stored one and replaced it.
    Replaced,
    /// Event was older than the stored one.
    Ignored,
}

/// Latest job notification per subscription.
///
/// Holds at most one entry per subscription id. An incoming event replaces
/// the stored entry when its `last_updated` is not earlier than the stored
/// one, so equal timestamps resolve to the most recently added event. A
/// missing timestamp orders before any real timestamp. Entries keep their
/// first-insertion order.
#[derive(Debug, Default, Clone)]
pub struct NotificationStore {
    entries: Vec<Notification>,
    index: HashMap<String, usize>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notification(&mut self, notification: JobNotification) -> MergeOutcome {
        let id = notification.subscription_id().to_string();

        let Some(&position) = self.index.get(&id) else {
            tracing::debug!(subscription_id = %id, "tracking new subscription");
            self.index.insert(id, self.entries.len());
            self.entries.push(notification);
            return MergeOutcome::Inserted;
        };

        let stored = &mut self.entries[position];
        if notification.last_updated() >= stored.last_updated() {
            tracing::debug!(
                subscription_id = %id,
                job_id = ?notification.latest_job.as_ref().map(|job| &job.job_id),
                "replacing notification"
            );
            *stored = notification;
            MergeOutcome::Replaced
        } else {
            tracing::debug!(subscription_id = %id, "ignoring stale notification");
            MergeOutcome::Ignored
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.entries
    }

    pub fn get(&self, subscription_id: &str) -> Option<&Notification> {
        self.index
            .get(subscription_id)
            .map(|&position| &self.entries[position])
    }

    /// Drops the entry for one subscription, e.g. when its owner unsubscribes.
    pub fn remove(&mut self, subscription_id: &str) -> Option<Notification> {
        let position = self.index.remove(subscription_id)?;
        let removed = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

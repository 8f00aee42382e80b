use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("jobs api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("jobs api returned {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid job filter: {0}")]
    InvalidFilter(String),

    #[error("jobs api key is not a valid header value")]
    InvalidApiKey,

    #[error("invalid jobs api url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub subscription_id: Option<String>,
    pub message: String,
}

/// Errors collected for display in a summary banner. Nothing here retries;
/// the user (or the next scheduled poll) does.
#[derive(Debug, Default, Clone)]
pub struct ErrorSummary {
    messages: Vec<ErrorMessage>,
}

impl ErrorSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, subscription_id: Option<&str>, message: impl Into<String>) {
        self.messages.push(ErrorMessage {
            subscription_id: subscription_id.map(str::to_string),
            message: message.into(),
        });
    }

    /// Keeps at most one message per subscription: a new failure replaces the
    /// previous one. Returns whether the summary changed.
    pub fn set_error(&mut self, subscription_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        match self
            .messages
            .iter()
            .position(|m| m.subscription_id.as_deref() == Some(subscription_id))
        {
            Some(index) if self.messages[index].message == message => false,
            Some(index) => {
                self.messages[index].message = message;
                true
            }
            None => {
                self.add_error(Some(subscription_id), message);
                true
            }
        }
    }

    /// Drops the message for one subscription. Returns whether there was one.
    pub fn clear_subscription(&mut self, subscription_id: &str) -> bool {
        let before = self.messages.len();
        self.messages
            .retain(|m| m.subscription_id.as_deref() != Some(subscription_id));
        self.messages.len() != before
    }

    pub fn messages(&self) -> &[ErrorMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

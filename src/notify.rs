use crate::credentials::Credential;
use crate::error::{FailureCategory, NotificationError};
use crate::utils::truncate_message;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use url::Url;

/// The kind of change announced for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum Action {
    #[serde(rename = "URL_UPDATED")]
    Updated,
    #[serde(rename = "URL_DELETED")]
    Deleted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Updated => "URL_UPDATED",
            Action::Deleted => "URL_DELETED",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL to announce, together with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTask {
    pub url: String,
    pub action: Action,
}

impl NotificationTask {
    pub fn new(url: impl Into<String>, action: Action) -> Self {
        Self {
            url: url.into(),
            action,
        }
    }
}

/// Result of a single task. Only used for logging and the run summary.
#[derive(Debug)]
pub struct NotificationOutcome {
    pub task: NotificationTask,
    pub result: Result<(), NotificationError>,
}

impl NotificationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure_category(&self) -> Option<FailureCategory> {
        self.result.as_ref().err().map(NotificationError::category)
    }

    /// Writes the success or failure line for this outcome.
    pub fn log(&self) {
        let NotificationTask { url, action } = &self.task;
        match &self.result {
            Ok(()) => tracing::info!("Successfully notified for {action}: {url}"),
            Err(e) => tracing::error!(
                category = %e.category(),
                "Failed to notify for {action}: {url} - {e}"
            ),
        }
    }
}

/// Anything that can deliver a notification. The worker pool only sees this.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, task: &NotificationTask) -> Result<(), NotificationError>;
}

/// Request body accepted by the indexing endpoint.
#[derive(Debug, Serialize)]
struct NotificationBody<'a> {
    url: &'a str,
    #[serde(rename = "type")]
    action: Action,
}

/// Sends notifications to the indexing endpoint over one shared client.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    endpoint: Url,
    credential: Credential,
}

impl Dispatcher {
    pub fn new(client: Client, endpoint: Url, credential: Credential) -> Self {
        Self {
            client,
            endpoint,
            credential,
        }
    }
}

#[async_trait]
impl Notifier for Dispatcher {
    async fn notify(&self, task: &NotificationTask) -> Result<(), NotificationError> {
        tracing::debug!(url = %task.url, action = %task.action, "Sending notification");
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.credential.token())
            .json(&NotificationBody {
                url: &task.url,
                action: task.action,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotificationError::Status {
            status,
            body: truncate_message(body.trim(), 200),
        })
    }
}

use crate::credentials::{CredentialProvider, Secret};
use crate::error::{AuthError, Error, NotificationError};
use crate::network;
use crate::notify::{Dispatcher, NotificationOutcome, NotificationTask, Notifier};
use crate::options::Settings;
use crate::report::Summary;
use crate::sitemap;
use futures::future::join_all;
use std::fmt;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use url::Url;

/// Steps of a run, in order. Failure in any of them ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Authenticate,
    FetchSitemap,
    DispatchAll,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Stage::Init => "init",
            Stage::Authenticate => "[1/3] authenticate",
            Stage::FetchSitemap => "[2/3] fetch sitemap",
            Stage::DispatchAll => "[3/3] dispatch notifications",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

/// Sends every task through `notifier`, never more than `limit` at once.
///
/// Tasks complete in any order; the returned outcomes follow the order of
/// `tasks`. A failing or panicking task only affects its own outcome.
pub async fn dispatch_all<N: Notifier>(
    notifier: Arc<N>,
    tasks: Vec<NotificationTask>,
    limit: usize,
) -> Vec<NotificationOutcome> {
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));

    let handles = tasks.into_iter().map(|task| {
        let semaphore = Arc::clone(&semaphore);
        let notifier = Arc::clone(&notifier);
        let spawned_task = task.clone();

        let handle = tokio::spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => notifier.notify(&spawned_task).await,
                Err(e) => Err(NotificationError::Task(e.to_string())),
            };
            let outcome = NotificationOutcome {
                task: spawned_task,
                result,
            };
            outcome.log();
            outcome
        });
        (task, handle)
    });

    let (tasks, handles): (Vec<_>, Vec<_>) = handles.unzip();
    let results = join_all(handles).await;

    tasks
        .into_iter()
        .zip(results)
        .map(|(task, joined)| {
            joined.unwrap_or_else(|e| {
                let outcome = NotificationOutcome {
                    task,
                    result: Err(NotificationError::Task(e.to_string())),
                };
                outcome.log();
                outcome
            })
        })
        .collect()
}

/// Runs the whole pipeline: authenticate, read the sitemap, notify every URL.
#[derive(Debug)]
pub struct Indexer {
    settings: Settings,
    secret: Option<Secret>,
    sitemap_url: Url,
    basic_auth: Option<String>,
}

impl Indexer {
    pub fn new(settings: Settings, secret: Option<Secret>, sitemap_url: Url) -> Self {
        Self {
            settings,
            secret,
            sitemap_url,
            basic_auth: None,
        }
    }

    /// Basic auth for the sitemap host only.
    pub fn with_basic_auth(mut self, basic_auth: Option<String>) -> Self {
        self.basic_auth = basic_auth;
        self
    }

    /// Runs to completion and maps the result to a process exit code.
    pub async fn run(&self) -> ExitCode {
        match self.execute().await {
            Ok(summary) => {
                summary.log();
                summary.show_text_report();
                tracing::debug!(stage = %Stage::Done, "Run finished");
                summary.exit_code(self.settings.exit_policy)
            }
            Err(e) => {
                tracing::error!("{e}");
                ExitCode::FAILURE
            }
        }
    }

    /// Runs the pipeline and returns the per-URL outcomes.
    ///
    /// Authentication happens strictly before dispatch, so the credential is
    /// never refreshed while notifications read it.
    pub async fn execute(&self) -> Result<Summary, Error> {
        let start_time = Instant::now();
        tracing::debug!(stage = %Stage::Init, sitemap_url = %self.sitemap_url, "Starting run");
        let api_client = network::build_api_client(&self.settings)?;

        tracing::info!("{}", Stage::Authenticate);
        let secret = self.secret.as_ref().ok_or(AuthError::MissingSecret)?;
        let provider = CredentialProvider::from_secret(secret, &self.settings, api_client.clone())?;
        let credential = provider.acquire().await?;

        tracing::info!("{} {}", Stage::FetchSitemap, self.sitemap_url);
        let sitemap_client =
            network::build_sitemap_client(&self.settings, self.basic_auth.as_deref())?;
        let urls = sitemap::fetch(self.sitemap_url.as_str(), &sitemap_client).await?;
        if urls.is_empty() {
            return Err(Error::NoUrls {
                sitemap_url: self.sitemap_url.to_string(),
            });
        }

        tracing::info!("{} ({} URLs)", Stage::DispatchAll, urls.len());
        let dispatcher = Arc::new(Dispatcher::new(
            api_client,
            self.settings.endpoint.clone(),
            credential,
        ));
        let tasks = urls
            .into_iter()
            .map(|url| NotificationTask::new(url, self.settings.action))
            .collect();
        let outcomes = dispatch_all(dispatcher, tasks, self.settings.concurrency_limit).await;

        Ok(Summary {
            sitemap_url: self.sitemap_url.to_string(),
            action: self.settings.action,
            concurrency_limit: self.settings.concurrency_limit,
            total_time: start_time.elapsed(),
            outcomes,
        })
    }
}

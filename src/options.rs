use crate::credentials::Secret;
use crate::notify::Action;
use crate::report::ExitPolicy;
use crate::retry::RetryPolicy;
use crate::utils::validate_basic_auth;
use clap::{Parser, ValueHint, value_parser};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default values used throughout the project.
pub mod defaults {
    /// Indexing API endpoint that receives one notification per URL.
    pub const ENDPOINT: &str = "https://indexing.googleapis.com/v3/urlNotifications:publish";

    /// OAuth scopes requested for the service account.
    pub const SCOPES: [&str; 2] = [
        "https://www.googleapis.com/auth/indexing",
        "https://www.googleapis.com/auth/webmasters",
    ];

    /// Maximum number of notifications in flight at once.
    pub const CONCURRENCY: usize = 10;

    /// The default timeout for network requests, in seconds.
    pub const TIMEOUT: u64 = 10;

    /// Attempts made when exchanging the secret for a token.
    pub const AUTH_ATTEMPTS: u32 = 3;

    /// Pause between two token exchange attempts, in seconds.
    pub const AUTH_RETRY_DELAY: u64 = 2;

    /// The default user agent header value used for network requests.
    pub const USER_AGENT: &str = concat!("sitenotify/", env!("CARGO_PKG_VERSION"));

    /// Log file written next to the console output.
    pub const LOG_FILE: &str = "app.log";
}

fn expand_path(s: &str) -> Result<PathBuf, String> {
    Ok(PathBuf::from(shellexpand::tilde(s).into_owned()))
}

#[derive(Debug, Parser)]
#[command(version, about, term_width = 80)]
pub struct Cli {
    #[arg(
        env = "SITEMAP_URL",
        help = "The URL of the sitemap whose URLs should be announced.",
        value_hint = ValueHint::Url,
        value_parser = value_parser!(Url)
    )]
    pub sitemap_url: Url,

    #[arg(
        short = 'k',
        long,
        env = "GOOGLE_SERVICE_ACCOUNT_FILE",
        help = "Path to the service-account JSON key",
        value_hint = ValueHint::FilePath,
        value_parser = expand_path
    )]
    pub key_file: Option<PathBuf>,

    #[arg(
        long,
        env = "API_KEY",
        hide_env_values = true,
        help = "Inline service-account JSON key, raw or base64 encoded. Takes precedence over --key-file"
    )]
    pub key_json: Option<String>,

    #[arg(
        long,
        value_enum,
        help = "Notification type sent for every URL",
        default_value_t = Action::Updated
    )]
    pub action: Action,

    #[arg(
        long,
        help = "Basic authentication credentials for the sitemap host in the format `username:password`",
        value_parser = validate_basic_auth,
    )]
    pub basic_auth: Option<String>,

    #[arg(
        long,
        help = "Exit with status 1 when any notification failed, not only on fatal errors"
    )]
    pub fail_on_error: bool,

    #[arg(
        long,
        help = "File the log is written to, in addition to the console",
        value_hint = ValueHint::FilePath,
        default_value = defaults::LOG_FILE,
        value_parser = expand_path
    )]
    pub log_file: PathBuf,

    #[arg(long, help = "Only log to the console", conflicts_with = "log_file")]
    pub no_log_file: bool,

    #[arg(short = 'v', long, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long,
        help = "Custom User-Agent header to be used in requests",
        default_value_t = defaults::USER_AGENT.to_string(),
    )]
    pub user_agent: String,

    #[arg(
        long,
        hide = true,
        default_value = defaults::ENDPOINT,
        value_parser = value_parser!(Url)
    )]
    pub endpoint: Url,
}

impl Cli {
    /// The service-account secret, preferring inline key material over a path.
    pub fn secret(&self) -> Option<Secret> {
        if let Some(json) = self.key_json.as_ref().filter(|s| !s.trim().is_empty()) {
            return Some(Secret::Inline(json.clone()));
        }
        self.key_file.clone().map(Secret::File)
    }

    /// The log file path, or `None` when file logging is disabled.
    pub fn log_path(&self) -> Option<PathBuf> {
        (!self.no_log_file).then(|| self.log_file.clone())
    }
}

/// Immutable run configuration, passed by reference into every component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Url,
    pub scopes: Vec<String>,
    pub request_timeout: Duration,
    pub concurrency_limit: usize,
    pub auth_retry: RetryPolicy,
    pub action: Action,
    pub exit_policy: ExitPolicy,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(defaults::ENDPOINT).expect("default endpoint is a valid URL"),
            scopes: defaults::SCOPES.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(defaults::TIMEOUT),
            concurrency_limit: defaults::CONCURRENCY,
            auth_retry: RetryPolicy::fixed(
                defaults::AUTH_ATTEMPTS,
                Duration::from_secs(defaults::AUTH_RETRY_DELAY),
            ),
            action: Action::Updated,
            exit_policy: ExitPolicy::CompletedRun,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            endpoint: cli.endpoint.clone(),
            action: cli.action,
            exit_policy: if cli.fail_on_error {
                ExitPolicy::AllDelivered
            } else {
                ExitPolicy::CompletedRun
            },
            user_agent: cli.user_agent.clone(),
            ..Self::default()
        }
    }

    /// Scopes joined the way the token endpoint expects them.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

use clap::Parser;
use sitenotify::credentials::Secret;
use sitenotify::notify::Action;
use sitenotify::options::{Cli, Settings, defaults};
use sitenotify::report::ExitPolicy;
use std::path::PathBuf;
use std::time::Duration;

const SITEMAP: &str = "https://example.com/sitemap.xml";

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["sitenotify", SITEMAP];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn test_defaults() {
    let cli = parse(&["--key-file", "/etc/key.json"]);

    assert_eq!(cli.sitemap_url.as_str(), SITEMAP);
    assert_eq!(cli.action, Action::Updated);
    assert!(!cli.fail_on_error);
    assert!(!cli.verbose);
    assert_eq!(cli.log_path(), Some(PathBuf::from(defaults::LOG_FILE)));
    assert_eq!(cli.endpoint.as_str(), defaults::ENDPOINT);
    assert_eq!(cli.user_agent, defaults::USER_AGENT);
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();

    assert_eq!(settings.concurrency_limit, 10);
    assert_eq!(settings.request_timeout, Duration::from_secs(10));
    assert_eq!(settings.auth_retry.max_attempts, 3);
    assert_eq!(settings.auth_retry.delay, Duration::from_secs(2));
    assert_eq!(settings.exit_policy, ExitPolicy::CompletedRun);
    assert_eq!(
        settings.scope(),
        "https://www.googleapis.com/auth/indexing https://www.googleapis.com/auth/webmasters"
    );
}

#[test]
fn test_settings_from_cli() {
    let cli = parse(&[
        "--key-file",
        "/etc/key.json",
        "--action",
        "deleted",
        "--fail-on-error",
        "--endpoint",
        "http://127.0.0.1:8080/publish",
    ]);
    let settings = Settings::from_cli(&cli);

    assert_eq!(settings.action, Action::Deleted);
    assert_eq!(settings.exit_policy, ExitPolicy::AllDelivered);
    assert_eq!(settings.endpoint.as_str(), "http://127.0.0.1:8080/publish");
    // Not configurable from the command line.
    assert_eq!(settings.concurrency_limit, defaults::CONCURRENCY);
}

#[test]
fn test_secret_prefers_inline_json() {
    let cli = parse(&["--key-file", "/etc/key.json", "--key-json", "{\"a\":1}"]);
    assert_eq!(cli.secret(), Some(Secret::Inline("{\"a\":1}".to_string())));
}

#[test]
fn test_secret_falls_back_to_key_file() {
    let cli = parse(&["--key-file", "/etc/key.json", "--key-json", "   "]);
    assert_eq!(cli.secret(), Some(Secret::File(PathBuf::from("/etc/key.json"))));
}

#[test]
fn test_key_file_tilde_is_expanded() {
    let cli = parse(&["--key-file", "~/key.json"]);
    let Some(Secret::File(path)) = cli.secret() else {
        panic!("expected a key file");
    };
    assert!(!path.starts_with("~"), "tilde should be expanded: {}", path.display());
    assert!(path.ends_with("key.json"));
}

#[test]
fn test_no_log_file() {
    let cli = parse(&["--no-log-file"]);
    assert_eq!(cli.log_path(), None);
}

#[test]
fn test_invalid_action_is_rejected() {
    let result = Cli::try_parse_from(["sitenotify", SITEMAP, "--action", "purged"]);
    assert!(result.is_err());
}

#[test]
fn test_invalid_basic_auth_is_rejected() {
    let result = Cli::try_parse_from(["sitenotify", SITEMAP, "--basic-auth", "nocolon"]);
    assert!(result.is_err());
}

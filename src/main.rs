use std::process::ExitCode;

use clap::Parser;
use console::style;
use sitenotify::indexer::Indexer;
use sitenotify::logging;
use sitenotify::options::{Cli, Settings};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Values from a local `.env` never override the real environment.
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            eprintln!("{} failed to load .env: {}", style("[ERROR]").red(), e);
            return ExitCode::FAILURE;
        }
    }

    // Parse terminal arguments.
    let options = Cli::parse();

    let level = if options.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let _logger = match logging::init(level, options.log_path().as_deref()) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("{} {}", style("[ERROR]").red(), e);
            return ExitCode::FAILURE;
        }
    };

    let indexer = Indexer::new(
        Settings::from_cli(&options),
        options.secret(),
        options.sitemap_url.clone(),
    )
    .with_basic_auth(options.basic_auth.clone());

    indexer.run().await
}

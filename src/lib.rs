// Library interface for sitenotify
// This allows integration tests to access the modules

pub mod credentials;
pub mod error;
pub mod indexer;
pub mod logging;
pub mod network;
pub mod notify;
pub mod options;
pub mod report;
pub mod retry;
pub mod sitemap;
pub mod utils;

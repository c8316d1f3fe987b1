use crate::notify::{Action, NotificationOutcome};
use console::style;
use once_cell::sync::Lazy;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row, Table};
use std::process::ExitCode;
use std::time::Duration;

static TABLE_FORMAT: Lazy<TableFormat> = Lazy::new(|| {
    FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separators(&[LinePosition::Top], LineSeparator::new('─', '┬', '┌', '┐'))
        .separators(
            &[LinePosition::Bottom],
            LineSeparator::new('─', '┴', '└', '┘'),
        )
        .padding(1, 1)
        .build()
});

/// Decides the exit status of a run that got all the way through dispatch.
///
/// Fatal errors (authentication, an empty sitemap) exit with 1 under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Exit 0 once every URL was attempted, whatever the individual outcomes.
    #[default]
    CompletedRun,
    /// Exit 1 if any single notification failed.
    AllDelivered,
}

#[derive(Debug)]
pub struct Summary {
    pub sitemap_url: String,
    pub action: Action,
    pub concurrency_limit: usize,
    pub total_time: Duration,
    pub outcomes: Vec<NotificationOutcome>,
}

impl Summary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &NotificationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn exit_code(&self, policy: ExitPolicy) -> ExitCode {
        match policy {
            ExitPolicy::CompletedRun => ExitCode::SUCCESS,
            ExitPolicy::AllDelivered if self.failed() > 0 => ExitCode::FAILURE,
            ExitPolicy::AllDelivered => ExitCode::SUCCESS,
        }
    }

    pub fn build_table(&self) -> String {
        let rows = [
            ("Action", self.action.to_string()),
            ("Concurrency Limit", self.concurrency_limit.to_string()),
            ("URLs", self.outcomes.len().to_string()),
            ("Succeeded", self.succeeded().to_string()),
            ("Failed", self.failed().to_string()),
            ("Elapsed Time", format!("{:.2?}", self.total_time)),
        ];

        let mut table = Table::new();
        table.set_format(*TABLE_FORMAT);
        for (label, value) in rows {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&value)]));
        }
        table.to_string()
    }

    pub fn log(&self) {
        if self.failed() == 0 {
            tracing::info!(
                succeeded = self.succeeded(),
                elapsed_ms = self.total_time.as_millis() as u64,
                "All URLs processed successfully."
            );
        } else {
            tracing::warn!(
                succeeded = self.succeeded(),
                failed = self.failed(),
                elapsed_ms = self.total_time.as_millis() as u64,
                "All URLs processed, some notifications failed."
            );
        }
    }

    pub fn show_text_report(&self) {
        println!(
            "\n{} {}\n",
            style("Notifications for").bold(),
            style(&self.sitemap_url).bold().underlined()
        );
        println!("{}", self.build_table());

        if self.failed() > 0 {
            println!("{}\n", style("Failed URLs:").bold());
            for outcome in self.failures() {
                let category = outcome
                    .failure_category()
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                println!("{} {}", style(format!("[{category}]")).red(), outcome.task.url);
            }
            println!();
        }
    }
}

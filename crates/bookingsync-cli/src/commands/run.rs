//! One-shot reconciliation.

use std::fmt::Write as _;

use bookingsync_engine::{PassReport, Reconciler};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::http::ReportBody;
use crate::setup::build_reconciler;

/// Runs a single pass and prints its report.
///
/// Exits with an error when the pass recorded failures, so cron and CI see
/// partial passes.
pub async fn run(config: &AppConfig, dry_run: bool, json: bool) -> CliResult<()> {
    config.validate()?;
    let reconciler = build_reconciler(config, dry_run)?;
    execute(&reconciler, json).await
}

pub(crate) async fn execute(reconciler: &Reconciler, json: bool) -> CliResult<()> {
    let report = reconciler.run_pass().await?;
    let failures = report.failures.len();

    if json {
        let body = ReportBody::from(report);
        let rendered = serde_json::to_string_pretty(&body)
            .map_err(|e| CliError::Config(format!("failed to serialize report: {}", e)))?;
        println!("{}", rendered);
    } else {
        print!("{}", render(&report));
    }

    if failures == 0 {
        Ok(())
    } else {
        Err(CliError::Partial(failures))
    }
}

/// Renders the summary line followed by one line per failure.
pub fn render(report: &PassReport) -> String {
    let mut out = report.summary();
    out.push('\n');
    for failure in &report.failures {
        let _ = match failure.booking_id {
            Some(ref booking_id) => writeln!(
                out,
                "  unit {} booking {}: [{}] {}",
                failure.unit_id,
                booking_id,
                failure.kind.as_str(),
                failure.message
            ),
            None => writeln!(
                out,
                "  unit {}: [{}] {}",
                failure.unit_id,
                failure.kind.as_str(),
                failure.message
            ),
        };
    }
    out
}

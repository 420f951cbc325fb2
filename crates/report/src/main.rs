use chrono::{DateTime, Utc};
use ledger::{AllLines, Ledger, LineMatcher, Normalizer, Reported, SourceSnapshot};
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::{AppConfig, Command},
    error::{ReportError, Result},
};

mod config;
mod error;

fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (settings, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fleet_report={level},ledger={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let output = run(&settings, command)?;
    println!("{output}");
    Ok(())
}

fn run(settings: &AppConfig, command: Command) -> Result<String> {
    let timezone = settings.timezone()?;
    let ledger = Ledger::builder()
        .timezone(timezone)
        .tie_break(settings.tie_break)
        .build();

    let snapshot = read_snapshot(settings)?;
    let (entries, issues) = ledger.normalize(&snapshot)?.into_parts();
    report_diagnostics("normalize", &issues);

    match command {
        Command::Driver {
            subject,
            newest_first,
        } => {
            tracing::info!(%subject, "computing driver ledger");
            let reported = ledger.driver_ledger(&entries, &subject).map(|mut result| {
                if newest_first {
                    result.rows.reverse();
                }
                result
            });
            render("driver", &reported)
        }
        Command::Cash { from, to } => {
            let normalizer = Normalizer::new(timezone);
            let start = parse_bound(&normalizer, from)?;
            let end = parse_bound(&normalizer, to)?;
            tracing::info!(?start, ?end, "computing cash summary");
            render("cash", &ledger.cash_summary(&entries, start, end)?)
        }
        Command::Monthly {
            year,
            line,
            newest_first,
        } => {
            let keyword_line = line.as_deref().map(|name| settings.line(name)).transpose()?;
            let matcher: &dyn LineMatcher = match &keyword_line {
                Some(line) => line,
                None => &AllLines,
            };
            tracing::info!(year, line = line.as_deref().unwrap_or("all"), "computing monthly summary");
            let reported = ledger.monthly_summary(&entries, year, matcher).map(|mut buckets| {
                if newest_first {
                    buckets.reverse();
                }
                buckets
            });
            render("monthly", &reported)
        }
        Command::Balances => render("balances", &ledger.balances(&entries)),
    }
}

fn read_snapshot(settings: &AppConfig) -> Result<SourceSnapshot> {
    let path = settings.snapshot.as_deref().ok_or(ReportError::MissingSnapshot)?;
    let text = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_string(),
        source,
    })?;
    let snapshot: SourceSnapshot = serde_json::from_str(&text)?;
    tracing::debug!(path, records = snapshot.len(), "read snapshot");
    Ok(snapshot)
}

/// Reads a `--from`/`--to` value with the same date rules as stored records.
fn parse_bound(normalizer: &Normalizer, raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|text| {
        normalizer
            .parse_date(&Value::String(text.clone()))
            .ok_or(ReportError::Date(text))
    })
    .transpose()
}

fn render<T: Serialize>(report: &str, reported: &Reported<T>) -> Result<String> {
    report_diagnostics(report, &reported.diagnostics);
    Ok(serde_json::to_string_pretty(reported)?)
}

fn report_diagnostics(stage: &str, diagnostics: &[ledger::Diagnostic]) {
    for diagnostic in diagnostics {
        tracing::debug!(stage, id = diagnostic.id(), ?diagnostic, "data issue");
    }
    if !diagnostics.is_empty() {
        tracing::warn!(stage, count = diagnostics.len(), "records with data issues");
    }
}

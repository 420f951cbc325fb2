use std::collections::BTreeMap;

use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use ledger::{EntryKind, KeywordLine, TieBreak};
use serde::Deserialize;

use crate::error::{ReportError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/fleet_report.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub level: String,
    pub timezone: String,
    pub tie_break: TieBreak,
    pub snapshot: Option<String>,
    pub lines: BTreeMap<String, LineConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "UTC".to_string(),
            tie_break: TieBreak::Arrival,
            snapshot: None,
            lines: BTreeMap::new(),
        }
    }
}

/// A business line: keywords searched in descriptions, plus kinds that
/// always belong to it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub keywords: Vec<String>,
    pub kinds: Vec<EntryKind>,
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ReportError::Timezone(self.timezone.clone()))
    }

    pub fn line(&self, name: &str) -> Result<KeywordLine> {
        let line = self
            .lines
            .get(name)
            .ok_or_else(|| ReportError::UnknownLine(name.to_string()))?;
        Ok(KeywordLine::new(name, &line.keywords).with_kinds(line.kinds.iter().copied()))
    }
}

#[derive(Debug, Parser)]
#[command(name = "fleet_report")]
#[command(about = "Driver ledgers and cash-box reports from a datastore snapshot")]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Snapshot file (JSON with `charges`, `debts`, `payments`,
    /// `withdrawals`, `expenses`).
    #[arg(long)]
    snapshot: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Override log level.
    #[arg(long)]
    level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Running balance of one driver.
    Driver {
        #[arg(long)]
        subject: String,
        /// Show the newest movements first.
        #[arg(long)]
        newest_first: bool,
    },
    /// Cash box over a period (`--from` inclusive, `--to` exclusive).
    Cash {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Income and outflow per month of a year.
    Monthly {
        #[arg(long)]
        year: i32,
        /// Restrict to a business line defined in the config.
        #[arg(long)]
        line: Option<String>,
        /// Show the most recent month first.
        #[arg(long)]
        newest_first: bool,
    },
    /// Final balance of every driver, owner and vehicle.
    Balances,
}

pub fn load() -> Result<(AppConfig, Command)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("FLEET_REPORT"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(snapshot) = args.snapshot {
        settings.snapshot = Some(snapshot);
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok((settings, args.command))
}

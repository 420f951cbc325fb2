use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),
    #[error("invalid timezone: {0}")]
    Timezone(String),
    #[error("invalid date: {0}")]
    Date(String),
    #[error("unknown business line: {0}")]
    UnknownLine(String),
    #[error("no snapshot given (use --snapshot or set `snapshot` in the config)")]
    MissingSnapshot,
}

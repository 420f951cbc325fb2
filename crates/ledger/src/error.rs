//! The module contains the errors the ledger can return.
//!
//! Only structurally invalid input is an error:
//!
//! - [`UnknownEntryKind`] returned when a record is tagged with a kind the
//!   ledger does not know.
//! - [`MissingAmount`] returned when a record has no amount field at all.
//! - [`InvalidRange`] returned when a period has `start >= end`.
//!
//! Data-quality problems (bad dates, negative amounts) are not errors: they
//! are reported as [`Diagnostic`]s next to the computed value.
//!
//!  [`UnknownEntryKind`]: LedgerError::UnknownEntryKind
//!  [`MissingAmount`]: LedgerError::MissingAmount
//!  [`InvalidRange`]: LedgerError::InvalidRange
//!  [`Diagnostic`]: crate::Diagnostic
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown entry kind: \"{0}\"")]
    UnknownEntryKind(String),
    #[error("Missing amount for {kind} \"{id}\"")]
    MissingAmount { kind: String, id: String },
    #[error("Missing id for {0} record")]
    MissingId(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnknownEntryKind(a), Self::UnknownEntryKind(b)) => a == b,
            (
                Self::MissingAmount { kind: ka, id: ia },
                Self::MissingAmount { kind: kb, id: ib },
            ) => ka == kb && ia == ib,
            (Self::MissingId(a), Self::MissingId(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (
                Self::InvalidMonth { year: ya, month: ma },
                Self::InvalidMonth { year: yb, month: mb },
            ) => ya == yb && ma == mb,
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

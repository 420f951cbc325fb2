//! Driver account ledger and cash-box reconciliation.
//!
//! Raw records from the datastore go through the [`Normalizer`] into
//! [`LedgerEntry`]s. From there two views are derived, both recomputed from
//! scratch on every call:
//!
//! - the driver ledger: [`sequence`] then [`accumulate`] into a
//!   [`RunningBalanceResult`];
//! - the business cash view: [`cash_summary`] and [`monthly_summary`].
//!
//! Structural problems are [`LedgerError`]s; data-quality problems come back
//! as [`Diagnostic`]s inside a [`Reported`] value.

pub use balance::{BalanceRow, RunningBalanceResult, accumulate, balances_by_subject, total_balance};
pub use cash_box::{CashSummary, cash_summary};
pub use clock::{Clock, FixedClock, SystemClock};
pub use diagnostics::{Diagnostic, Reported};
pub use entry::{EntryKind, LedgerEntry, PaymentMethod};
pub use error::LedgerError;
pub use money::MoneyCents;
pub use normalize::{Normalizer, RawRecord, SourceSnapshot, TaggedRecord};
pub use ops::{
    Ledger, LedgerBuilder, compute_cash_summary, compute_driver_ledger, compute_monthly_summary,
};
pub use period::Period;
pub use sequence::{TieBreak, sequence};
pub use summary::{
    AllLines, BucketKey, KeywordLine, LineMatcher, PeriodBucket, monthly_summary, range_summary,
};

mod balance;
mod cash_box;
mod clock;
mod diagnostics;
mod entry;
mod error;
mod money;
mod normalize;
mod ops;
mod period;
mod sequence;
mod summary;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;

//! The three read operations the UI and report layers call, as free
//! functions and through the [`Ledger`] facade.
//!
//! Every call recomputes from the snapshot it is given; nothing is cached
//! between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    AllLines, CashSummary, Clock, LedgerEntry, LineMatcher, MoneyCents, Normalizer, PeriodBucket,
    Period, Reported, ResultLedger, RunningBalanceResult, SourceSnapshot, SystemClock, TieBreak,
    balance::{accumulate, balances_by_subject},
    cash_box::cash_summary,
    sequence::sequence,
    summary::{monthly_summary, range_summary},
};

/// Running balance of one driver over their whole history.
///
/// Entries of other subjects are ignored, and so are their data-quality
/// problems: only the driver's own undated entries are reported.
pub fn compute_driver_ledger(
    entries: &[LedgerEntry],
    subject_id: &str,
    tie_break: TieBreak,
) -> Reported<RunningBalanceResult> {
    let own = entries
        .iter()
        .filter(|entry| entry.belongs_to(subject_id))
        .cloned();
    let (ordered, diagnostics) = sequence(own, tie_break).into_parts();
    Reported::new(accumulate(ordered, None), diagnostics)
}

/// Cash box over `[period_start, period_end)`, with cash on hand as of
/// `now`.
pub fn compute_cash_summary(
    entries: &[LedgerEntry],
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ResultLedger<Reported<CashSummary>> {
    let period = Period::new(period_start, period_end)?;
    Ok(cash_summary(entries, &period, now))
}

/// Months of `year` with any income or outflow, ascending.
pub fn compute_monthly_summary(
    entries: &[LedgerEntry],
    year: i32,
    tz: Tz,
) -> Reported<Vec<PeriodBucket>> {
    monthly_summary(entries, year, tz, &AllLines)
}

/// Ledger engine configured for one business: its time zone, tie-break
/// policy and clock.
#[derive(Debug)]
pub struct Ledger {
    normalizer: Normalizer,
    tie_break: TieBreak,
    clock: Box<dyn Clock>,
}

impl Ledger {
    /// Return a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    pub fn timezone(&self) -> Tz {
        self.normalizer.timezone()
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Normalizes a full datastore snapshot.
    pub fn normalize(&self, snapshot: &SourceSnapshot) -> ResultLedger<Reported<Vec<LedgerEntry>>> {
        self.normalizer.normalize_snapshot(snapshot)
    }

    pub fn driver_ledger(
        &self,
        entries: &[LedgerEntry],
        subject_id: &str,
    ) -> Reported<RunningBalanceResult> {
        compute_driver_ledger(entries, subject_id, self.tie_break)
    }

    /// The driver's balance today, leaving out post-dated entries.
    pub fn driver_balance_now(&self, entries: &[LedgerEntry], subject_id: &str) -> Reported<MoneyCents> {
        let now = self.now();
        self.driver_ledger(entries, subject_id)
            .map(|result| result.balance_as_of(now))
    }

    /// Final balance of every subject with at least one dated entry.
    pub fn balances(&self, entries: &[LedgerEntry]) -> Reported<BTreeMap<String, MoneyCents>> {
        sequence(entries.iter().cloned(), self.tie_break)
            .map(|ordered| balances_by_subject(&ordered))
    }

    pub fn cash_summary(
        &self,
        entries: &[LedgerEntry],
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
    ) -> ResultLedger<Reported<CashSummary>> {
        compute_cash_summary(entries, period_start, period_end, self.now())
    }

    /// Cash box for one calendar month in the business time zone.
    pub fn cash_summary_for_month(
        &self,
        entries: &[LedgerEntry],
        year: i32,
        month: u32,
    ) -> ResultLedger<Reported<CashSummary>> {
        let period = Period::month(year, month, self.timezone())?;
        Ok(cash_summary(entries, &period, self.now()))
    }

    pub fn monthly_summary(
        &self,
        entries: &[LedgerEntry],
        year: i32,
        line: &dyn LineMatcher,
    ) -> Reported<Vec<PeriodBucket>> {
        monthly_summary(entries, year, self.timezone(), line)
    }

    pub fn range_summary(
        &self,
        entries: &[LedgerEntry],
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
        line: &dyn LineMatcher,
    ) -> ResultLedger<Reported<PeriodBucket>> {
        let period = Period::new(period_start, period_end)?;
        Ok(range_summary(entries, &period, line))
    }
}

/// The builder for `Ledger`
#[derive(Debug, Default)]
pub struct LedgerBuilder {
    timezone: Option<Tz>,
    tie_break: TieBreak,
    clock: Option<Box<dyn Clock>>,
}

impl LedgerBuilder {
    /// Business time zone for date-only values and month boundaries
    /// (default UTC).
    pub fn timezone(mut self, tz: Tz) -> LedgerBuilder {
        self.timezone = Some(tz);
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> LedgerBuilder {
        self.tie_break = tie_break;
        self
    }

    /// Clock used for as-of-now figures (default: system clock).
    pub fn clock(mut self, clock: impl Clock + 'static) -> LedgerBuilder {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            normalizer: Normalizer::new(self.timezone.unwrap_or(Tz::UTC)),
            tie_break: self.tie_break,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
        }
    }
}

//! Running balances.
//!
//! Balances are a single left-to-right fold over a chronologically ordered
//! sequence (see [`sequence`](crate::sequence)). A current balance is only
//! correct when the fold starts at the first entry ever recorded, so the
//! display helpers here slice an already-computed result instead of
//! recomputing over a subset.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerEntry, MoneyCents, Period};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub entry: LedgerEntry,
    pub balance_after: MoneyCents,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalanceResult {
    /// Rows in ascending chronological order.
    pub rows: Vec<BalanceRow>,
    /// Balance after the last row (zero when there are no rows).
    pub total_balance: MoneyCents,
}

impl RunningBalanceResult {
    /// Rows newest first, for display. Balances are those of the ascending
    /// fold.
    pub fn most_recent_first(&self) -> impl Iterator<Item = &BalanceRow> {
        self.rows.iter().rev()
    }

    /// Rows whose date falls in `period`, with balances still computed over
    /// the full history.
    pub fn window(&self, period: &Period) -> &[BalanceRow] {
        let from = period
            .start
            .map_or(0, |start| self.rows.partition_point(|row| row_date(row) < Some(start)));
        let to = period
            .end
            .map_or(self.rows.len(), |end| self.rows.partition_point(|row| row_date(row) < Some(end)));
        &self.rows[from..to.max(from)]
    }

    /// Balance carried into a window starting at `start`.
    pub fn opening_balance(&self, start: DateTime<Utc>) -> MoneyCents {
        let before = self.rows.partition_point(|row| row_date(row) < Some(start));
        balance_at(&self.rows, before)
    }

    /// Balance including every entry dated at or before `now`. Post-dated
    /// entries are not counted yet.
    pub fn balance_as_of(&self, now: DateTime<Utc>) -> MoneyCents {
        let upto = self.rows.partition_point(|row| row_date(row) <= Some(now));
        balance_at(&self.rows, upto)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn row_date(row: &BalanceRow) -> Option<DateTime<Utc>> {
    row.entry.effective_date
}

/// Balance after the first `count` rows.
fn balance_at(rows: &[BalanceRow], count: usize) -> MoneyCents {
    count
        .checked_sub(1)
        .and_then(|last| rows.get(last))
        .map_or(MoneyCents::ZERO, |row| row.balance_after)
}

/// Folds an ordered sequence into running balances.
///
/// With `subject_id` set, only that subject's entries are kept; other
/// subjects' streams never touch the result.
pub fn accumulate<I>(ordered: I, subject_id: Option<&str>) -> RunningBalanceResult
where
    I: IntoIterator<Item = LedgerEntry>,
{
    let mut balance = MoneyCents::ZERO;
    let rows: Vec<BalanceRow> = ordered
        .into_iter()
        .filter(|entry| subject_id.is_none_or(|subject| entry.belongs_to(subject)))
        .map(|entry| {
            balance += entry.signed_delta();
            BalanceRow {
                entry,
                balance_after: balance,
            }
        })
        .collect();

    RunningBalanceResult {
        rows,
        total_balance: balance,
    }
}

/// Final balance only, without materializing rows.
pub fn total_balance<'a, I>(ordered: I, subject_id: Option<&str>) -> MoneyCents
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    ordered
        .into_iter()
        .filter(|entry| subject_id.is_none_or(|subject| entry.belongs_to(subject)))
        .map(LedgerEntry::signed_delta)
        .sum()
}

/// Final balance of every subject in one pass. Entries without a subject
/// are not attributed to anyone and are left out.
pub fn balances_by_subject<'a, I>(entries: I) -> BTreeMap<String, MoneyCents>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut balances: BTreeMap<String, MoneyCents> = BTreeMap::new();
    for entry in entries {
        if let Some(subject) = &entry.subject_id {
            *balances.entry(subject.clone()).or_default() += entry.signed_delta();
        }
    }
    balances
}

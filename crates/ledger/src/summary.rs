//! Calendar-period summaries.
//!
//! Income is payments; outflow is expenses plus withdrawals. Charges and
//! debts move a driver's balance, not money, and are never summarized here.
//!
//! Which entries belong to a business line (fleet, workshop, ...) is
//! decided by a single [`LineMatcher`], so the text-matching heuristic of
//! [`KeywordLine`] can be swapped for an explicit tag without touching the
//! sums.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Diagnostic, EntryKind, LedgerEntry, MoneyCents, Period, Reported, util::fold_text};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BucketKey {
    Month {
        year: i32,
        month: u32,
    },
    Range {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub key: BucketKey,
    pub income_total: MoneyCents,
    pub outflow_total: MoneyCents,
}

impl PeriodBucket {
    fn empty(key: BucketKey) -> Self {
        Self {
            key,
            income_total: MoneyCents::ZERO,
            outflow_total: MoneyCents::ZERO,
        }
    }

    pub fn net(&self) -> MoneyCents {
        self.income_total - self.outflow_total
    }

    pub fn has_activity(&self) -> bool {
        !(self.income_total.is_zero() && self.outflow_total.is_zero())
    }

    fn add(&mut self, entry: &LedgerEntry) {
        match entry.kind {
            EntryKind::Payment => self.income_total += entry.amount,
            EntryKind::Withdrawal | EntryKind::Expense => self.outflow_total += entry.amount,
            EntryKind::Charge | EntryKind::Debt => {}
        }
    }
}

/// Decides whether an entry belongs to a business line.
pub trait LineMatcher {
    fn matches(&self, entry: &LedgerEntry) -> bool;
}

impl<F> LineMatcher for F
where
    F: Fn(&LedgerEntry) -> bool,
{
    fn matches(&self, entry: &LedgerEntry) -> bool {
        self(entry)
    }
}

/// Every entry, whatever its line.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllLines;

impl LineMatcher for AllLines {
    fn matches(&self, _entry: &LedgerEntry) -> bool {
        true
    }
}

/// Business line identified by an explicit category tag, falling back to
/// keywords found in the description.
///
/// - An entry with a category belongs to the line only if the category is
///   the line name or one of its keywords; its description is not looked at.
/// - An entry without a category belongs to the line if its description
///   contains the line name or a keyword. Matching ignores case and accents.
/// - Kinds listed with [`KeywordLine::with_kinds`] always belong to the line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordLine {
    name: String,
    keywords: Vec<String>,
    kinds: Vec<EntryKind>,
}

impl KeywordLine {
    pub fn new<I, S>(name: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: fold_text(name),
            keywords: keywords
                .into_iter()
                .map(|k| fold_text(k.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
            kinds: Vec::new(),
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EntryKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Name and keywords, skipping any that fold to nothing: an empty
    /// marker would be a substring of every description.
    fn markers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.keywords.iter().map(String::as_str))
            .filter(|marker| !marker.is_empty())
    }
}

impl LineMatcher for KeywordLine {
    fn matches(&self, entry: &LedgerEntry) -> bool {
        if self.kinds.contains(&entry.kind) {
            return true;
        }
        if let Some(category) = &entry.category {
            let category = fold_text(category);
            return self.markers().any(|marker| marker == category);
        }
        entry.description.as_deref().is_some_and(|description| {
            let description = fold_text(description);
            self.markers().any(|marker| description.contains(marker))
        })
    }
}

/// One bucket per month of `year` (in the business time zone), ascending,
/// with months that saw no income and no outflow left out.
pub fn monthly_summary<'a, I>(
    entries: I,
    year: i32,
    tz: Tz,
    line: &dyn LineMatcher,
) -> Reported<Vec<PeriodBucket>>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut months: Vec<PeriodBucket> = (1..=12)
        .map(|month| PeriodBucket::empty(BucketKey::Month { year, month }))
        .collect();
    let mut diagnostics = Vec::new();

    for entry in entries {
        let Some(date) = entry.effective_date else {
            diagnostics.push(invalid_date(entry));
            continue;
        };
        let local = date.with_timezone(&tz);
        if local.year() != year || !line.matches(entry) {
            continue;
        }
        months[local.month0() as usize].add(entry);
    }

    let buckets: Vec<PeriodBucket> = months.into_iter().filter(PeriodBucket::has_activity).collect();
    tracing::debug!(year, buckets = buckets.len(), "monthly summary computed");
    Reported::new(buckets, diagnostics)
}

/// A single bucket for an explicit range.
pub fn range_summary<'a, I>(
    entries: I,
    period: &Period,
    line: &dyn LineMatcher,
) -> Reported<PeriodBucket>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut bucket = PeriodBucket::empty(BucketKey::Range {
        start: period.start,
        end: period.end,
    });
    let mut diagnostics = Vec::new();

    for entry in entries {
        match entry.effective_date {
            None => diagnostics.push(invalid_date(entry)),
            Some(date) if period.contains(date) && line.matches(entry) => bucket.add(entry),
            Some(_) => {}
        }
    }
    Reported::new(bucket, diagnostics)
}

fn invalid_date(entry: &LedgerEntry) -> Diagnostic {
    Diagnostic::InvalidDate {
        id: entry.id.clone(),
        kind: entry.kind,
        raw: entry.raw_date.clone(),
    }
}

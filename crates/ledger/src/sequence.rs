//! Chronological ordering of ledger entries.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Diagnostic, LedgerEntry, Reported};

/// How entries sharing the same timestamp are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep arrival order (`LedgerEntry::arrival`, then input order).
    #[default]
    Arrival,
    /// Order by `id`, then arrival. Use when the datastore does not return
    /// collections in a stable order across reads.
    Id,
}

impl TieBreak {
    fn compare(self, a: &LedgerEntry, b: &LedgerEntry) -> Ordering {
        match self {
            Self::Arrival => a.arrival.cmp(&b.arrival),
            Self::Id => a.id.cmp(&b.id).then(a.arrival.cmp(&b.arrival)),
        }
    }
}

/// Orders entries ascending by effective date.
///
/// Entries without a readable date are removed from the output and
/// reported as [`Diagnostic::InvalidDate`], in input order. The sort is
/// stable, so entries that tie on both date and tie-break key keep their
/// input order.
pub fn sequence<I>(entries: I, tie_break: TieBreak) -> Reported<Vec<LedgerEntry>>
where
    I: IntoIterator<Item = LedgerEntry>,
{
    let mut ordered = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        if entry.effective_date.is_some() {
            ordered.push(entry);
        } else {
            skipped.push(Diagnostic::InvalidDate {
                id: entry.id,
                kind: entry.kind,
                raw: entry.raw_date,
            });
        }
    }

    ordered.sort_by(|a, b| {
        a.effective_date
            .cmp(&b.effective_date)
            .then_with(|| tie_break.compare(a, b))
    });

    if !skipped.is_empty() {
        tracing::warn!(skipped = skipped.len(), "entries without a readable date left out");
    }
    Reported::new(ordered, skipped)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{EntryKind, MoneyCents};

    fn entry(id: &str, day: u32, arrival: usize) -> LedgerEntry {
        LedgerEntry::new(
            id,
            EntryKind::Charge,
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            MoneyCents::new(100),
        )
        .with_arrival(arrival)
    }

    fn ids(entries: &[LedgerEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn orders_by_date_ascending() {
        let out = sequence(
            vec![entry("c", 10, 0), entry("a", 1, 1), entry("b", 5, 2)],
            TieBreak::Arrival,
        );
        assert_eq!(ids(&out.value), vec!["a", "b", "c"]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn equal_dates_keep_arrival_order() {
        let out = sequence(
            vec![entry("z", 1, 2), entry("y", 1, 0), entry("x", 1, 1)],
            TieBreak::Arrival,
        );
        assert_eq!(ids(&out.value), vec!["y", "x", "z"]);
    }

    #[test]
    fn equal_dates_and_arrivals_keep_input_order() {
        let out = sequence(
            vec![entry("b", 1, 0), entry("a", 1, 0)],
            TieBreak::Arrival,
        );
        assert_eq!(ids(&out.value), vec!["b", "a"]);
    }

    #[test]
    fn id_tie_break_ignores_arrival() {
        let out = sequence(
            vec![entry("b", 1, 0), entry("a", 1, 1), entry("c", 1, 2)],
            TieBreak::Id,
        );
        assert_eq!(ids(&out.value), vec!["a", "b", "c"]);
    }

    #[test]
    fn undated_entries_are_reported_not_ordered() {
        let mut bad = entry("bad", 1, 1);
        bad.effective_date = None;
        bad.raw_date = Some("not a date".to_string());
        let out = sequence(vec![entry("a", 2, 0), bad, entry("b", 3, 2)], TieBreak::Arrival);
        assert_eq!(ids(&out.value), vec!["a", "b"]);
        assert_eq!(out.skipped_dates(), 1);
        assert_eq!(
            out.diagnostics[0],
            Diagnostic::InvalidDate {
                id: "bad".to_string(),
                kind: EntryKind::Charge,
                raw: Some("not a date".to_string()),
            }
        );
    }
}

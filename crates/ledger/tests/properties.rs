// Property-based tests for the ledger folds and aggregates.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;

use ledger::{
    EntryKind, LedgerEntry, MoneyCents, Period, PaymentMethod, TieBreak, accumulate, cash_summary,
    compute_driver_ledger, compute_monthly_summary, sequence,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_kind() -> impl Strategy<Value = EntryKind> {
    prop_oneof![
        Just(EntryKind::Charge),
        Just(EntryKind::Debt),
        Just(EntryKind::Payment),
        Just(EntryKind::Withdrawal),
        Just(EntryKind::Expense),
    ]
}

fn arb_method() -> impl Strategy<Value = Option<PaymentMethod>> {
    prop_oneof![
        3 => Just(Some(PaymentMethod::Cash)),
        1 => Just(Some(PaymentMethod::Transfer)),
        1 => Just(Some(PaymentMethod::Card)),
        1 => Just(Some(PaymentMethod::CardInstallments)),
        1 => Just(None),
    ]
}

/// Day offsets are drawn from a small range so equal timestamps are common.
fn arb_date() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..40).prop_map(|day| {
        Utc.with_ymd_and_hms(2023, 12, 20, 0, 0, 0).unwrap() + chrono::TimeDelta::days(day)
    })
}

fn arb_entry() -> impl Strategy<Value = LedgerEntry> {
    (
        arb_kind(),
        arb_date(),
        0i64..1_000_000,
        arb_method(),
        prop_oneof![Just("A"), Just("B")],
    )
        .prop_map(|(kind, date, cents, method, subject)| {
            let mut entry =
                LedgerEntry::new("x", kind, date, MoneyCents::new(cents)).with_subject(subject);
            entry.method = method;
            entry
        })
}

fn arb_entries() -> impl Strategy<Value = Vec<LedgerEntry>> {
    prop::collection::vec(arb_entry(), 0..60).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                LedgerEntry {
                    id: format!("e{i}"),
                    ..entry
                }
                .with_arrival(i)
            })
            .collect()
    })
}

fn january_2024() -> Period {
    Period::month(2024, 1, Tz::UTC).unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn balance_after_is_prefix_sum(entries in arb_entries()) {
        let ordered = sequence(entries, TieBreak::Arrival).value;
        let result = accumulate(ordered.clone(), None);
        let mut running = MoneyCents::ZERO;
        for (row, entry) in result.rows.iter().zip(&ordered) {
            running += entry.signed_delta();
            prop_assert_eq!(row.balance_after, running);
        }
        prop_assert_eq!(result.total_balance, running);
    }

    #[test]
    fn sequence_is_sorted_by_date(entries in arb_entries()) {
        let ordered = sequence(entries, TieBreak::Arrival).value;
        for pair in ordered.windows(2) {
            prop_assert!(pair[0].effective_date <= pair[1].effective_date);
            if pair[0].effective_date == pair[1].effective_date {
                prop_assert!(pair[0].arrival < pair[1].arrival);
            }
        }
    }

    #[test]
    fn total_is_order_invariant(entries in arb_entries(), seed in any::<u64>()) {
        let mut shuffled = entries.clone();
        // Deterministic shuffle driven by the seed.
        let n = shuffled.len();
        let mut state = seed | 1;
        for i in (1..n).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            shuffled.swap(i, (state % (i as u64 + 1)) as usize);
        }
        let a = compute_driver_ledger(&entries, "A", TieBreak::Arrival).value;
        let b = compute_driver_ledger(&shuffled, "A", TieBreak::Id).value;
        prop_assert_eq!(a.total_balance, b.total_balance);
    }

    #[test]
    fn driver_ledger_is_idempotent(entries in arb_entries()) {
        let first = compute_driver_ledger(&entries, "B", TieBreak::Arrival);
        let second = compute_driver_ledger(&entries, "B", TieBreak::Arrival);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn transfers_and_cards_never_touch_cash(
        entries in arb_entries(),
        huge in 0i64..1_000_000_000_000,
        method in prop_oneof![
            Just(PaymentMethod::Transfer),
            Just(PaymentMethod::Card),
            Just(PaymentMethod::CardInstallments),
        ],
    ) {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let period = january_2024();
        let before = cash_summary(&entries, &period, now).value;

        let mut with_noise = entries.clone();
        with_noise.push(
            LedgerEntry::new(
                "noise",
                EntryKind::Payment,
                Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
                MoneyCents::new(huge),
            )
            .with_method(method),
        );
        let after = cash_summary(&with_noise, &period, now).value;

        prop_assert_eq!(before.period_cash_balance, after.period_cash_balance);
        prop_assert_eq!(before.current_cash_on_hand, after.current_cash_on_hand);
        prop_assert_eq!(before.income_cash, after.income_cash);
    }

    #[test]
    fn months_add_up_to_the_year(entries in arb_entries()) {
        let buckets = compute_monthly_summary(&entries, 2024, Tz::UTC).value;
        let in_year = |e: &&LedgerEntry| e.effective_date.is_some_and(|d| d.year() == 2024);

        let income: MoneyCents = entries
            .iter()
            .filter(in_year)
            .filter(|e| e.kind == EntryKind::Payment)
            .map(|e| e.amount)
            .sum();
        let outflow: MoneyCents = entries
            .iter()
            .filter(in_year)
            .filter(|e| e.kind.is_outflow())
            .map(|e| e.amount)
            .sum();

        prop_assert_eq!(buckets.iter().map(|b| b.income_total).sum::<MoneyCents>(), income);
        prop_assert_eq!(buckets.iter().map(|b| b.outflow_total).sum::<MoneyCents>(), outflow);
        prop_assert!(buckets.iter().all(|b| b.has_activity()));
    }
}

//! Cash-box aggregation.
//!
//! Only physical cash sits in the drawer: transfers and card payments are
//! tracked as income but never enter either cash balance. Charges and debts
//! are driver-ledger events and do not touch the cash box at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Diagnostic, EntryKind, LedgerEntry, MoneyCents, PaymentMethod, Period, Reported};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashSummary {
    /// Payments settled in cash, in the period.
    pub income_cash: MoneyCents,
    /// Payments settled by transfer, in the period.
    pub income_transfer: MoneyCents,
    /// Card and card-installment payments, in the period.
    pub income_card: MoneyCents,
    /// Payments with no method recorded, in the period.
    pub income_unspecified: MoneyCents,
    pub total_withdrawals: MoneyCents,
    pub total_expenses: MoneyCents,
    /// `income_cash - total_withdrawals - total_expenses` over the period.
    pub period_cash_balance: MoneyCents,
    /// The same formula over all history up to "now".
    pub current_cash_on_hand: MoneyCents,
}

impl CashSummary {
    /// Every payment in the period, whatever the method.
    pub fn total_income(&self) -> MoneyCents {
        self.income_cash + self.income_transfer + self.income_card + self.income_unspecified
    }

    pub fn total_outflow(&self) -> MoneyCents {
        self.total_withdrawals + self.total_expenses
    }
}

#[derive(Default)]
struct Totals {
    cash: MoneyCents,
    transfer: MoneyCents,
    card: MoneyCents,
    unspecified: MoneyCents,
    withdrawals: MoneyCents,
    expenses: MoneyCents,
}

impl Totals {
    fn add(&mut self, entry: &LedgerEntry) {
        let amount = entry.amount;
        match (entry.kind, entry.method) {
            (EntryKind::Payment, Some(PaymentMethod::Cash)) => self.cash += amount,
            (EntryKind::Payment, Some(PaymentMethod::Transfer)) => self.transfer += amount,
            (EntryKind::Payment, Some(PaymentMethod::Card | PaymentMethod::CardInstallments)) => {
                self.card += amount;
            }
            (EntryKind::Payment, None) => self.unspecified += amount,
            (EntryKind::Withdrawal, _) => self.withdrawals += amount,
            (EntryKind::Expense, _) => self.expenses += amount,
            (EntryKind::Charge | EntryKind::Debt, _) => {}
        }
    }

    fn cash_balance(&self) -> MoneyCents {
        self.cash - self.withdrawals - self.expenses
    }
}

/// Summarizes the cash box over `period`, with cash on hand as of `now`.
///
/// Entries without a readable date are left out of both figures and
/// reported.
pub fn cash_summary<'a, I>(entries: I, period: &Period, now: DateTime<Utc>) -> Reported<CashSummary>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut in_period = Totals::default();
    let mut history = Totals::default();
    let mut diagnostics = Vec::new();

    for entry in entries {
        let Some(date) = entry.effective_date else {
            diagnostics.push(Diagnostic::InvalidDate {
                id: entry.id.clone(),
                kind: entry.kind,
                raw: entry.raw_date.clone(),
            });
            continue;
        };
        if period.contains(date) {
            in_period.add(entry);
        }
        if date <= now {
            history.add(entry);
        }
    }

    let summary = CashSummary {
        income_cash: in_period.cash,
        income_transfer: in_period.transfer,
        income_card: in_period.card,
        income_unspecified: in_period.unspecified,
        total_withdrawals: in_period.withdrawals,
        total_expenses: in_period.expenses,
        period_cash_balance: in_period.cash_balance(),
        current_cash_on_hand: history.cash_balance(),
    };
    tracing::debug!(
        period_cash_balance = %summary.period_cash_balance,
        current_cash_on_hand = %summary.current_cash_on_hand,
        skipped = diagnostics.len(),
        "cash summary computed"
    );
    Reported::new(summary, diagnostics)
}

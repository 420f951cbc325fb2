//! Normalized ledger entries.
//!
//! A [`LedgerEntry`] is the one shape every downstream computation reads.
//! Amounts are stored as a non-negative magnitude; the sign comes from the
//! [`EntryKind`] and is exposed only through [`LedgerEntry::signed_delta`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, MoneyCents};

/// The five financial events the ledger understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Daily rental charge billed to a driver.
    Charge,
    /// Manual debt recorded against a driver.
    Debt,
    /// Money received from a driver.
    Payment,
    /// Owner withdrawal from the cash box.
    Withdrawal,
    /// Vehicle or business expense paid from the cash box.
    Expense,
}

impl EntryKind {
    pub const ALL: [EntryKind; 5] = [
        Self::Charge,
        Self::Debt,
        Self::Payment,
        Self::Withdrawal,
        Self::Expense,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Debt => "debt",
            Self::Payment => "payment",
            Self::Withdrawal => "withdrawal",
            Self::Expense => "expense",
        }
    }

    /// `+1` for money coming in, `-1` for everything owed or spent.
    pub const fn sign(self) -> i64 {
        match self {
            Self::Payment => 1,
            Self::Charge | Self::Debt | Self::Withdrawal | Self::Expense => -1,
        }
    }

    /// Whether the kind is money leaving the cash box.
    pub const fn is_outflow(self) -> bool {
        matches!(self, Self::Withdrawal | Self::Expense)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "charge" | "charges" => Ok(Self::Charge),
            "debt" | "debts" => Ok(Self::Debt),
            "payment" | "payments" => Ok(Self::Payment),
            "withdrawal" | "withdrawals" => Ok(Self::Withdrawal),
            "expense" | "expenses" => Ok(Self::Expense),
            _ => Err(LedgerError::UnknownEntryKind(value.to_string())),
        }
    }
}

/// How a payment was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    CardInstallments,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::CardInstallments => "card_installments",
            Self::Transfer => "transfer",
        }
    }

    /// Parses the stored method text. Matching ignores case, spaces, dashes
    /// and underscores, so `"Card Installments"` and `"card-installments"`
    /// are the same method.
    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "cash" => Some(Self::Cash),
            "card" | "debitcard" | "creditcard" => Some(Self::Card),
            "cardinstallments" | "installments" => Some(Self::CardInstallments),
            "transfer" | "banktransfer" | "wiretransfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub kind: EntryKind,
    pub subject_id: Option<String>,
    /// `None` when the stored date could not be parsed; see `raw_date`.
    pub effective_date: Option<DateTime<Utc>>,
    /// The date text as stored, kept for diagnostics.
    pub raw_date: Option<String>,
    /// Non-negative magnitude.
    pub amount: MoneyCents,
    pub method: Option<PaymentMethod>,
    pub description: Option<String>,
    /// Explicit business-line tag, when the record carries one.
    pub category: Option<String>,
    /// Position in the snapshot the entry was normalized from.
    pub arrival: usize,
}

impl LedgerEntry {
    /// Builds an entry with a resolved date. Negative amounts are clamped to
    /// zero; callers that need to report the clamp do so before calling.
    pub fn new(
        id: impl Into<String>,
        kind: EntryKind,
        effective_date: DateTime<Utc>,
        amount: MoneyCents,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            subject_id: None,
            effective_date: Some(effective_date),
            raw_date: None,
            amount: amount.max(MoneyCents::ZERO),
            method: None,
            description: None,
            category: None,
            arrival: 0,
        }
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_arrival(mut self, arrival: usize) -> Self {
        self.arrival = arrival;
        self
    }

    /// `+amount` for payments, `-amount` for everything else.
    pub fn signed_delta(&self) -> MoneyCents {
        if self.kind.sign() > 0 {
            self.amount
        } else {
            -self.amount
        }
    }

    pub fn belongs_to(&self, subject_id: &str) -> bool {
        self.subject_id.as_deref() == Some(subject_id)
    }
}

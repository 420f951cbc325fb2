//! Data-quality diagnostics.
//!
//! Bad data never aborts a computation and never disappears silently: each
//! coercion or exclusion is recorded as a [`Diagnostic`] and returned next
//! to the computed value in a [`Reported`].

use serde::{Deserialize, Serialize};

use crate::{EntryKind, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The date could not be parsed; the entry was left out of ordered and
    /// period-scoped computations.
    InvalidDate {
        id: String,
        kind: EntryKind,
        raw: Option<String>,
    },
    /// A negative amount was stored; it was clamped to zero.
    NegativeAmount {
        id: String,
        kind: EntryKind,
        amount: MoneyCents,
    },
    /// The amount field was present but empty or not a number; it was
    /// treated as zero.
    UnreadableAmount {
        id: String,
        kind: EntryKind,
        raw: String,
    },
    /// The method text is not a known payment method; the payment counts as
    /// income with no method.
    UnknownMethod {
        id: String,
        kind: EntryKind,
        raw: String,
    },
}

impl Diagnostic {
    pub fn id(&self) -> &str {
        match self {
            Self::InvalidDate { id, .. }
            | Self::NegativeAmount { id, .. }
            | Self::UnreadableAmount { id, .. }
            | Self::UnknownMethod { id, .. } => id,
        }
    }
}

/// A computed value plus the diagnostics raised while computing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reported<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Reported<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Number of entries left out because their date was unreadable.
    pub fn skipped_dates(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::InvalidDate { .. }))
            .count()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reported<U> {
        Reported {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }
}

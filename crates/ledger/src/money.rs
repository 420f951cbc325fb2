use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// An amount of money in cents. Positive or negative.
///
/// Balances and totals are folded over `MoneyCents` only. Amounts stored as
/// floats are turned into cents once, by the normalizer, through
/// [`MoneyCents::from_major`].
///
/// `+`, `-` and `Sum` saturate at the `i64` bounds instead of overflowing;
/// use [`MoneyCents::checked_add`] to detect it. The normalizer never lets an
/// amount above [`MoneyCents::MAX_AMOUNT`] in.
///
/// ```rust
/// use ledger::MoneyCents;
///
/// let fare = MoneyCents::new(150_00);
/// assert_eq!(fare.to_string(), "150.00");
/// assert_eq!("150,5".parse::<MoneyCents>().unwrap(), MoneyCents::new(150_50));
/// assert!("150.505".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Largest single amount a stored record may carry (ten trillion units).
    pub const MAX_AMOUNT: MoneyCents = MoneyCents(1_000_000_000_000_000);

    /// Creates an amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a value in whole currency units (`12.345`) to cents,
    /// rounding half away from zero as the value reads in decimal.
    ///
    /// `None` for NaN, infinities and anything past the `i64` range.
    #[must_use]
    pub fn from_major(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        // Shortest decimal that reads back as `value`: `12.345`, not
        // `12.3449999..`. Float `Display` never uses an exponent.
        let text = value.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let half_up = digits.next().is_some_and(|digit| digit >= 5);

        let cents = whole
            .parse::<i64>()
            .ok()?
            .checked_mul(100)?
            .checked_add(tenths * 10 + hundredths + i64::from(half_up))?;
        Some(Self(if value.is_sign_negative() { -cents } else { cents }))
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is below 0.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Addition that returns `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Subtraction that returns `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> MoneyCents {
        MoneyCents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        *self = *self + rhs;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> MoneyCents {
        MoneyCents(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> MoneyCents {
        MoneyCents(self.0.saturating_neg())
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a MoneyCents> for MoneyCents {
    fn sum<I: Iterator<Item = &'a MoneyCents>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Amount text as typed into the datastore: optional sign, whole units,
/// then up to two decimals after `.` or `,` (`"1500"`, `"-12,5"`, `"0.05"`).
/// No thousands separators.
impl FromStr for MoneyCents {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = |reason: &str| LedgerError::InvalidAmount(format!("{reason}: \"{s}\""));

        let text = s.trim();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (whole, fraction) = digits
            .split_once(['.', ','])
            .unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(reject("not an amount"));
        }
        if fraction.len() > 2 {
            return Err(reject("more than two decimals"));
        }
        let fraction_cents: i64 = format!("{fraction:0<2}")
            .parse()
            .map_err(|_| reject("not an amount"))?;

        let cents = whole
            .parse::<i64>()
            .ok()
            .and_then(|units| units.checked_mul(100))
            .and_then(|cents| cents.checked_add(fraction_cents))
            .ok_or_else(|| reject("amount out of range"))?;
        Ok(MoneyCents(if negative { -cents } else { cents }))
    }
}

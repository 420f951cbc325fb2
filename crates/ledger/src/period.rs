//! Date ranges used to scope aggregates and display windows.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, ResultLedger, util::local_midnight};

/// A `[start, end)` range in UTC. Either bound may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Period {
    /// The whole history.
    pub const ALL: Period = Period {
        start: None,
        end: None,
    };

    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ResultLedger<Self> {
        if let (Some(start), Some(end)) = (start, end)
            && start >= end
        {
            return Err(LedgerError::InvalidRange(
                "start must be < end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Calendar month `month` of `year` in the business time zone.
    pub fn month(year: i32, month: u32, tz: Tz) -> ResultLedger<Self> {
        let invalid = || LedgerError::InvalidMonth { year, month };
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        Self::local_dates(first, next, tz).ok_or_else(invalid)
    }

    fn local_dates(first: NaiveDate, next: NaiveDate, tz: Tz) -> Option<Self> {
        Some(Self {
            start: Some(local_midnight(tz, first)?),
            end: Some(local_midnight(tz, next)?),
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant < end)
    }

    pub fn is_all(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

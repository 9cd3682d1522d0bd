//! Trailing look-back periods such as `1d`, `7d`, `1m`, `3m`, `1y`.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};

use super::provider::DataError;

/// Unit of a look-back period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A trailing window of `count` units ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub count: u32,
    pub unit: PeriodUnit,
}

impl Period {
    pub const fn days(count: u32) -> Self {
        Self {
            count,
            unit: PeriodUnit::Day,
        }
    }

    pub const fn months(count: u32) -> Self {
        Self {
            count,
            unit: PeriodUnit::Month,
        }
    }

    /// First calendar day of the window that ends at `end`.
    ///
    /// Month arithmetic clamps to the end of shorter months (Mar 31 - 1m = Feb 29).
    pub fn start_from(&self, end: NaiveDate) -> NaiveDate {
        let n = self.count;
        let start = match self.unit {
            PeriodUnit::Day => end.checked_sub_days(Days::new(u64::from(n))),
            PeriodUnit::Week => end.checked_sub_days(Days::new(u64::from(n) * 7)),
            PeriodUnit::Month => end.checked_sub_months(Months::new(n)),
            PeriodUnit::Year => end.checked_sub_months(Months::new(n.saturating_mul(12))),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

impl FromStr for Period {
    type Err = DataError;

    /// Accepts `<n><unit>` with unit `d`, `w`, `m`/`mo`, `y` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| invalid(s, "missing unit"))?;
        let (digits, unit) = raw.split_at(split);

        let count: u32 = digits.parse().map_err(|_| invalid(s, "missing count"))?;
        if count == 0 {
            return Err(invalid(s, "count must be at least 1"));
        }
        let unit = match unit {
            "d" => PeriodUnit::Day,
            "w" | "wk" => PeriodUnit::Week,
            "m" | "mo" => PeriodUnit::Month,
            "y" => PeriodUnit::Year,
            other => return Err(invalid(s, &format!("unknown unit '{other}'"))),
        };
        Ok(Self { count, unit })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            PeriodUnit::Day => "d",
            PeriodUnit::Week => "w",
            PeriodUnit::Month => "m",
            PeriodUnit::Year => "y",
        };
        write!(f, "{}{unit}", self.count)
    }
}

fn invalid(input: &str, reason: &str) -> DataError {
    DataError::InvalidRequest(format!("invalid period '{input}': {reason}"))
}

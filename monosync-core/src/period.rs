//! Lookback period: an ISO-8601 duration such as `P6M` or `P1Y2M10DT2H`.
//!
//! Years and months are calendar units and are subtracted with month
//! arithmetic (Mar 31 minus one month is Feb 28/29). Everything else is a
//! fixed number of seconds.

use chrono::{DateTime, Duration, Months, Utc};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::time::start_of_day;

/// Used when no lookback is configured.
pub const DEFAULT_LOOKBACK: &str = "P6M";

/// Fixed-length part is capped so date arithmetic can never overflow.
const MAX_FIXED_SECONDS: i64 = 10_000 * 366 * 86_400;
const MAX_MONTHS: u32 = 10_000 * 12;

#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("invalid ISO-8601 duration '{0}' (expected e.g. P6M, P1Y, P30D, PT12H)")]
    Invalid(String),
    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
    #[error("duration pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookbackPeriod {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl LookbackPeriod {
    pub fn months(months: u32) -> Self {
        Self {
            months,
            ..Self::default()
        }
    }

    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    pub fn parse(input: &str) -> Result<Self, PeriodError> {
        let s = input.trim().to_ascii_uppercase();
        let invalid = || PeriodError::Invalid(input.to_string());

        let re = Regex::new(concat!(
            r"^P(?:(?P<y>\d+)Y)?(?:(?P<mo>\d+)M)?(?:(?P<w>\d+)W)?(?:(?P<d>\d+)D)?",
            r"(?:T(?:(?P<h>\d+)H)?(?:(?P<mi>\d+)M)?(?:(?P<s>\d+)S)?)?$"
        ))?;
        let caps = re.captures(&s).ok_or_else(invalid)?;
        // "P", "PT" and "P1DT" match the pattern but carry no component after the designator.
        if s == "P" || s.ends_with('T') {
            return Err(invalid());
        }

        let field = |name: &str| -> Result<u32, PeriodError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u32>())
                .transpose()
                .map(|v| v.unwrap_or(0))
                .map_err(|_| PeriodError::OutOfRange(input.to_string()))
        };

        let period = Self {
            years: field("y")?,
            months: field("mo")?,
            weeks: field("w")?,
            days: field("d")?,
            hours: field("h")?,
            minutes: field("mi")?,
            seconds: field("s")?,
        };

        let months_ok = period
            .calendar_months()
            .is_some_and(|m| m <= MAX_MONTHS);
        if !months_ok || period.fixed_seconds() > MAX_FIXED_SECONDS {
            return Err(PeriodError::OutOfRange(input.to_string()));
        }

        Ok(period)
    }

    fn calendar_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    fn fixed_seconds(&self) -> i64 {
        i64::from(self.weeks) * 7 * 86_400
            + i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3_600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds)
    }

    /// `now` minus this period, normalized to 00:00:00 UTC of that day.
    pub fn boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = self.calendar_months().unwrap_or(MAX_MONTHS);
        let shifted = now
            .checked_sub_months(Months::new(months))
            .and_then(|dt| dt.checked_sub_signed(Duration::seconds(self.fixed_seconds())))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        start_of_day(shifted)
    }
}

impl FromStr for LookbackPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value > 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            write!(f, "T")?;
            for (value, unit) in [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')] {
                if value > 0 {
                    write!(f, "{value}{unit}")?;
                }
            }
        }
        if *self == Self::default() {
            write!(f, "0D")?;
        }
        Ok(())
    }
}

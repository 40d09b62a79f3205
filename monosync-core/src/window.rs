//! Window planner: which slice of remote history to request, and in what pieces.
//!
//! The statement endpoint accepts at most 31 days per call, so the range
//! `[from, end of today]` is walked backward in windows of that width.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::time::{day_start, end_of_day, to_unix};

/// Widest window the statement endpoint accepts.
pub const MAX_STATEMENT_WINDOW_DAYS: i64 = 31;

/// Effective start of the fetch range.
///
/// The lookback boundary wins unless the cursor is older than it, in which
/// case the range is extended back to the cursor's day. A cursor newer than
/// the boundary does not shrink the range; dedup stops the walk instead.
pub fn fetch_start(lookback_boundary: DateTime<Utc>, cursor_date: Option<NaiveDate>) -> DateTime<Utc> {
    match cursor_date.map(day_start) {
        Some(cursor) if cursor < lookback_boundary => cursor,
        _ => lookback_boundary,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Bounds as whole unix seconds, as sent to the statement endpoint.
    pub fn unix_bounds(&self) -> (i64, i64) {
        (to_unix(self.start), to_unix(self.end))
    }

    pub fn width(&self) -> Duration {
        self.end - self.start
    }
}

/// Lazy newest-first walk over `[from, end_of_day(now)]`.
///
/// Consecutive windows share a boundary (`next.end == prev.start`); the last
/// window is clipped so it never starts before `from`.
#[derive(Debug, Clone)]
pub struct StatementWindows {
    from: DateTime<Utc>,
    end: DateTime<Utc>,
    width: Duration,
}

impl StatementWindows {
    pub fn new(from: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            from,
            end: end_of_day(now),
            width: Duration::days(MAX_STATEMENT_WINDOW_DAYS),
        }
    }
}

impl Iterator for StatementWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.end <= self.from {
            return None;
        }
        let start = (self.end - self.width).max(self.from);
        let window = Window {
            start,
            end: self.end,
        };
        self.end = start;
        Some(window)
    }
}

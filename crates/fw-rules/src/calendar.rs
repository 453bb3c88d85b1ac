//! Trading-day calendar under a firm timezone.
//!
//! Prop firms reset daily counters at a fixed wall-clock time in their own
//! timezone (Topstep: 17:00 America/Chicago). The engine never reads its own
//! clock; every boundary decision is made against the snapshot timestamp
//! converted to the rule's timezone.
//!
//! Labeling convention (session start): a timestamp whose local time is at or
//! after the reset belongs to that local calendar date; an earlier timestamp
//! belongs to the previous date. So a snapshot just after midnight UTC can
//! still belong to the prior trading day in the firm's timezone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    UnknownTimezone { raw: String },
    /// Not a valid "HH:MM" wall-clock time.
    BadWallClock { raw: String },
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTimezone { raw } => write!(f, "unknown timezone {raw:?}"),
            Self::BadWallClock { raw } => write!(f, "{raw:?} is not a valid HH:MM time"),
        }
    }
}

impl std::error::Error for CalendarError {}

/// Parse a "HH:MM" wall-clock string.
pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, CalendarError> {
    let bad = || CalendarError::BadWallClock { raw: raw.to_string() };
    let (h, m) = raw.split_once(':').ok_or_else(bad)?;
    if h.is_empty() || m.len() != 2 {
        return Err(bad());
    }
    let hour: u32 = h.parse().map_err(|_| bad())?;
    let minute: u32 = m.parse().map_err(|_| bad())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(bad)
}

/// A (timezone, daily reset time) pair defining trading-day boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    tz: Tz,
    reset: NaiveTime,
}

impl SessionClock {
    pub fn new(timezone: &str, reset_time: &str) -> Result<Self, CalendarError> {
        let tz = Tz::from_str(timezone).map_err(|_| CalendarError::UnknownTimezone {
            raw: timezone.to_string(),
        })?;
        let reset = parse_hhmm(reset_time)?;
        Ok(Self { tz, reset })
    }

    /// UTC with a midnight reset — the fallback when no daily-loss rule
    /// defines the session.
    pub fn utc_midnight() -> Self {
        Self { tz: chrono_tz::UTC, reset: NaiveTime::MIN }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The trading date a UTC timestamp belongs to (session-start labeling).
    pub fn trading_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        let local = ts.with_timezone(&self.tz);
        let date = local.date_naive();
        if local.time() >= self.reset {
            date
        } else {
            date.pred_opt().unwrap_or(date)
        }
    }

    /// The next reset instant strictly after `ts`.
    pub fn next_reset(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let local = ts.with_timezone(&self.tz);
        let date = if local.time() < self.reset {
            local.date_naive()
        } else {
            local.date_naive().succ_opt().unwrap_or(local.date_naive())
        };
        self.resolve_local(date, self.reset)
    }

    /// Format the next reset as firm-local wall clock, for recovery paths.
    pub fn next_reset_display(&self, ts: DateTime<Utc>) -> String {
        let next = self.next_reset(ts).with_timezone(&self.tz);
        format!("{}", next.format("%Y-%m-%d %H:%M %Z"))
    }

    /// Resolve a local (date, time) to UTC, tolerating DST gaps/folds: an
    /// ambiguous local time takes its earlier mapping, a nonexistent one is
    /// pushed forward an hour.
    pub fn resolve_local(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
            LocalResult::None => {
                let shifted = naive + Duration::hours(1);
                match self.tz.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                        dt.with_timezone(&Utc)
                    }
                    // A second gap back-to-back does not occur in tzdata.
                    LocalResult::None => Utc.from_utc_datetime(&shifted),
                }
            }
        }
    }

    /// Seconds from `ts` until the given local wall-clock time today
    /// (firm-local); 0 if that time has already passed.
    pub fn seconds_until_local(&self, ts: DateTime<Utc>, time: NaiveTime) -> i64 {
        let local = ts.with_timezone(&self.tz);
        if local.time() >= time {
            return 0;
        }
        let deadline = self.resolve_local(local.date_naive(), time);
        (deadline - ts).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chicago_1700() -> SessionClock {
        SessionClock::new("America/Chicago", "17:00").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert!(matches!(
            SessionClock::new("America/Gotham", "17:00"),
            Err(CalendarError::UnknownTimezone { .. })
        ));
    }

    #[test]
    fn rejects_bad_wall_clock() {
        for raw in ["1700", "25:00", "17:0", "17:60", ":30", "17:xx"] {
            assert!(parse_hhmm(raw).is_err(), "{raw} should be rejected");
        }
        assert_eq!(parse_hhmm("17:00").unwrap(), NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }

    // America/Chicago is UTC-6 in winter, so the 17:00 local reset sits at
    // 23:00Z. Late-evening UTC on Jan 2 can therefore still be trading day
    // Jan 1 in the firm's calendar.
    #[test]
    fn chicago_reset_boundary_in_winter() {
        let clock = chicago_1700();
        // 04:59Z Jan 2 = 22:59 Jan 1 local, after the 17:00 reset -> Jan 1.
        assert_eq!(clock.trading_date(utc("2024-01-02T04:59:00Z")), d(2024, 1, 1));
        // 22:59Z Jan 2 = 16:59 local, before the reset -> still Jan 1.
        assert_eq!(clock.trading_date(utc("2024-01-02T22:59:00Z")), d(2024, 1, 1));
        // 23:01Z Jan 2 = 17:01 local, past the reset -> Jan 2 begins.
        assert_eq!(clock.trading_date(utc("2024-01-02T23:01:00Z")), d(2024, 1, 2));
    }

    #[test]
    fn snapshot_after_midnight_utc_belongs_to_prior_trading_day() {
        let clock = chicago_1700();
        assert_eq!(clock.trading_date(utc("2024-01-02T00:30:00Z")), d(2024, 1, 1));
    }

    #[test]
    fn utc_midnight_clock_uses_calendar_dates() {
        let clock = SessionClock::utc_midnight();
        assert_eq!(clock.trading_date(utc("2024-01-02T00:00:01Z")), d(2024, 1, 2));
        assert_eq!(clock.trading_date(utc("2024-01-01T23:59:59Z")), d(2024, 1, 1));
    }

    #[test]
    fn next_reset_is_strictly_ahead() {
        let clock = chicago_1700();
        // 16:59 local -> today's reset, one minute away.
        let ts = utc("2024-01-02T22:59:00Z");
        assert_eq!(clock.next_reset(ts), utc("2024-01-02T23:00:00Z"));
        // 17:01 local -> tomorrow's reset.
        let ts = utc("2024-01-02T23:01:00Z");
        assert_eq!(clock.next_reset(ts), utc("2024-01-03T23:00:00Z"));
    }

    #[test]
    fn next_reset_display_is_firm_local() {
        let clock = chicago_1700();
        let s = clock.next_reset_display(utc("2024-01-02T22:59:00Z"));
        assert_eq!(s, "2024-01-02 17:00 CST");
    }

    #[test]
    fn seconds_until_local_counts_down_and_floors_at_zero() {
        let clock = SessionClock::new("America/New_York", "17:00").unwrap();
        let close = parse_hhmm("16:59").unwrap();
        // 21:49Z Jan 2 = 16:49 local (UTC-5 in winter): 10 minutes left.
        assert_eq!(clock.seconds_until_local(utc("2024-01-02T21:49:00Z"), close), 600);
        // Already past the deadline.
        assert_eq!(clock.seconds_until_local(utc("2024-01-02T22:30:00Z"), close), 0);
    }

    #[test]
    fn dst_spring_forward_gap_is_pushed_ahead() {
        // 2024-03-10 02:30 does not exist in America/Chicago; resolution lands
        // one hour later rather than failing.
        let clock = SessionClock::new("America/Chicago", "02:30").unwrap();
        let resolved = clock.resolve_local(d(2024, 3, 10), parse_hhmm("02:30").unwrap());
        assert_eq!(resolved, utc("2024-03-10T08:30:00Z"));
    }
}

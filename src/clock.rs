//! Reference-timezone clock
//!
//! Prompt quotas reset at US Eastern midnight regardless of where the app or
//! its backend happen to run. Every wall-clock read goes through the `Clock`
//! trait so tests can pin "now" to exact boundary instants.

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Civil timezone used for all quota date math
pub const REFERENCE_TZ: Tz = New_York;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Current calendar day in the reference timezone, formatted `YYYY-MM-DD`
pub fn reference_date(clock: &dyn Clock) -> String {
    clock
        .now_utc()
        .with_timezone(&REFERENCE_TZ)
        .format("%Y-%m-%d")
        .to_string()
}

/// Current calendar month in the reference timezone, formatted `YYYY-MM`
pub fn reference_month(clock: &dyn Clock) -> String {
    clock
        .now_utc()
        .with_timezone(&REFERENCE_TZ)
        .format("%Y-%m")
        .to_string()
}

/// First day of the current reference month, formatted `YYYY-MM-DD`
pub(crate) fn reference_month_start(clock: &dyn Clock) -> String {
    format!("{}-01", reference_month(clock))
}

/// Test clock pinned to a single instant
#[cfg(test)]
pub(crate) struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl FixedClock {
    /// Pin the clock to an RFC 3339 instant, e.g. `2024-01-06T04:59:59Z`
    pub fn at(instant: &str) -> Self {
        Self(
            DateTime::parse_from_rfc3339(instant)
                .expect("valid RFC 3339 instant")
                .with_timezone(&Utc),
        )
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_uses_eastern_not_utc() {
        // 04:59 UTC is still the previous day in EST (UTC-5)
        let clock = FixedClock::at("2024-01-06T04:59:00Z");
        assert_eq!(reference_date(&clock), "2024-01-05");

        let clock = FixedClock::at("2024-01-06T05:00:01Z");
        assert_eq!(reference_date(&clock), "2024-01-06");
    }

    #[test]
    fn test_date_respects_daylight_saving() {
        // In July the offset is UTC-4, so the day flips an hour earlier
        let clock = FixedClock::at("2024-07-01T03:59:00Z");
        assert_eq!(reference_date(&clock), "2024-06-30");

        let clock = FixedClock::at("2024-07-01T04:00:01Z");
        assert_eq!(reference_date(&clock), "2024-07-01");
    }

    #[test]
    fn test_month_boundary() {
        let clock = FixedClock::at("2024-02-01T04:59:59Z");
        assert_eq!(reference_month(&clock), "2024-01");
        assert_eq!(reference_date(&clock), "2024-01-31");

        let clock = FixedClock::at("2024-02-01T05:00:01Z");
        assert_eq!(reference_month(&clock), "2024-02");
        assert_eq!(reference_month_start(&clock), "2024-02-01");
    }
}

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// A single day's regular and extended trading session, in local wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DaySession {
    pub regular_open: NaiveTime,
    pub regular_close: NaiveTime,
    pub extended_open: Option<NaiveTime>,
    pub extended_close: Option<NaiveTime>,
}

impl DaySession {
    pub fn closed() -> Self {
        Self {
            regular_open: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            regular_close: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            extended_open: None,
            extended_close: None,
        }
    }
}

/// Minimal exchange-hours table: one [`DaySession`] per weekday, shared across all
/// symbols routed to the same exchange. Real deployments supply their own table per
/// security; this engine ships a built-in NYSE-style constant (used by tests and
/// available as a sane default) so C4 can be exercised without an external catalog.
#[derive(Clone, Debug)]
pub struct TradingHours {
    pub time_zone: Tz,
    sessions: [DaySession; 7],
}

impl TradingHours {
    pub fn new(time_zone: Tz, sessions: [DaySession; 7]) -> Self {
        Self { time_zone, sessions }
    }

    fn session_for(&self, weekday: Weekday) -> &DaySession {
        &self.sessions[weekday.num_days_from_monday() as usize]
    }

    /// Whether `instant` falls within the regular (and, if `extended` is set, the
    /// extended) session for its local weekday.
    pub fn is_open(&self, instant: DateTime<Utc>, extended: bool) -> bool {
        let local = instant.with_timezone(&self.time_zone);
        let session = self.session_for(local.weekday());
        let time = local.time();
        let in_regular = time >= session.regular_open && time < session.regular_close;
        if in_regular {
            return true;
        }
        if extended {
            if let (Some(open), Some(close)) = (session.extended_open, session.extended_close) {
                return time >= open && time < close;
            }
        }
        false
    }

    /// A standard US-equity-style 09:30-16:00 regular session with a 04:00-20:00
    /// extended session, Monday through Friday, in `America/New_York`.
    pub fn us_equity_default() -> Self {
        let trading_day = DaySession {
            regular_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            regular_close: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            extended_open: Some(NaiveTime::from_hms_opt(4, 0, 0).unwrap()),
            extended_close: Some(NaiveTime::from_hms_opt(20, 0, 0).unwrap()),
        };
        let closed = DaySession::closed();
        TradingHours::new(
            "America/New_York".parse().unwrap(),
            [
                trading_day, // Monday
                trading_day, // Tuesday
                trading_day, // Wednesday
                trading_day, // Thursday
                trading_day, // Friday
                closed,      // Saturday
                closed,      // Sunday
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn open_during_regular_session() {
        let hours = TradingHours::us_equity_default();
        // 2015-10-08 was a Thursday; 12:00 NYC (EDT, UTC-4) is 16:00 UTC.
        let instant = Utc.with_ymd_and_hms(2015, 10, 8, 16, 0, 0).unwrap();
        assert!(hours.is_open(instant, false));
    }

    #[test]
    fn closed_overnight_without_extended_hours() {
        let hours = TradingHours::us_equity_default();
        let instant = Utc.with_ymd_and_hms(2015, 10, 8, 6, 0, 0).unwrap(); // 02:00 NYC
        assert!(!hours.is_open(instant, false));
        assert!(!hours.is_open(instant, true));
    }

    #[test]
    fn closed_on_weekend() {
        let hours = TradingHours::us_equity_default();
        // 2015-10-10 was a Saturday.
        let instant = Utc.with_ymd_and_hms(2015, 10, 10, 16, 0, 0).unwrap();
        assert!(!hours.is_open(instant, false));
    }
}

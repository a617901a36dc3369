//! Wall-clock source for deadlines and calendar days.

use chrono::{DateTime, Local, NaiveDate};

/// Source of the current wall-clock instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// The local calendar day of `now()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Reads the operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to (for testing).
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Local>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// A fixed mid-day instant, far from any DST transition.
    pub fn at_noon(year: i32, month: u32, day: u32) -> Self {
        use chrono::TimeZone;
        Self::new(Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(chrono::Duration::seconds(secs));
    }

    pub fn advance_millis(&self, millis: i64) {
        self.advance(chrono::Duration::milliseconds(millis));
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at_noon(2024, 6, 15);
        let start = clock.now();
        clock.advance_secs(90);
        assert_eq!((clock.now() - start).num_seconds(), 90);
    }

    #[test]
    fn test_today_crosses_midnight() {
        let clock = ManualClock::at_noon(2024, 6, 15);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        clock.advance(chrono::Duration::hours(12) + chrono::Duration::seconds(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());
    }
}

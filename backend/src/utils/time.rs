use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

/// Source of the current instant, injected so clock events can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard = instant;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Returns the instant converted into the configured timezone.
pub fn in_timezone(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    instant.with_timezone(tz)
}

/// Returns the calendar date of the instant in the configured timezone.
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    in_timezone(instant, tz).date_naive()
}

/// Returns the wall-clock time of the instant in the configured timezone.
pub fn local_time(instant: DateTime<Utc>, tz: &Tz) -> NaiveTime {
    in_timezone(instant, tz).time()
}

/// Returns today's date in the configured timezone.
pub fn today_local(clock: &dyn Clock, tz: &Tz) -> NaiveDate {
    local_date(clock.now(), tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_date_crosses_midnight_in_zone() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 3, 31, 16, 30, 0).unwrap();
        assert_eq!(
            local_date(instant, &tz),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert_eq!(
            local_time(instant, &tz),
            NaiveTime::from_hms_opt(1, 30, 0).unwrap()
        );
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        let later = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
        assert_eq!(
            today_local(&clock, &chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn system_clock_is_close_to_utc_now() {
        let diff = (SystemClock.now() - Utc::now()).num_seconds().abs();
        assert!(diff < 2, "Difference should be less than 2 seconds");
    }
}

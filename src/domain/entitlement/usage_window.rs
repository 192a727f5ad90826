//! Canonical quota windows.
//!
//! Every metered quota is counted within a fixed-length window. Windows are
//! computed in a fixed UTC offset and start at local midnight on a
//! configured weekday. Windows of `window_days` are laid end to end from the
//! first such weekday on or after 1970-01-01, so any two processes with the
//! same policy agree on the window for any instant.

use chrono::{FixedOffset, Offset, Utc, Weekday};

use crate::domain::foundation::{Timestamp, ValidationError};

const SECS_PER_DAY: i64 = 86_400;

/// How quota windows are laid out in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    week_start: Weekday,
    utc_offset: FixedOffset,
}

impl Default for WindowPolicy {
    /// Sunday 00:00 UTC.
    fn default() -> Self {
        Self {
            week_start: Weekday::Sun,
            utc_offset: Utc.fix(),
        }
    }
}

impl WindowPolicy {
    /// Creates a policy; the offset must be strictly within ±24h.
    pub fn new(week_start: Weekday, utc_offset_minutes: i32) -> Result<Self, ValidationError> {
        let utc_offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ValidationError::out_of_range(
                    "window_utc_offset_minutes",
                    -1439,
                    1439,
                    i64::from(utc_offset_minutes),
                )
            })?;
        Ok(Self {
            week_start,
            utc_offset,
        })
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Start of the window of length `window_days` containing `now`.
    ///
    /// A zero length is treated as one day.
    pub fn window_start(&self, now: Timestamp, window_days: u32) -> Timestamp {
        let len = i64::from(window_days.max(1)) * SECS_PER_DAY;
        let anchor = self.anchor_secs();
        let elapsed = now.as_unix_secs() - anchor;
        let start = anchor + elapsed.div_euclid(len) * len;
        Timestamp::from_unix_secs(start).unwrap_or(now)
    }

    /// First instant of the window after the one containing `now`.
    pub fn window_end(&self, now: Timestamp, window_days: u32) -> Timestamp {
        let start = self.window_start(now, window_days);
        start.add_days(i64::from(window_days.max(1)))
    }

    /// Unix seconds of local midnight on the first `week_start` on or after
    /// 1970-01-01 (a Thursday).
    fn anchor_secs(&self) -> i64 {
        let thursday = Weekday::Thu.num_days_from_monday();
        let days = (self.week_start.num_days_from_monday() + 7 - thursday) % 7;
        i64::from(days) * SECS_PER_DAY - i64::from(self.utc_offset.local_minus_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, TimeZone, Timelike};
    use proptest::prelude::*;

    fn utc_at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
    }

    #[test]
    fn default_is_sunday_utc() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.week_start(), Weekday::Sun);
        assert_eq!(policy.utc_offset().local_minus_utc(), 0);
    }

    #[test]
    fn midweek_maps_to_previous_sunday() {
        // 2024-01-10 is a Wednesday.
        let start = WindowPolicy::default().window_start(utc_at(2024, 1, 10, 15, 0, 0), 7);
        assert_eq!(start, utc_at(2024, 1, 7, 0, 0, 0));
    }

    #[test]
    fn boundary_instant_starts_new_window() {
        let policy = WindowPolicy::default();
        let sunday = utc_at(2024, 1, 7, 0, 0, 0);
        assert_eq!(policy.window_start(sunday, 7), sunday);
        assert_eq!(
            policy.window_start(sunday.add_secs(-1), 7),
            utc_at(2023, 12, 31, 0, 0, 0)
        );
    }

    #[test]
    fn window_end_is_next_start() {
        let policy = WindowPolicy::default();
        let now = utc_at(2024, 1, 10, 15, 0, 0);
        assert_eq!(policy.window_end(now, 7), utc_at(2024, 1, 14, 0, 0, 0));
    }

    #[test]
    fn offset_shifts_local_midnight() {
        // 19:00 UTC Saturday is 00:30 Sunday at +05:30.
        let policy = WindowPolicy::new(Weekday::Sun, 330).unwrap();
        let start = policy.window_start(utc_at(2024, 1, 6, 19, 0, 0), 7);
        assert_eq!(start, utc_at(2024, 1, 6, 18, 30, 0));
    }

    #[test]
    fn monday_start_is_honoured() {
        let policy = WindowPolicy::new(Weekday::Mon, 0).unwrap();
        let start = policy.window_start(utc_at(2024, 1, 10, 15, 0, 0), 7);
        assert_eq!(start, utc_at(2024, 1, 8, 0, 0, 0));
    }

    #[test]
    fn zero_length_window_is_one_day() {
        let policy = WindowPolicy::default();
        let start = policy.window_start(utc_at(2024, 1, 10, 15, 0, 0), 0);
        assert_eq!(start, utc_at(2024, 1, 10, 0, 0, 0));
    }

    #[test]
    fn new_rejects_full_day_offset() {
        assert!(WindowPolicy::new(Weekday::Sun, 24 * 60).is_err());
        assert!(WindowPolicy::new(Weekday::Sun, i32::MAX).is_err());
    }

    fn weekday_strategy() -> impl Strategy<Value = Weekday> {
        (0u8..7).prop_map(|n| match n {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        })
    }

    proptest! {
        #[test]
        fn window_contains_now(
            secs in 0i64..4_102_444_800,
            days in 1u32..60,
            offset in -1439i32..1440,
            weekday in weekday_strategy(),
        ) {
            let policy = WindowPolicy::new(weekday, offset).unwrap();
            let now = Timestamp::from_unix_secs(secs).unwrap();
            let start = policy.window_start(now, days);
            let end = policy.window_end(now, days);
            prop_assert!(start <= now);
            prop_assert!(now < end);
            prop_assert_eq!(end.as_unix_secs() - start.as_unix_secs(), i64::from(days) * SECS_PER_DAY);
        }

        #[test]
        fn weekly_window_starts_at_local_midnight_on_week_start(
            secs in 0i64..4_102_444_800,
            offset in -1439i32..1440,
            weekday in weekday_strategy(),
        ) {
            let policy = WindowPolicy::new(weekday, offset).unwrap();
            let start = policy.window_start(Timestamp::from_unix_secs(secs).unwrap(), 7);
            let local = start.as_datetime().with_timezone(&policy.utc_offset());
            prop_assert_eq!(local.weekday(), weekday);
            prop_assert_eq!(local.hour(), 0);
            prop_assert_eq!(local.minute(), 0);
            prop_assert_eq!(local.second(), 0);
        }

        #[test]
        fn window_start_is_idempotent(secs in 0i64..4_102_444_800, days in 1u32..60) {
            let policy = WindowPolicy::default();
            let start = policy.window_start(Timestamp::from_unix_secs(secs).unwrap(), days);
            prop_assert_eq!(policy.window_start(start, days), start);
        }
    }

    #[test]
    fn anchor_is_first_matching_weekday() {
        let policy = WindowPolicy::new(Weekday::Sun, 0).unwrap();
        let anchor = Timestamp::from_unix_secs(policy.anchor_secs()).unwrap();
        assert_eq!(
            anchor.as_datetime().date_naive(),
            NaiveDate::from_ymd_opt(1970, 1, 4).unwrap()
        );
    }
}

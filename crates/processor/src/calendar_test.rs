#[cfg(test)]
mod tests {
    use crate::calendar::*;
    use crate::memory::MemoryStore;
    use crate::store::AbsenceStore;
    use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
    use common::models::Absence;
    use common::CalendarConfig;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn calendar() -> Calendar {
        let mut config = CalendarConfig::default();
        config.holidays.insert(date(2021, 1, 1));
        config.working_weekends.insert(date(2021, 2, 20));
        Calendar::new(config)
    }

    // is_holiday

    #[test]
    fn test_weekends_are_holidays() {
        let cal = calendar();
        assert!(cal.is_holiday(date(2021, 1, 2)));
        assert!(cal.is_holiday(date(2021, 1, 3)));
        assert!(!cal.is_holiday(date(2021, 1, 4)));
    }

    #[test]
    fn test_listed_holiday_and_working_weekend() {
        let cal = calendar();
        assert!(cal.is_holiday(date(2021, 1, 1)));
        assert!(!cal.is_holiday(date(2021, 2, 20)));
        assert!(cal.is_holiday(date(2021, 2, 21)));
    }

    #[test]
    fn test_holiday_rule_over_whole_year() {
        let cal = calendar();
        let config = cal.config().clone();
        let mut day = date(2021, 1, 1);
        while day.year() == 2021 {
            let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
            let expected = (weekend && !config.working_weekends.contains(&day))
                || config.holidays.contains(&day);
            assert_eq!(cal.is_holiday(day), expected, "{}", day);
            day = day.succ_opt().unwrap();
        }
    }

    // nearest_working_instant

    #[test]
    fn test_inside_working_hours_unchanged() {
        let cal = calendar();
        assert_eq!(cal.nearest_working_instant(at(2020, 12, 31, 16, 0)), at(2020, 12, 31, 16, 0));
        assert_eq!(cal.nearest_working_instant(at(2021, 1, 4, 17, 0)), at(2021, 1, 4, 17, 0));
    }

    #[test]
    fn test_before_start_moves_to_start() {
        let cal = calendar();
        assert_eq!(cal.nearest_working_instant(at(2021, 1, 4, 6, 45)), at(2021, 1, 4, 8, 0));
    }

    #[test]
    fn test_after_end_skips_holidays() {
        let cal = calendar();
        // Thursday evening, Friday is a holiday, then the weekend
        assert_eq!(cal.nearest_working_instant(at(2020, 12, 31, 18, 0)), at(2021, 1, 4, 8, 0));
    }

    #[test]
    fn test_weekend_moves_to_monday() {
        let cal = calendar();
        assert_eq!(cal.nearest_working_instant(at(2021, 1, 9, 11, 0)), at(2021, 1, 11, 8, 0));
    }

    #[test]
    fn test_working_weekend_is_kept() {
        let cal = calendar();
        assert_eq!(cal.nearest_working_instant(at(2021, 2, 20, 11, 0)), at(2021, 2, 20, 11, 0));
    }

    #[test]
    fn test_nearest_is_idempotent() {
        let cal = calendar();
        let mut t = at(2020, 12, 28, 0, 0);
        let end = at(2021, 1, 12, 0, 0);
        while t < end {
            let once = cal.nearest_working_instant(t);
            assert_eq!(cal.nearest_working_instant(once), once, "{}", t);
            t += Duration::minutes(37);
        }
    }

    // working_duration_between

    #[test]
    fn test_full_working_day_length() {
        assert_eq!(calendar().working_day(), Duration::hours(9));
    }

    #[test]
    fn test_same_day_duration() {
        let cal = calendar();
        assert_eq!(
            cal.working_duration_between(at(2021, 1, 4, 9, 0), at(2021, 1, 4, 10, 30)),
            Duration::minutes(90)
        );
    }

    #[test]
    fn test_overnight_duration() {
        let cal = calendar();
        assert_eq!(
            cal.working_duration_between(at(2021, 1, 4, 16, 0), at(2021, 1, 5, 9, 0)),
            Duration::hours(2)
        );
    }

    #[test]
    fn test_duration_across_holiday_and_weekend() {
        let cal = calendar();
        assert_eq!(
            cal.working_duration_between(at(2020, 12, 31, 16, 0), at(2021, 1, 4, 9, 0)),
            Duration::hours(2)
        );
    }

    #[test]
    fn test_duration_counts_full_days_between() {
        let cal = calendar();
        // Monday 12:00 to Thursday 12:00: three working days
        assert_eq!(
            cal.working_duration_between(at(2021, 1, 4, 12, 0), at(2021, 1, 7, 12, 0)),
            Duration::hours(27)
        );
    }

    #[test]
    fn test_duration_zero_for_same_or_reversed() {
        let cal = calendar();
        let t = at(2021, 1, 4, 10, 0);
        assert_eq!(cal.working_duration_between(t, t), Duration::zero());
        assert_eq!(
            cal.working_duration_between(at(2021, 1, 6, 10, 0), at(2021, 1, 4, 10, 0)),
            Duration::zero()
        );
    }

    #[test]
    fn test_duration_zero_when_both_outside_hours() {
        let cal = calendar();
        assert_eq!(
            cal.working_minutes_between(at(2021, 1, 4, 18, 0), at(2021, 1, 4, 23, 0)),
            0
        );
    }

    #[test]
    fn test_duration_monotonic_in_end() {
        let cal = calendar();
        let begin = at(2020, 12, 30, 15, 20);
        let mut end = begin;
        let mut previous = Duration::zero();
        for _ in 0..(14 * 24 * 4) {
            end += Duration::minutes(15);
            let current = cal.working_duration_between(begin, end);
            assert!(current >= previous, "{} -> {}", begin, end);
            previous = current;
        }
    }

    #[test]
    fn test_minutes_floor() {
        let cal = calendar();
        let begin = at(2021, 1, 4, 9, 0);
        let end = begin + Duration::seconds(15 * 60 + 59);
        assert_eq!(cal.working_minutes_between(begin, end), 15);
    }

    // week_start

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(at(2021, 1, 7, 15, 0)), date(2021, 1, 4));
        assert_eq!(week_start(at(2021, 1, 10, 23, 59)), date(2021, 1, 4));
        assert_eq!(week_start(at(2021, 1, 4, 0, 0)), date(2021, 1, 4));
        assert_eq!(week_start_datetime(at(2021, 1, 7, 15, 0)), at(2021, 1, 4, 0, 0));
    }

    // is_working_day

    #[tokio::test]
    async fn test_working_day_respects_absence() {
        let cal = calendar();
        let store = MemoryStore::new();
        let gap = Absence {
            begin: date(2021, 3, 1).and_hms_opt(0, 0, 0).unwrap(),
            end: date(2021, 3, 5).and_hms_opt(23, 59, 59).unwrap(),
        };
        store.replace_absences("bob", &[gap]).await.unwrap();

        assert!(!cal.is_working_day(at(2021, 3, 3, 10, 0), "bob", &store).await.unwrap());
        assert!(!cal.is_working_day(at(2021, 3, 1, 0, 0), "bob", &store).await.unwrap());
        assert!(cal.is_working_day(at(2021, 3, 8, 10, 0), "bob", &store).await.unwrap());
        assert!(cal.is_working_day(at(2021, 3, 3, 10, 0), "carol", &store).await.unwrap());
    }

    #[tokio::test]
    async fn test_holiday_is_never_a_working_day() {
        let cal = calendar();
        let store = MemoryStore::new();
        assert!(!cal.is_working_day(at(2021, 1, 1, 10, 0), "bob", &store).await.unwrap());
        assert!(!cal.is_working_day(at(2021, 1, 2, 10, 0), "bob", &store).await.unwrap());
        assert!(cal.is_working_day(at(2021, 2, 20, 10, 0), "bob", &store).await.unwrap());
    }
}

//! Working-time calendar
//!
//! Business hours are one fixed window per day in UTC. A day is a holiday if
//! it is listed as one, or if it falls on a weekend that is not listed as a
//! working weekend.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use common::models::Absence;
use common::CalendarConfig;

use crate::store::AbsenceStore;

/// Calendar operations over an injected [`CalendarConfig`]
#[derive(Debug, Clone)]
pub struct Calendar {
    config: CalendarConfig,
}

impl Calendar {
    pub fn new(config: CalendarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Length of one full working day
    pub fn working_day(&self) -> Duration {
        self.config.work_end - self.config.work_start
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        (weekend && !self.config.working_weekends.contains(&date))
            || self.config.holidays.contains(&date)
    }

    /// Whether `at` is a working day given one person's absences
    pub fn is_working_day_with(&self, at: DateTime<Utc>, absences: &[Absence]) -> bool {
        if self.is_holiday(at.date_naive()) {
            return false;
        }
        let naive = at.naive_utc();
        !absences.iter().any(|gap| gap.contains(naive))
    }

    /// Whether `at` is a working day for `login`, reading the absence cache.
    ///
    /// A person with no cached absences is treated as present.
    pub async fn is_working_day<S>(
        &self,
        at: DateTime<Utc>,
        login: &str,
        store: &S,
    ) -> common::Result<bool>
    where
        S: AbsenceStore + ?Sized,
    {
        if self.is_holiday(at.date_naive()) {
            return Ok(false);
        }
        let absences = store.absences(login).await?;
        Ok(self.is_working_day_with(at, &absences))
    }

    /// Snap forward to the next instant inside working hours.
    ///
    /// Per-person absence is not consulted here.
    pub fn nearest_working_instant(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.config.work_start;
        let mut date = at.date_naive();
        let time = at.time();

        let mut result = if time > self.config.work_end || self.is_holiday(date) {
            date = date.succ_opt().unwrap_or(date);
            date.and_time(start).and_utc()
        } else if time < start {
            date.and_time(start).and_utc()
        } else {
            at
        };

        while self.is_holiday(result.date_naive()) {
            result += Duration::days(1);
        }
        result
    }

    /// Working time between two instants.
    ///
    /// Both ends are snapped to working time first. Every non-holiday date
    /// after the begin date counts one full working day, corrected by the
    /// difference in time of day at the end. Returns zero when `end` does not
    /// come after `begin`.
    pub fn working_duration_between(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
        let mut begin = self.nearest_working_instant(begin);
        let end = self.nearest_working_instant(end);
        if end <= begin {
            return Duration::zero();
        }

        let full_day = self.working_day();
        let mut result = Duration::zero();
        while begin.date_naive() != end.date_naive() {
            begin += Duration::days(1);
            if !self.is_holiday(begin.date_naive()) {
                result += full_day;
            }
        }

        result + (end - begin)
    }

    /// Whole working minutes between two instants
    pub fn working_minutes_between(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        self.working_duration_between(begin, end).num_minutes()
    }
}

/// Monday of the ISO week containing `at`
pub fn week_start(at: DateTime<Utc>) -> NaiveDate {
    let date = at.date_naive();
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Midnight UTC on the Monday of the ISO week containing `at`
pub fn week_start_datetime(at: DateTime<Utc>) -> DateTime<Utc> {
    week_start(at).and_time(chrono::NaiveTime::MIN).and_utc()
}

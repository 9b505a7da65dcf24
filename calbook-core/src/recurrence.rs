//! Weekday-based recurring series.
//!
//! A series is a generator: it expands a base event into concrete occurrences and stores
//! nothing itself. Expansion goes through an RRULE (`FREQ=DAILY;BYDAY=..`) so the weekday
//! walk follows the same rules as any iCalendar consumer.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CalendarError, CalendarResult};
use crate::event::Event;

/// Largest series that will be expanded, whatever its bound.
pub const MAX_OCCURRENCES: u32 = 1_000_000;

/// Letter codes, Monday first. `R` is Thursday and `U` is Sunday.
const WEEKDAY_CODES: [(char, Weekday); 7] = [
    ('M', Weekday::Mon),
    ('T', Weekday::Tue),
    ('W', Weekday::Wed),
    ('R', Weekday::Thu),
    ('F', Weekday::Fri),
    ('S', Weekday::Sat),
    ('U', Weekday::Sun),
];

/// Non-empty set of weekdays, kept in Monday-first order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekdaySet {
    days: Vec<Weekday>,
}

impl WeekdaySet {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> CalendarResult<Self> {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();

        if days.is_empty() {
            return Err(CalendarError::InvalidWeekdays(String::new()));
        }
        Ok(WeekdaySet { days })
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// First date on or after `from` whose weekday is in the set.
    pub fn first_on_or_after(&self, from: NaiveDate) -> NaiveDate {
        (0..7)
            .map(|offset| from + Duration::days(offset))
            .find(|d| self.contains(d.weekday()))
            .unwrap_or(from)
    }

    /// BYDAY value, e.g. `MO,WE,FR`.
    fn byday(&self) -> String {
        self.days
            .iter()
            .map(|d| match d {
                Weekday::Mon => "MO",
                Weekday::Tue => "TU",
                Weekday::Wed => "WE",
                Weekday::Thu => "TH",
                Weekday::Fri => "FR",
                Weekday::Sat => "SA",
                Weekday::Sun => "SU",
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for WeekdaySet {
    type Err = CalendarError;

    /// Accepts letter codes (`MWF`) or comma-separated names (`monday,wed`).
    fn from_str(s: &str) -> CalendarResult<Self> {
        let s = s.trim();
        let invalid = || CalendarError::InvalidWeekdays(s.to_string());

        if s.contains(',') || s.len() > 7 {
            let days = s
                .split(',')
                .map(|name| name.trim().parse::<Weekday>().map_err(|_| invalid()))
                .collect::<CalendarResult<Vec<_>>>()?;
            return WeekdaySet::new(days).map_err(|_| invalid());
        }

        if let Ok(day) = s.parse::<Weekday>() {
            return WeekdaySet::new([day]);
        }

        let days = s
            .chars()
            .map(|c| {
                WEEKDAY_CODES
                    .iter()
                    .find(|(code, _)| *code == c.to_ascii_uppercase())
                    .map(|(_, day)| *day)
                    .ok_or_else(invalid)
            })
            .collect::<CalendarResult<Vec<_>>>()?;

        WeekdaySet::new(days).map_err(|_| invalid())
    }
}

impl TryFrom<String> for WeekdaySet {
    type Error = CalendarError;

    fn try_from(s: String) -> CalendarResult<Self> {
        s.parse()
    }
}

impl From<WeekdaySet> for String {
    fn from(set: WeekdaySet) -> Self {
        set.to_string()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for day in &self.days {
            if let Some((code, _)) = WEEKDAY_CODES.iter().find(|(_, d)| d == day) {
                write!(f, "{code}")?;
            }
        }
        Ok(())
    }
}

/// When a series stops: after a number of occurrences or after a date (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesBound {
    Count(u32),
    Until(NaiveDate),
}

/// A base event repeated on a set of weekdays.
#[derive(Debug, Clone)]
pub struct RecurringSeries {
    id: Uuid,
    base: Event,
    weekdays: WeekdaySet,
    bound: SeriesBound,
}

impl RecurringSeries {
    pub fn new(base: Event, weekdays: WeekdaySet, bound: SeriesBound) -> Self {
        RecurringSeries {
            id: Uuid::new_v4(),
            base,
            weekdays,
            bound,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn base(&self) -> &Event {
        &self.base
    }

    pub fn weekdays(&self) -> &WeekdaySet {
        &self.weekdays
    }

    pub fn bound(&self) -> SeriesBound {
        self.bound
    }

    /// Rebind to a count. Already stored occurrences are not touched.
    pub fn set_occurrences(&mut self, count: u32) {
        self.bound = SeriesBound::Count(count);
    }

    /// Rebind to an inclusive end date. Already stored occurrences are not touched.
    pub fn set_until(&mut self, until: NaiveDate) {
        self.bound = SeriesBound::Until(until);
    }

    /// Expand the series into its occurrences, in chronological order.
    ///
    /// Every occurrence keeps the base time of day and duration and carries the series id.
    /// The walk starts on the first selected weekday on or after the base date, so the base
    /// event itself is the first occurrence whenever its weekday is selected.
    pub fn generate_occurrences(&self) -> CalendarResult<Vec<Event>> {
        let first_day = self.weekdays.first_on_or_after(self.base.start.date());
        let first_start = first_day.and_time(self.base.start.time());

        match self.bound {
            SeriesBound::Count(0) => return Ok(Vec::new()),
            SeriesBound::Count(n) if n > MAX_OCCURRENCES => return Err(self.too_long()),
            SeriesBound::Until(until) if until < first_day => return Ok(Vec::new()),
            _ => {}
        }

        let rrule_str = build_rrule_string(first_start, &self.weekdays, self.bound);
        let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
            CalendarError::Recurrence(format!(
                "Failed to expand series '{}': {e}",
                self.base.subject
            ))
        })?;

        // One past the cap, so an over-long date-bounded series is reported instead of cut short.
        let dates: Vec<_> = rrule_set
            .into_iter()
            .take(MAX_OCCURRENCES as usize + 1)
            .collect();
        if dates.len() > MAX_OCCURRENCES as usize {
            return Err(self.too_long());
        }

        let template = self.base.clone().in_series(self.id);
        let occurrences = dates
            .iter()
            .map(|dt| template.shifted(dt.naive_utc() - self.base.start))
            .collect();

        Ok(occurrences)
    }

    fn too_long(&self) -> CalendarError {
        CalendarError::Recurrence(format!(
            "Series '{}' would have more than {MAX_OCCURRENCES} occurrences",
            self.base.subject
        ))
    }
}

/// Build the DTSTART/RRULE pair for the rrule parser.
/// Wall-clock times are written as UTC so the expansion never applies a zone shift.
fn build_rrule_string(start: NaiveDateTime, weekdays: &WeekdaySet, bound: SeriesBound) -> String {
    let limit = match bound {
        SeriesBound::Count(n) => format!("COUNT={n}"),
        SeriesBound::Until(date) => format!("UNTIL={}T235959Z", date.format("%Y%m%d")),
    };

    format!(
        "DTSTART:{}Z\nRRULE:FREQ=DAILY;BYDAY={};{}",
        start.format("%Y%m%dT%H%M%S"),
        weekdays.byday(),
        limit
    )
}

//! Turns timetable rows into concrete recurring events.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::ScheduleError;
use crate::timetable::{CourseEntry, Timetable};

/// "Repeat weekly, `count` occurrences in total" (the first one included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub count: u32,
}

impl RecurrenceRule {
    pub fn weekly(count: u32) -> Self {
        Self { count }
    }

    /// The bare rule, e.g. `FREQ=WEEKLY;COUNT=14`.
    pub fn rrule(&self) -> String {
        format!("FREQ=WEEKLY;COUNT={}", self.count)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RRULE:{}", self.rrule())
    }
}

/// An event ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedEvent {
    pub title: String,
    pub location: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub recurrence: RecurrenceRule,
}

impl ComputedEvent {
    pub fn time_zone(&self) -> Tz {
        self.start.timezone()
    }

    /// Start times of every occurrence, expanded locally.
    pub fn occurrences(&self) -> Result<Vec<DateTime<Tz>>, ScheduleError> {
        let tz = self.time_zone();
        let rrule_str = format!(
            "DTSTART;TZID={}:{}\n{}",
            tz.name(),
            self.start.naive_local().format("%Y%m%dT%H%M%S"),
            self.recurrence
        );

        let rrule_set: RRuleSet = rrule_str
            .parse()
            .map_err(|e| ScheduleError::Recurrence(format!("{}", e)))?;

        let limit = u16::try_from(self.recurrence.count).unwrap_or(u16::MAX);
        let result = rrule_set.all(limit);

        Ok(result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&tz))
            .collect())
    }
}

/// Date of the entry's first occurrence, counting from the semester's Monday.
pub fn first_occurrence_date(
    semester_start: NaiveDate,
    entry: &CourseEntry,
) -> Result<NaiveDate, ScheduleError> {
    let days = entry.weekday.offset();
    semester_start
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or(ScheduleError::DateOverflow {
            date: semester_start,
            days,
        })
}

fn localize(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    // Ambiguous times (DST fall-back) resolve to the earlier instant.
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| ScheduleError::NonexistentLocalTime {
            date,
            time,
            tz: tz.name().to_string(),
        })
}

pub fn compute_event(
    entry: &CourseEntry,
    semester_start: NaiveDate,
    tz: Tz,
    weeks: u32,
) -> Result<ComputedEvent, ScheduleError> {
    let date = first_occurrence_date(semester_start, entry)?;

    Ok(ComputedEvent {
        title: entry.name.clone(),
        location: entry.location.clone(),
        start: localize(date, entry.start, tz)?,
        end: localize(date, entry.end, tz)?,
        recurrence: RecurrenceRule::weekly(weeks),
    })
}

impl Timetable {
    /// Compute the event for one of this timetable's entries.
    pub fn event_for(&self, entry: &CourseEntry) -> Result<ComputedEvent, ScheduleError> {
        compute_event(entry, self.semester_start, self.time_zone, self.weeks)
    }
}

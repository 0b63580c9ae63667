//! Submits every timetable entry as a weekly recurring event.

use coursecal_core::{CourseEntry, SubmissionError, SubmissionErrorKind, Timetable};

use crate::calendar::{CalendarApi, Receipt};

/// Outcome of a full run, in table order.
#[derive(Debug, Default)]
pub struct ScheduleReport {
    pub receipts: Vec<Receipt>,
    pub failures: Vec<SubmissionError>,
}

impl ScheduleReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub async fn submit_entry<A: CalendarApi>(
    api: &A,
    timetable: &Timetable,
    calendar_id: &str,
    entry: &CourseEntry,
) -> Result<Receipt, SubmissionError> {
    let fail = |kind: SubmissionErrorKind| SubmissionError {
        title: entry.name.clone(),
        weekday: entry.weekday,
        kind,
    };

    let event = timetable
        .event_for(entry)
        .map_err(|e| fail(SubmissionErrorKind::Schedule(e)))?;

    api.insert_event(calendar_id, &event)
        .await
        .map_err(|e| fail(SubmissionErrorKind::Api(format!("{:#}", e))))
}

/// Reported to the caller as the run progresses.
#[derive(Debug)]
pub enum Progress<'a> {
    Submitting { index: usize, entry: &'a CourseEntry },
    Created(&'a Receipt),
    Failed(&'a SubmissionError),
}

/// Submit entries one at a time. A failed entry is recorded and the run
/// moves on to the next one. `on_progress` sees each outcome as soon as it
/// is known.
pub async fn schedule_all<A, F>(
    api: &A,
    timetable: &Timetable,
    calendar_id: &str,
    mut on_progress: F,
) -> ScheduleReport
where
    A: CalendarApi,
    F: FnMut(Progress<'_>),
{
    let mut report = ScheduleReport::default();

    for (index, entry) in timetable.courses.iter().enumerate() {
        on_progress(Progress::Submitting { index, entry });

        match submit_entry(api, timetable, calendar_id, entry).await {
            Ok(receipt) => {
                tracing::debug!(title = %receipt.title, id = %receipt.event_id, "created event");
                on_progress(Progress::Created(&receipt));
                report.receipts.push(receipt);
            }
            Err(e) => {
                tracing::debug!(title = %e.title, weekday = %e.weekday, error = %e.kind, "failed to create event");
                on_progress(Progress::Failed(&e));
                report.failures.push(e);
            }
        }
    }

    report
}

//! Terminal output.

use coursecal_core::{ComputedEvent, SubmissionError, Timetable};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::calendar::Receipt;
use crate::scheduler::ScheduleReport;

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

pub fn render_receipt(receipt: &Receipt) -> String {
    format!("Created: {} - {}", receipt.title.green(), receipt.link)
}

pub fn render_failure(failure: &SubmissionError) -> String {
    format!("Failed: {}", failure.to_string().red())
}

pub fn render_summary(report: &ScheduleReport) -> String {
    let created = report.receipts.len();
    let failed = report.failures.len();

    if failed == 0 {
        format!("\n{} events created", created).bold().to_string()
    } else {
        format!(
            "\n{} created, {}",
            created,
            format!("{} failed", failed).red()
        )
    }
}

pub fn render_timetable_header(timetable: &Timetable, calendar_id: &str) -> String {
    format!(
        "Semester starting {} ({}), {} weeks, calendar {}",
        timetable.semester_start.format("%a %Y-%m-%d"),
        timetable.time_zone.name(),
        timetable.weeks,
        calendar_id.bold()
    )
}

pub fn render_preview(event: &ComputedEvent) -> String {
    let location = if event.location.is_empty() {
        String::new()
    } else {
        format!(" @ {}", event.location)
    };

    format!(
        "{}{} {} {}-{} {}",
        event.title.bold(),
        location,
        event.start.format("%a %Y-%m-%d"),
        event.start.format("%H:%M"),
        event.end.format("%H:%M"),
        event.recurrence.to_string().dimmed()
    )
}

pub fn render_occurrences(occurrences: &[chrono::DateTime<chrono_tz::Tz>]) -> Vec<String> {
    occurrences
        .iter()
        .enumerate()
        .map(|(i, dt)| format!("   {:>2}. {}", i + 1, dt.format("%a %Y-%m-%d %H:%M")))
        .collect()
}

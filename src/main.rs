//! coursecal - create a semester's course timetable as weekly recurring
//! Google Calendar events.
//!
//! Files live in ~/.config/coursecal:
//!   credentials.json  OAuth client secrets (downloaded from Google)
//!   token.toml        cached OAuth credential
//!   timetable.toml    course table (optional, a default is bundled)
//!   settings.toml     overrides for the paths above (optional)

mod app_config;
mod calendar;
mod oauth;
mod render;
mod scheduler;
mod session;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use coursecal_core::{FileCredentialStore, Timetable};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::calendar::GoogleCalendar;
use crate::oauth::GoogleOAuth;
use crate::scheduler::Progress;
use crate::session::Authenticator;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "coursecal")]
#[command(about = "Add your weekly course timetable to Google Calendar as recurring events")]
struct Cli {
    /// Timetable TOML to use instead of the configured one
    #[arg(short, long)]
    timetable: Option<PathBuf>,

    /// Calendar to add events to (defaults to the timetable's, usually "primary")
    #[arg(short, long)]
    calendar: Option<String>,

    /// Print the events that would be created without contacting Google
    #[arg(long)]
    dry_run: bool,

    /// With --dry-run, list every occurrence of each event
    #[arg(long, requires = "dry_run")]
    occurrences: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load()?;
    let timetable = settings.load_timetable(cli.timetable.as_deref())?;
    let calendar_id = cli
        .calendar
        .clone()
        .unwrap_or_else(|| timetable.calendar_id.clone());

    if !timetable.starts_on_week_start() {
        tracing::warn!(
            semester_start = %timetable.semester_start,
            "semester start is not a Monday; course dates will be shifted"
        );
    }

    eprintln!("{}", render::render_timetable_header(&timetable, &calendar_id));

    if cli.dry_run {
        return preview(&timetable, cli.occurrences);
    }

    let oauth = GoogleOAuth::new(&settings.client_secrets, settings.redirect_port);
    let authenticator = Authenticator::new(
        FileCredentialStore::new(&settings.token_cache),
        &oauth,
        &oauth,
    );

    let session = authenticator.get_session().await?;
    let api = GoogleCalendar::new(&session);

    let total = timetable.courses.len();
    let spinner = render::create_spinner(String::new());
    let report = scheduler::schedule_all(&api, &timetable, &calendar_id, |progress| match progress {
        Progress::Submitting { index, entry } => {
            spinner.set_message(format!("Creating {} ({}/{})", entry.name, index + 1, total));
        }
        Progress::Created(receipt) => {
            spinner.suspend(|| println!("{}", render::render_receipt(receipt)));
        }
        Progress::Failed(failure) => {
            spinner.suspend(|| eprintln!("{}", render::render_failure(failure)));
        }
    })
    .await;
    spinner.finish_and_clear();

    eprintln!("{}", render::render_summary(&report));

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn preview(timetable: &Timetable, show_occurrences: bool) -> Result<ExitCode> {
    let mut failed = false;

    for course in &timetable.courses {
        match timetable.event_for(course) {
            Ok(event) => {
                println!("{}", render::render_preview(&event));

                if show_occurrences {
                    for line in render::render_occurrences(&event.occurrences()?) {
                        println!("{}", line);
                    }
                }
            }
            Err(e) => {
                failed = true;
                eprintln!("{} {} ({}): {}", "Failed:".red(), course.name, course.weekday, e);
            }
        }
    }

    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

//! Error types for coursecal.

use std::path::PathBuf;

use thiserror::Error;

use crate::weekday::Weekday;

/// Errors raised while loading settings or the timetable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Timetable has no courses")]
    EmptyTimetable,

    #[error("Course '{name}' on {weekday} ends at {end} which is not after its start {start}")]
    InvalidTimeRange {
        name: String,
        weekday: Weekday,
        start: String,
        end: String,
    },

    #[error("Recurrence count must be at least 1")]
    ZeroWeeks,
}

/// Errors that prevent obtaining a usable session. These are fatal.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Could not read cached credential at {path}: {source}")]
    CacheUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not persist credential to {path}: {message}")]
    Persist { path: PathBuf, message: String },

    #[error("Client secrets unavailable: {0}")]
    ClientSecrets(String),

    #[error("Failed to bind OAuth callback listener on {address}: {source}")]
    Listener {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Authorization was declined: {0}")]
    ConsentDeclined(String),

    #[error("Invalid OAuth callback: {0}")]
    Callback(String),

    #[error("Failed to exchange authorization code for tokens: {0}")]
    TokenExchange(String),

    #[error("Failed to refresh access token: {0}")]
    Refresh(String),
}

/// What went wrong for a single course entry.
#[derive(Error, Debug)]
pub enum SubmissionErrorKind {
    #[error("could not compute event time: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("calendar API call failed: {0}")]
    Api(String),
}

/// A per-entry failure. It never aborts the run on its own.
#[derive(Error, Debug)]
#[error("{title} ({weekday}): {kind}")]
pub struct SubmissionError {
    pub title: String,
    pub weekday: Weekday,
    #[source]
    pub kind: SubmissionErrorKind,
}

/// Errors from turning a course entry into concrete date-times.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{time} does not exist on {date} in {tz}")]
    NonexistentLocalTime {
        date: chrono::NaiveDate,
        time: chrono::NaiveTime,
        tz: String,
    },

    #[error("date overflow adding {days} days to {date}")]
    DateOverflow { date: chrono::NaiveDate, days: u32 },

    #[error("failed to expand recurrence: {0}")]
    Recurrence(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type AuthResult<T> = Result<T, AuthError>;

//! Core types for coursecal.
//!
//! This crate holds everything that does not talk to the network:
//! - `timetable` and `weekday` for the course table and its TOML form
//! - `schedule` for turning entries into recurring events
//! - `credential` for the cached OAuth credential

pub mod credential;
pub mod error;
pub mod schedule;
pub mod timetable;
pub mod weekday;

pub use credential::{Credential, CredentialStore, FileCredentialStore};
pub use error::{AuthError, ConfigError, ScheduleError, SubmissionError, SubmissionErrorKind};
pub use schedule::{ComputedEvent, RecurrenceRule};
pub use timetable::{CourseEntry, Timetable};
pub use weekday::Weekday;

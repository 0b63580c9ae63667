//! The weekly course timetable.
//!
//! A timetable is a TOML document:
//!
//! ```toml
//! semester_start = "2025-09-29"
//! time_zone = "Europe/Istanbul"
//! weeks = 14
//! calendar_id = "primary"
//!
//! [[courses]]
//! name = "CENG315/1"
//! location = "BMB1"
//! day = "Mon"
//! start = "08:40"
//! end = "10:30"
//! ```

use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::weekday::Weekday;

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Total occurrences of each course, including the first one.
pub const DEFAULT_WEEKS: u32 = 14;

const BUNDLED_TIMETABLE: &str = include_str!("../timetable.toml");

fn default_weeks() -> u32 {
    DEFAULT_WEEKS
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_time_zone() -> Tz {
    chrono_tz::Europe::Istanbul
}

/// One row of the weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "day")]
    pub weekday: Weekday,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    /// Monday of the first teaching week.
    pub semester_start: NaiveDate,

    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,

    #[serde(default = "default_weeks")]
    pub weeks: u32,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    pub courses: Vec<CourseEntry>,
}

impl Timetable {
    /// The timetable shipped with the binary.
    pub fn bundled() -> ConfigResult<Self> {
        Self::from_toml(BUNDLED_TIMETABLE, Path::new("<bundled timetable.toml>"))
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&contents, path)
    }

    /// Parse and validate. `origin` is only used in error messages.
    pub fn from_toml(contents: &str, origin: &Path) -> ConfigResult<Self> {
        let timetable: Timetable = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        timetable.validate()?;
        Ok(timetable)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.courses.is_empty() {
            return Err(ConfigError::EmptyTimetable);
        }

        if self.weeks == 0 {
            return Err(ConfigError::ZeroWeeks);
        }

        for course in &self.courses {
            if course.end <= course.start {
                return Err(ConfigError::InvalidTimeRange {
                    name: course.name.clone(),
                    weekday: course.weekday,
                    start: course.start.format("%H:%M").to_string(),
                    end: course.end.format("%H:%M").to_string(),
                });
            }
        }

        Ok(())
    }

    /// Offsets assume the semester starts on a Monday. Other dates are
    /// accepted but shift every course.
    pub fn starts_on_week_start(&self) -> bool {
        self.semester_start.weekday() == chrono::Weekday::from(Weekday::Mon)
    }
}

/// `HH:MM` (or `HH:MM:SS`) times of day.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(|_| serde::de::Error::custom(format!("invalid time of day '{}'", s)))
    }
}

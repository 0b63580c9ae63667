//! Google Calendar event creation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use coursecal_core::ComputedEvent;
use google_calendar::Client;
use google_calendar::types::{EventDateTime, SendUpdates};

use crate::session::Session;

/// What the service hands back for a created event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub title: String,
    pub event_id: String,
    pub link: String,
}

pub trait CalendarApi {
    async fn insert_event(&self, calendar_id: &str, event: &ComputedEvent) -> Result<Receipt>;
}

pub struct GoogleCalendar {
    client: Client,
}

impl GoogleCalendar {
    /// API calls only need the access token, so no client secrets here.
    pub fn new(session: &Session) -> Self {
        let client = Client::new(
            String::new(),
            String::new(),
            String::new(),
            session.access_token().to_string(),
            session.refresh_token().to_string(),
        );

        Self { client }
    }
}

impl CalendarApi for GoogleCalendar {
    async fn insert_event(&self, calendar_id: &str, event: &ComputedEvent) -> Result<Receipt> {
        let google_event = to_google_event(event);

        let response = self
            .client
            .events()
            .insert(
                calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .with_context(|| format!("Failed to create event: {}", event.title))?;

        let created = response.body;

        Ok(Receipt {
            title: if created.summary.is_empty() {
                event.title.clone()
            } else {
                created.summary
            },
            event_id: created.id,
            link: created.html_link,
        })
    }
}

fn to_google_time(datetime: &DateTime<Tz>) -> EventDateTime {
    // Recurring events need the zone name so occurrences follow local time
    EventDateTime {
        date: None,
        date_time: Some(datetime.with_timezone(&Utc)),
        time_zone: datetime.timezone().name().to_string(),
    }
}

pub fn to_google_event(event: &ComputedEvent) -> google_calendar::types::Event {
    google_calendar::types::Event {
        summary: event.title.clone(),
        location: event.location.clone(),
        start: Some(to_google_time(&event.start)),
        end: Some(to_google_time(&event.end)),
        recurrence: vec![event.recurrence.to_string()],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use coursecal_core::RecurrenceRule;

    fn event() -> ComputedEvent {
        let tz = chrono_tz::Europe::Istanbul;
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        ComputedEvent {
            title: "CENG477/1".to_string(),
            location: "BMB1".to_string(),
            start: tz
                .from_local_datetime(&date.and_hms_opt(8, 40, 0).unwrap())
                .unwrap(),
            end: tz
                .from_local_datetime(&date.and_hms_opt(10, 30, 0).unwrap())
                .unwrap(),
            recurrence: RecurrenceRule::weekly(14),
        }
    }

    #[test]
    fn google_event_carries_zone_and_rule() {
        let google = to_google_event(&event());

        assert_eq!(google.summary, "CENG477/1");
        assert_eq!(google.location, "BMB1");
        assert_eq!(google.recurrence, vec!["RRULE:FREQ=WEEKLY;COUNT=14".to_string()]);

        let start = google.start.unwrap();
        assert_eq!(start.time_zone, "Europe/Istanbul");
        // Istanbul is UTC+3
        assert_eq!(
            start.date_time.unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 1, 5, 40, 0).unwrap()
        );
        assert!(start.date.is_none());

        let end = google.end.unwrap();
        assert_eq!(
            end.date_time.unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 1, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn google_event_leaves_id_for_service() {
        assert!(to_google_event(&event()).id.is_empty());
    }
}

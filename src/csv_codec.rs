//! CSV import/export in the common spreadsheet calendar layout.
//!
//! One row per event. Dates are `MM/DD/YYYY`, times `hh:mm AM/PM`. An event that runs from
//! midnight to a later midnight is written as all-day, with an inclusive end date and no times.

use std::io;

use anyhow::{Context, Result, bail};
use calbook_core::{Event, EventStorage, Visibility};
use chrono::{Duration, NaiveDate, NaiveTime};
use csv::{QuoteStyle, ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DATE_FORMAT: &str = "%m/%d/%Y";
const TIME_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Serialize, Deserialize)]
struct EventRecord {
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "Start Time", default)]
    start_time: String,
    #[serde(rename = "End Date", default)]
    end_date: String,
    #[serde(rename = "End Time", default)]
    end_time: String,
    #[serde(rename = "All Day Event", default)]
    all_day: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "Private", default)]
    private: String,
}

fn flag(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

/// Collapse newlines and tabs so a field stays on one spreadsheet line.
fn flatten(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r', '\t'], " ")
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

fn is_all_day(event: &Event) -> bool {
    event.start.time() == NaiveTime::MIN && event.end.time() == NaiveTime::MIN && event.end > event.start
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        let all_day = is_all_day(event);
        let (start_time, end_date, end_time) = if all_day {
            let last_day = event.end.date() - Duration::days(1);
            (String::new(), last_day.format(DATE_FORMAT).to_string(), String::new())
        } else {
            (
                event.start.format(TIME_FORMAT).to_string(),
                event.end.format(DATE_FORMAT).to_string(),
                event.end.format(TIME_FORMAT).to_string(),
            )
        };

        EventRecord {
            subject: flatten(&event.subject),
            start_date: event.start.format(DATE_FORMAT).to_string(),
            start_time,
            end_date,
            end_time,
            all_day: flag(all_day),
            description: event.description.as_deref().map(flatten).unwrap_or_default(),
            location: event.location.as_deref().map(flatten).unwrap_or_default(),
            private: flag(event.visibility == Visibility::Private),
        }
    }
}

impl EventRecord {
    fn into_event(self) -> Result<Event> {
        let start_date = parse_date(&self.start_date)?;
        let end_date = if self.end_date.trim().is_empty() {
            start_date
        } else {
            parse_date(&self.end_date)?
        };

        let (start, end) = if parse_flag(&self.all_day) {
            (
                start_date.and_time(NaiveTime::MIN),
                (end_date + Duration::days(1)).and_time(NaiveTime::MIN),
            )
        } else {
            let start = start_date.and_time(parse_time(&self.start_time)?);
            let end = if self.end_time.trim().is_empty() {
                start
            } else {
                end_date.and_time(parse_time(&self.end_time)?)
            };
            (start, end)
        };

        let visibility = if parse_flag(&self.private) {
            Visibility::Private
        } else {
            Visibility::Unset
        };

        let mut event = Event::new(self.subject, start, end)?.with_visibility(visibility);
        event.description = non_empty(self.description);
        event.location = non_empty(self.location);
        Ok(event)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{value}' (expected MM/DD/YYYY)"))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    if value.trim().is_empty() {
        bail!("Missing time for a timed event");
    }
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .with_context(|| format!("Invalid time '{value}' (expected hh:mm AM/PM)"))
}

/// Write every event of `storage` in start order. Returns the number of rows written.
pub fn write_events<W: io::Write>(writer: W, storage: &EventStorage) -> Result<usize> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    let mut count = 0;
    for event in storage.iter() {
        writer.serialize(EventRecord::from(event))?;
        count += 1;
    }
    writer.flush()?;

    debug!("Exported {count} events");
    Ok(count)
}

/// Read events into a fresh storage. Any bad row fails the whole import.
pub fn read_events<R: io::Read>(reader: R) -> Result<EventStorage> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let mut storage = EventStorage::new();
    for (index, record) in reader.deserialize::<EventRecord>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record = record.with_context(|| format!("Unreadable CSV row on line {line}"))?;
        let event = record
            .into_event()
            .with_context(|| format!("Invalid event on line {line}"))?;
        storage.add_event(event);
    }

    debug!("Imported {} events", storage.len());
    Ok(storage)
}

//! Calendar event types.
//!
//! Event times are wall-clock values without a zone. They are read relative to the zone of
//! whichever calendar stores the event.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CalendarError, CalendarResult, DomainError, Outcome};

/// Accepted textual timestamp layouts, most specific first.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A single scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Shared by every occurrence generated from the same recurring series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Uuid>,
}

/// Identity of an event inside one storage: subject plus start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub subject: String,
    pub start: NaiveDateTime,
}

impl EventKey {
    pub fn new(subject: impl Into<String>, start: NaiveDateTime) -> Self {
        EventKey {
            subject: subject.into(),
            start,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' at {}", self.subject, self.start)
    }
}

impl Event {
    /// Create a one-off event, rejecting an empty subject or an end before the start.
    pub fn new(subject: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Outcome<Self> {
        let subject = subject.into();

        if subject.trim().is_empty() {
            return Err(DomainError::EmptySubject);
        }
        if end < start {
            return Err(DomainError::InvalidTimeOrder { subject, start, end });
        }

        Ok(Event {
            subject,
            start,
            end,
            description: None,
            location: None,
            visibility: Visibility::Unset,
            series: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn in_series(mut self, series: Uuid) -> Self {
        self.series = Some(series);
        self
    }

    pub fn key(&self) -> EventKey {
        EventKey::new(self.subject.clone(), self.start)
    }

    pub fn matches(&self, subject: &str, start: NaiveDateTime) -> bool {
        self.subject == subject && self.start == start
    }

    pub fn is_recurring(&self) -> bool {
        self.series.is_some()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Two events conflict when their half-open intervals overlap.
    pub fn conflicts_with(&self, other: &Event) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the event is in progress at `at` (start inclusive, end exclusive).
    pub fn covers(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }

    /// Whether the event touches the window [from, to].
    /// Zero-length events count when they sit inside the window.
    pub fn intersects(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start <= to && (self.end > from || self.start >= from)
    }

    /// Same event moved by a fixed offset, keeping its duration.
    pub fn shifted(&self, offset: chrono::Duration) -> Event {
        Event {
            start: self.start + offset,
            end: self.end + offset,
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.subject)
    }
}

/// Public/private marker (the `event_type` property).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    #[default]
    Unset,
}

impl FromStr for Visibility {
    type Err = CalendarError;

    fn from_str(s: &str) -> CalendarResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "" | "unset" => Ok(Visibility::Unset),
            other => Err(CalendarError::MalformedRequest(format!(
                "'{}' is not an event type (expected public or private)",
                other
            ))),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Unset => "unset",
        };
        write!(f, "{s}")
    }
}

/// Editable event properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventProperty {
    Subject,
    Description,
    Location,
    EventType,
    Start,
    End,
}

impl FromStr for EventProperty {
    type Err = CalendarError;

    fn from_str(s: &str) -> CalendarResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" => Ok(EventProperty::Subject),
            "description" => Ok(EventProperty::Description),
            "location" => Ok(EventProperty::Location),
            "event_type" | "eventtype" | "visibility" => Ok(EventProperty::EventType),
            "start" => Ok(EventProperty::Start),
            "end" => Ok(EventProperty::End),
            other => Err(CalendarError::UnknownProperty(other.to_string())),
        }
    }
}

impl fmt::Display for EventProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            EventProperty::Subject => "subject",
            EventProperty::Description => "description",
            EventProperty::Location => "location",
            EventProperty::EventType => "event_type",
            EventProperty::Start => "start",
            EventProperty::End => "end",
        };
        write!(f, "{s}")
    }
}

/// A property change with its typed new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum EventEdit {
    Subject(String),
    Description(String),
    Location(String),
    EventType(Visibility),
    Start(NaiveDateTime),
    End(NaiveDateTime),
}

impl EventEdit {
    /// Build an edit from a property and its textual value.
    /// Empty text values are structural errors: the caller should never send them.
    pub fn parse(property: EventProperty, value: &str) -> CalendarResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CalendarError::MalformedRequest(format!(
                "missing new value for {}",
                property
            )));
        }

        let edit = match property {
            EventProperty::Subject => EventEdit::Subject(value.to_string()),
            EventProperty::Description => EventEdit::Description(value.to_string()),
            EventProperty::Location => EventEdit::Location(value.to_string()),
            EventProperty::EventType => EventEdit::EventType(value.parse()?),
            EventProperty::Start => EventEdit::Start(parse_timestamp(value)?),
            EventProperty::End => EventEdit::End(parse_timestamp(value)?),
        };
        Ok(edit)
    }

    pub fn property(&self) -> EventProperty {
        match self {
            EventEdit::Subject(_) => EventProperty::Subject,
            EventEdit::Description(_) => EventProperty::Description,
            EventEdit::Location(_) => EventProperty::Location,
            EventEdit::EventType(_) => EventProperty::EventType,
            EventEdit::Start(_) => EventProperty::Start,
            EventEdit::End(_) => EventProperty::End,
        }
    }

    /// Check the ordering invariant this edit would produce on `event`.
    pub fn validate(&self, event: &Event) -> Outcome {
        match self {
            EventEdit::Start(start) if *start >= event.end => Err(DomainError::InvalidTimeOrder {
                subject: event.subject.clone(),
                start: *start,
                end: event.end,
            }),
            EventEdit::End(end) if *end <= event.start => Err(DomainError::InvalidTimeOrder {
                subject: event.subject.clone(),
                start: event.start,
                end: *end,
            }),
            EventEdit::Subject(subject) if subject.trim().is_empty() => {
                Err(DomainError::EmptySubject)
            }
            _ => Ok(()),
        }
    }

    /// Write the new value into `event`. Storage re-keying is the caller's job.
    pub fn apply(&self, event: &mut Event) {
        match self {
            EventEdit::Subject(subject) => event.subject = subject.clone(),
            EventEdit::Description(description) => event.description = Some(description.clone()),
            EventEdit::Location(location) => event.location = Some(location.clone()),
            EventEdit::EventType(visibility) => event.visibility = *visibility,
            EventEdit::Start(start) => event.start = *start,
            EventEdit::End(end) => event.end = *end,
        }
    }
}

/// Parse `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_timestamp(s: &str) -> CalendarResult<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s.trim(), fmt).ok())
        .ok_or_else(|| {
            CalendarError::MalformedRequest(format!(
                "invalid timestamp '{}'. Expected YYYY-MM-DDTHH:MM",
                s
            ))
        })
}

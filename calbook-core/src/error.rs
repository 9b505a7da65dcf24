//! Error types for calbook.
//!
//! `CalendarError` is a malformed request that reached the core (a caller bug).
//! `DomainError` is an expected failure reported back as a failed `Outcome`.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Structural errors: the request itself could not be understood.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unknown event property '{0}'")]
    UnknownProperty(String),

    #[error("Invalid weekday code '{0}'")]
    InvalidWeekdays(String),

    #[error("Recurrence rule error: {0}")]
    Recurrence(String),
}

/// Result type alias for structural failures.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Domain errors: the request was well formed but cannot be applied.
/// State is left untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Calendar '{0}' already exists")]
    DuplicateCalendar(String),

    #[error("Calendar name cannot be empty")]
    EmptyCalendarName,

    #[error("Calendar '{0}' not found")]
    CalendarNotFound(String),

    #[error("No calendar is in use")]
    NoActiveCalendar,

    #[error("Invalid time zone '{0}'")]
    InvalidTimezone(String),

    #[error("Event subject cannot be empty")]
    EmptySubject,

    #[error("Event '{subject}' must start ({start}) before it ends ({end})")]
    InvalidTimeOrder {
        subject: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("No event '{subject}' starting at {start}")]
    EventNotFound {
        subject: String,
        start: NaiveDateTime,
    },

    #[error("No events named '{0}'")]
    NoMatchingEvents(String),

    #[error("Event '{subject}' at {start} is not part of a recurring series")]
    NonRecurringTarget {
        subject: String,
        start: NaiveDateTime,
    },

    #[error("Event '{subject}' at {start} conflicts with an existing event")]
    Conflict {
        subject: String,
        start: NaiveDateTime,
    },

    #[error("Calendars have no property '{0}' (expected name or timezone)")]
    UnsupportedProperty(String),

    #[error("Invalid recurring series: {0}")]
    InvalidSeries(String),

    #[error("No source storage to transfer from")]
    MissingSource,
}

/// Outcome of a mutating core operation: `Ok` on success, a diagnostic on failure.
pub type Outcome<T = ()> = Result<T, DomainError>;

//! Core engine for calbook.
//!
//! This crate holds everything that schedules, stores and moves events:
//! - `event` and `storage` for the per-calendar event index
//! - `recurrence` for expanding weekday-based recurring series
//! - `registry` and `calendar` for named calendars, their zones and the active calendar
//! - `edit` for single and grouped property edits
//! - `request` for the structured operations front ends hand to the manager
//!
//! Nothing here is internally synchronized. A `CalendarManager` is meant to be driven by one
//! caller at a time; wrap it in a single mutex if several threads need it.

pub mod calendar;
pub mod edit;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod registry;
pub mod request;
pub mod storage;
pub mod zone;

pub use calendar::{Calendar, CalendarManager, CalendarProperty, ConflictPolicy};
pub use edit::EditEngine;
pub use error::{CalendarError, CalendarResult, DomainError, Outcome};
pub use event::{Event, EventEdit, EventKey, EventProperty, Visibility};
pub use recurrence::{RecurringSeries, SeriesBound, WeekdaySet};
pub use registry::CalendarRegistry;
pub use request::{RepeatSpec, Request, Response};
pub use storage::EventStorage;

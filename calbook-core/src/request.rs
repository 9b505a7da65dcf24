//! Structured requests: one variant per core operation.
//!
//! Front ends decode their input into a `Request` once and hand it to
//! `CalendarManager::execute`. Nothing in the core parses free text.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{Calendar, CalendarManager, ConflictPolicy};
use crate::error::{CalendarError, CalendarResult, Outcome};
use crate::event::{Event, EventEdit, Visibility};
use crate::recurrence::{RecurringSeries, SeriesBound, WeekdaySet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateCalendar {
        name: String,
        zone: String,
    },
    UseCalendar {
        name: String,
    },
    EditCalendar {
        name: String,
        property: String,
        value: String,
    },
    ListCalendars,
    CreateEvent {
        #[serde(default)]
        calendar: Option<String>,
        subject: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        location: Option<String>,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        repeat: Option<RepeatSpec>,
        #[serde(default)]
        conflicts: ConflictPolicy,
    },
    EditEvent {
        #[serde(default)]
        calendar: Option<String>,
        subject: String,
        start: NaiveDateTime,
        edit: EventEdit,
    },
    EditEvents {
        #[serde(default)]
        calendar: Option<String>,
        subject: String,
        #[serde(default)]
        from: Option<NaiveDateTime>,
        edit: EventEdit,
    },
    EventsOn {
        #[serde(default)]
        calendar: Option<String>,
        date: NaiveDate,
    },
    EventsBetween {
        #[serde(default)]
        calendar: Option<String>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
    Status {
        #[serde(default)]
        calendar: Option<String>,
        at: NaiveDateTime,
    },
    CopyEvent {
        subject: String,
        start: NaiveDateTime,
        target: String,
        target_start: NaiveDateTime,
    },
    CopyEventsOn {
        date: NaiveDate,
        target: String,
        target_date: NaiveDate,
    },
    CopyEventsBetween {
        from: NaiveDate,
        to: NaiveDate,
        target: String,
        target_from: NaiveDate,
    },
}

/// Repetition attached to a create request: weekdays plus exactly one of `count`/`until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatSpec {
    pub weekdays: WeekdaySet,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl RepeatSpec {
    pub fn bound(&self) -> CalendarResult<SeriesBound> {
        match (self.count, self.until) {
            (Some(count), None) => Ok(SeriesBound::Count(count)),
            (None, Some(until)) => Ok(SeriesBound::Until(until)),
            (Some(_), Some(_)) => Err(CalendarError::MalformedRequest(
                "repeat takes either a count or an until date, not both".into(),
            )),
            (None, None) => Err(CalendarError::MalformedRequest(
                "repeat needs a count or an until date".into(),
            )),
        }
    }
}

/// What a successful request produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Response {
    Done,
    Note(String),
    Created(usize),
    Edited(usize),
    Copied(usize),
    Events(Vec<Event>),
    Busy(bool),
    Calendars(Vec<Calendar>),
}

impl CalendarManager {
    /// Run one request.
    ///
    /// The outer `Err` is a malformed request (a caller bug). The inner `Outcome` is the
    /// domain result: success, or a diagnostic with state left untouched.
    pub fn execute(&mut self, request: Request) -> CalendarResult<Outcome<Response>> {
        let outcome = match request {
            Request::CreateCalendar { name, zone } => {
                self.create_calendar(&name, &zone).map(|()| Response::Done)
            }
            Request::UseCalendar { name } => self.use_calendar(&name).map(|()| Response::Done),
            Request::EditCalendar {
                name,
                property,
                value,
            } => self
                .edit_calendar(&name, &property, &value)
                .map(|note| note.map_or(Response::Done, Response::Note)),
            Request::ListCalendars => Ok(Response::Calendars(
                self.calendars().into_iter().cloned().collect(),
            )),
            Request::CreateEvent {
                calendar,
                subject,
                start,
                end,
                description,
                location,
                visibility,
                repeat,
                conflicts,
            } => {
                let bound = repeat.as_ref().map(RepeatSpec::bound).transpose()?;

                Event::new(subject, start, end).and_then(|event| {
                    let mut event = event.with_visibility(visibility);
                    event.description = description;
                    event.location = location;

                    match (repeat, bound) {
                        (Some(repeat), Some(bound)) => {
                            let series = RecurringSeries::new(event, repeat.weekdays, bound);
                            self.create_recurring_event(calendar.as_deref(), &series, conflicts)
                                .map(Response::Created)
                        }
                        _ => self
                            .create_event(calendar.as_deref(), event, conflicts)
                            .map(|()| Response::Created(1)),
                    }
                })
            }
            Request::EditEvent {
                calendar,
                subject,
                start,
                edit,
            } => {
                check_edit(&edit)?;
                self.edit_event(calendar.as_deref(), &subject, start, &edit)
                    .map(|_| Response::Edited(1))
            }
            Request::EditEvents {
                calendar,
                subject,
                from,
                edit,
            } => {
                check_edit(&edit)?;
                self.edit_events(calendar.as_deref(), &subject, from, &edit)
                    .map(Response::Edited)
            }
            Request::EventsOn { calendar, date } => self
                .events_on(calendar.as_deref(), date)
                .map(|events| Response::Events(events.into_iter().cloned().collect())),
            Request::EventsBetween { calendar, from, to } => self
                .events_between(calendar.as_deref(), from, to)
                .map(|events| Response::Events(events.into_iter().cloned().collect())),
            Request::Status { calendar, at } => {
                self.is_busy(calendar.as_deref(), at).map(Response::Busy)
            }
            Request::CopyEvent {
                subject,
                start,
                target,
                target_start,
            } => self
                .copy_event(&subject, start, &target, target_start)
                .map(|()| Response::Copied(1)),
            Request::CopyEventsOn {
                date,
                target,
                target_date,
            } => self
                .copy_events_on(date, &target, target_date)
                .map(Response::Copied),
            Request::CopyEventsBetween {
                from,
                to,
                target,
                target_from,
            } => self
                .copy_events_between(from, to, &target, target_from)
                .map(Response::Copied),
        };

        Ok(outcome)
    }
}

/// Text edits must carry a value; an empty one means the caller skipped validation.
fn check_edit(edit: &EventEdit) -> CalendarResult<()> {
    match edit {
        EventEdit::Subject(s) | EventEdit::Description(s) | EventEdit::Location(s)
            if s.trim().is_empty() =>
        {
            Err(CalendarError::MalformedRequest(format!(
                "missing new value for {}",
                edit.property()
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn run(manager: &mut CalendarManager, request: Request) -> Outcome<Response> {
        manager.execute(request).expect("well-formed request")
    }

    #[test]
    fn decodes_tagged_json() {
        let json = r#"{
            "op": "create_event",
            "subject": "Standup",
            "start": "2025-03-10T09:00:00",
            "end": "2025-03-10T09:15:00",
            "repeat": { "weekdays": "MWF", "count": 6 }
        }"#;

        let request: Request = serde_json::from_str(json).unwrap();
        match request {
            Request::CreateEvent { repeat: Some(repeat), conflicts, .. } => {
                assert_eq!(repeat.bound(), Ok(SeriesBound::Count(6)));
                assert_eq!(conflicts, ConflictPolicy::Allow);
            }
            other => panic!("Expected CreateEvent, got {other:?}"),
        }
    }

    #[test]
    fn repeat_with_both_bounds_is_structural() {
        let mut manager = CalendarManager::new();
        run(&mut manager, Request::CreateCalendar { name: "Work".into(), zone: "UTC".into() }).unwrap();
        run(&mut manager, Request::UseCalendar { name: "Work".into() }).unwrap();

        let request = Request::CreateEvent {
            calendar: None,
            subject: "Standup".into(),
            start: at(10, 9),
            end: at(10, 10),
            description: None,
            location: None,
            visibility: Visibility::Unset,
            repeat: Some(RepeatSpec {
                weekdays: "M".parse().unwrap(),
                count: Some(2),
                until: NaiveDate::from_ymd_opt(2025, 4, 1),
            }),
            conflicts: ConflictPolicy::Allow,
        };

        assert!(matches!(
            manager.execute(request),
            Err(CalendarError::MalformedRequest(_))
        ));
        assert_eq!(manager.current_storage().map(|s| s.len()), Some(0));
    }

    #[test]
    fn scripted_session() {
        let mut manager = CalendarManager::new();

        let duplicate = Request::CreateCalendar { name: "Personal".into(), zone: "UTC".into() };
        assert_eq!(run(&mut manager, duplicate.clone()), Ok(Response::Done));
        assert_eq!(
            run(&mut manager, duplicate),
            Err(DomainError::DuplicateCalendar("Personal".into()))
        );

        run(&mut manager, Request::UseCalendar { name: "Personal".into() }).unwrap();

        let created = run(
            &mut manager,
            Request::CreateEvent {
                calendar: None,
                subject: "Gym".into(),
                start: at(10, 18),
                end: at(10, 19),
                description: Some("Leg day".into()),
                location: None,
                visibility: Visibility::Private,
                repeat: Some(RepeatSpec {
                    weekdays: "MR".parse().unwrap(),
                    count: Some(4),
                    until: None,
                }),
                conflicts: ConflictPolicy::Decline,
            },
        );
        assert_eq!(created, Ok(Response::Created(4)));

        let edited = run(
            &mut manager,
            Request::EditEvents {
                calendar: None,
                subject: "Gym".into(),
                from: None,
                edit: EventEdit::Location("Downtown".into()),
            },
        );
        assert_eq!(edited, Ok(Response::Edited(4)));

        let busy = run(&mut manager, Request::Status { calendar: None, at: at(13, 18) });
        assert_eq!(busy, Ok(Response::Busy(true)));

        match run(&mut manager, Request::EventsOn { calendar: None, date: at(13, 0).date() }) {
            Ok(Response::Events(events)) => {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].location.as_deref(), Some("Downtown"));
            }
            other => panic!("Expected events, got {other:?}"),
        }
    }

    #[test]
    fn empty_text_edit_is_structural() {
        let mut manager = CalendarManager::new();
        let request = Request::EditEvent {
            calendar: None,
            subject: "Gym".into(),
            start: at(10, 18),
            edit: EventEdit::Description("  ".into()),
        };

        assert!(matches!(
            manager.execute(request),
            Err(CalendarError::MalformedRequest(_))
        ));
    }
}

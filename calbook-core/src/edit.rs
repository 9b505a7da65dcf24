//! Property edits on stored events.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, warn};

use crate::error::{DomainError, Outcome};
use crate::event::{Event, EventEdit, EventKey};
use crate::storage::EventStorage;

/// Applies validated edits to the events of one storage.
///
/// Every edit is checked in full before the storage is touched, so a rejected edit never
/// leaves a partial change behind.
pub struct EditEngine<'a> {
    storage: &'a mut EventStorage,
}

impl<'a> EditEngine<'a> {
    pub fn new(storage: &'a mut EventStorage) -> Self {
        EditEngine { storage }
    }

    /// Edit a single event. Start/end edits must keep start strictly before end.
    pub fn execute_edit(&mut self, target: &EventKey, edit: &EventEdit) -> Outcome<Event> {
        let event = self
            .storage
            .find_event(&target.subject, target.start)
            .ok_or_else(|| not_found(target))?;

        edit.validate(event).inspect_err(|e| warn!("Rejected edit of {target}: {e}"))?;

        let updated = self
            .storage
            .update_event(target, |e| edit.apply(e))
            .cloned()
            .ok_or_else(|| not_found(target))?;

        debug!("Edited {} of {}", edit.property(), target);
        Ok(updated)
    }

    /// Edit every event of a recurring group.
    ///
    /// All targets must exist and belong to a recurring series, otherwise nothing changes.
    /// Start/end edits move every member by the offset the earliest member gets, so the
    /// group keeps its spacing.
    pub fn execute_multiple_edits(&mut self, targets: &[EventKey], edit: &EventEdit) -> Outcome<Vec<Event>> {
        let mut seen = HashSet::new();
        let targets: Vec<&EventKey> = targets.iter().filter(|k| seen.insert(*k)).collect();

        let mut members = Vec::with_capacity(targets.len());
        for key in &targets {
            let matches = self.storage.find_events(&key.subject, key.start);
            if matches.is_empty() {
                return Err(not_found(key));
            }

            // A one-off sharing the key would be edited along with the series.
            if matches.iter().any(|e| !e.is_recurring()) {
                warn!("Refusing group edit: {key} is not recurring");
                return Err(DomainError::NonRecurringTarget {
                    subject: key.subject.clone(),
                    start: key.start,
                });
            }
            members.extend(matches);
        }

        let Some(earliest) = members.iter().min_by_key(|e| e.start) else {
            return Ok(Vec::new());
        };
        let offset = group_offset(edit, earliest);

        for member in &members {
            member_edit(edit, offset, member).validate(member)?;
        }

        let keys: Vec<EventKey> = targets.into_iter().cloned().collect();
        let updated = self
            .storage
            .update_events(&keys, |e| member_edit(edit, offset, e).apply(e));

        debug!("Edited {} of {} events", edit.property(), updated.len());
        Ok(updated)
    }
}

fn not_found(key: &EventKey) -> DomainError {
    DomainError::EventNotFound {
        subject: key.subject.clone(),
        start: key.start,
    }
}

/// How far a group start/end edit moves the earliest member.
fn group_offset(edit: &EventEdit, earliest: &Event) -> Duration {
    match edit {
        EventEdit::Start(start) => *start - earliest.start,
        EventEdit::End(end) => *end - earliest.end,
        _ => Duration::zero(),
    }
}

/// The concrete edit one group member receives.
fn member_edit(edit: &EventEdit, offset: Duration, member: &Event) -> EventEdit {
    match edit {
        EventEdit::Start(_) => EventEdit::Start(member.start + offset),
        EventEdit::End(_) => EventEdit::End(member.end + offset),
        other => other.clone(),
    }
}

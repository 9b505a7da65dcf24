//! Multi-calendar orchestration: creation, the active calendar, rename, re-zone and copies.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Calendar, CalendarProperty, ConflictPolicy};
use crate::edit::EditEngine;
use crate::error::{DomainError, Outcome};
use crate::event::{Event, EventEdit, EventKey};
use crate::recurrence::RecurringSeries;
use crate::registry::CalendarRegistry;
use crate::storage::EventStorage;
use crate::zone;

/// Owns every calendar, its storage partition and the active-calendar pointer.
///
/// Each name in `calendars` has exactly one partition in `registry` and the other way round.
/// Operations that rewrite many events build the replacement partition first and swap it in,
/// so a failed operation leaves everything as it was.
#[derive(Debug, Default)]
pub struct CalendarManager {
    calendars: HashMap<String, Calendar>,
    registry: CalendarRegistry,
    active: Option<String>,
}

impl CalendarManager {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Calendars
    // =========================================================================

    /// Create an empty calendar. The active calendar does not change.
    pub fn create_calendar(&mut self, name: &str, zone_name: &str) -> Outcome {
        if name.trim().is_empty() {
            return Err(DomainError::EmptyCalendarName);
        }
        if self.calendars.contains_key(name) {
            warn!("Calendar '{name}' already exists");
            return Err(DomainError::DuplicateCalendar(name.to_string()));
        }
        let zone = zone::parse_zone(zone_name)?;

        self.registry.put(name, EventStorage::new());
        self.calendars.insert(name.to_string(), Calendar::new(name, zone));

        info!("Created calendar '{name}' in {zone}");
        Ok(())
    }

    pub fn use_calendar(&mut self, name: &str) -> Outcome {
        if !self.calendars.contains_key(name) {
            return Err(DomainError::CalendarNotFound(name.to_string()));
        }
        self.active = Some(name.to_string());
        debug!("Now using calendar '{name}'");
        Ok(())
    }

    /// Leave no calendar active.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Change a calendar's `name` or `timezone`.
    ///
    /// Returns an informational note when the change succeeded without touching any event
    /// (re-zoning an empty calendar).
    pub fn edit_calendar(&mut self, name: &str, property: &str, value: &str) -> Outcome<Option<String>> {
        let property = CalendarProperty::parse(property)
            .ok_or_else(|| DomainError::UnsupportedProperty(property.to_string()))?;

        match property {
            CalendarProperty::Name => self.rename_calendar(name, value).map(|()| None),
            CalendarProperty::Timezone => self.rezone_calendar(name, value),
        }
    }

    /// Move a calendar and all its events to a new name. The active pointer follows it.
    pub fn rename_calendar(&mut self, old_name: &str, new_name: &str) -> Outcome {
        if !self.calendars.contains_key(old_name) {
            return Err(DomainError::CalendarNotFound(old_name.to_string()));
        }
        if new_name.trim().is_empty() {
            return Err(DomainError::EmptyCalendarName);
        }
        if new_name == old_name {
            return Ok(());
        }
        if self.calendars.contains_key(new_name) {
            return Err(DomainError::DuplicateCalendar(new_name.to_string()));
        }

        self.registry.rename(old_name, new_name)?;

        if let Some(mut calendar) = self.calendars.remove(old_name) {
            calendar.name = new_name.to_string();
            self.calendars.insert(new_name.to_string(), calendar);
        }
        if self.active.as_deref() == Some(old_name) {
            self.active = Some(new_name.to_string());
        }

        info!("Renamed calendar '{old_name}' to '{new_name}'");
        Ok(())
    }

    /// Switch a calendar to another zone, keeping every event at the same instant.
    ///
    /// Wall-clock times are recomputed: read in the old zone, re-expressed in the new one.
    pub fn rezone_calendar(&mut self, name: &str, zone_name: &str) -> Outcome<Option<String>> {
        let old_zone = self
            .calendars
            .get(name)
            .map(|c| c.zone)
            .ok_or_else(|| DomainError::CalendarNotFound(name.to_string()))?;
        let new_zone = zone::parse_zone(zone_name)?;

        let storage = self.partition(name)?;
        let note = if storage.is_empty() {
            let note = format!("Calendar '{name}' has no events to convert");
            info!("{note}");
            Some(note)
        } else {
            let rezoned = storage.rezoned(old_zone, new_zone);
            self.registry.put(name, rezoned);
            None
        };

        if let Some(calendar) = self.calendars.get_mut(name) {
            calendar.zone = new_zone;
        }

        info!("Calendar '{name}' moved from {old_zone} to {new_zone}");
        Ok(note)
    }

    pub fn get_calendar(&self, name: &str) -> Option<&Calendar> {
        self.calendars.get(name)
    }

    pub fn current_calendar(&self) -> Option<&Calendar> {
        self.active.as_deref().and_then(|name| self.calendars.get(name))
    }

    /// All calendars, sorted by name.
    pub fn calendars(&self) -> Vec<&Calendar> {
        let mut calendars: Vec<&Calendar> = self.calendars.values().collect();
        calendars.sort_by(|a, b| a.name.cmp(&b.name));
        calendars
    }

    pub fn storage(&self, name: &str) -> Option<&EventStorage> {
        self.registry.get(name)
    }

    pub fn current_storage(&self) -> Option<&EventStorage> {
        self.active.as_deref().and_then(|name| self.registry.get(name))
    }

    /// Copy every event of `source` into the active calendar.
    ///
    /// Events are read as wall-clock times in `source_zone` and stored at the same instant in
    /// the active calendar's zone. Returns the number of events copied.
    pub fn transfer_events_from_storage(&mut self, source: Option<&EventStorage>, source_zone: Tz) -> Outcome<usize> {
        let active = self
            .current_calendar()
            .cloned()
            .ok_or(DomainError::NoActiveCalendar)?;
        let source = source.ok_or(DomainError::MissingSource)?;

        if source.is_empty() {
            return Ok(0);
        }

        let incoming = source.rezoned(source_zone, active.zone);
        let count = incoming.len();
        self.partition_mut(&active.name)?.absorb(incoming);

        info!("Transferred {} events into '{}'", count, active.name);
        Ok(count)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Store a one-off event in `calendar` (or the active calendar).
    pub fn create_event(&mut self, calendar: Option<&str>, event: Event, policy: ConflictPolicy) -> Outcome {
        let target = self.resolve(calendar)?;
        let storage = self.partition_mut(&target.name)?;

        if policy == ConflictPolicy::Decline && storage.has_conflict(&event) {
            warn!("Declined '{}' at {}: conflict", event.subject, event.start);
            return Err(DomainError::Conflict {
                subject: event.subject,
                start: event.start,
            });
        }

        storage.add_event(event);
        Ok(())
    }

    /// Expand `series` and store every occurrence. Returns the number stored.
    ///
    /// Under `ConflictPolicy::Decline` a single conflicting occurrence rejects the whole series.
    pub fn create_recurring_event(
        &mut self,
        calendar: Option<&str>,
        series: &RecurringSeries,
        policy: ConflictPolicy,
    ) -> Outcome<usize> {
        let target = self.resolve(calendar)?;
        let occurrences = series
            .generate_occurrences()
            .map_err(|e| DomainError::InvalidSeries(e.to_string()))?;
        let storage = self.partition_mut(&target.name)?;

        if policy == ConflictPolicy::Decline {
            for (i, occurrence) in occurrences.iter().enumerate() {
                let clashes_with_sibling = occurrences[..i].iter().any(|o| o.conflicts_with(occurrence));
                if clashes_with_sibling || storage.has_conflict(occurrence) {
                    warn!("Declined series '{}': conflict at {}", occurrence.subject, occurrence.start);
                    return Err(DomainError::Conflict {
                        subject: occurrence.subject.clone(),
                        start: occurrence.start,
                    });
                }
            }
        }

        let count = occurrences.len();
        if count == 0 {
            info!("Series '{}' has no occurrences within its bound", series.base().subject);
        }
        for occurrence in occurrences {
            storage.add_event(occurrence);
        }

        Ok(count)
    }

    /// Edit the single event identified by (`subject`, `start`).
    pub fn edit_event(
        &mut self,
        calendar: Option<&str>,
        subject: &str,
        start: NaiveDateTime,
        edit: &EventEdit,
    ) -> Outcome<Event> {
        let target = self.resolve(calendar)?;
        let storage = self.partition_mut(&target.name)?;

        EditEngine::new(storage).execute_edit(&EventKey::new(subject, start), edit)
    }

    /// Edit every event named `subject`, optionally only those starting at or after `from`.
    ///
    /// The whole group must be recurring. Returns the number of events changed.
    pub fn edit_events(
        &mut self,
        calendar: Option<&str>,
        subject: &str,
        from: Option<NaiveDateTime>,
        edit: &EventEdit,
    ) -> Outcome<usize> {
        let target = self.resolve(calendar)?;
        let storage = self.partition_mut(&target.name)?;

        let targets: Vec<EventKey> = storage
            .events_with_subject(subject)
            .into_iter()
            .filter(|e| from.is_none_or(|from| e.start >= from))
            .map(Event::key)
            .collect();

        if targets.is_empty() {
            return Err(DomainError::NoMatchingEvents(subject.to_string()));
        }

        EditEngine::new(storage)
            .execute_multiple_edits(&targets, edit)
            .map(|updated| updated.len())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn events_on(&self, calendar: Option<&str>, date: NaiveDate) -> Outcome<Vec<&Event>> {
        let target = self.resolve(calendar)?;
        Ok(self.partition(&target.name)?.events_on_date(date))
    }

    pub fn events_between(
        &self,
        calendar: Option<&str>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Outcome<Vec<&Event>> {
        let target = self.resolve(calendar)?;
        Ok(self.partition(&target.name)?.events_in_range(from, to))
    }

    /// Whether the calendar has an event in progress at `at`.
    pub fn is_busy(&self, calendar: Option<&str>, at: NaiveDateTime) -> Outcome<bool> {
        let target = self.resolve(calendar)?;
        Ok(self.partition(&target.name)?.is_busy_at(at))
    }

    // =========================================================================
    // Copies between calendars
    // =========================================================================

    /// Copy one event of the active calendar to `target`, starting at `target_start`
    /// (wall-clock time in the target calendar). The copy is a one-off event.
    pub fn copy_event(
        &mut self,
        subject: &str,
        start: NaiveDateTime,
        target: &str,
        target_start: NaiveDateTime,
    ) -> Outcome {
        let source = self
            .current_calendar()
            .cloned()
            .ok_or(DomainError::NoActiveCalendar)?;
        let destination = self.resolve(Some(target))?;

        let event = self
            .partition(&source.name)?
            .find_event(subject, start)
            .ok_or_else(|| DomainError::EventNotFound {
                subject: subject.to_string(),
                start,
            })?;

        let mut copy = event.shifted(target_start - event.start);
        copy.series = None;

        self.partition_mut(&destination.name)?.add_event(copy);
        debug!("Copied '{}' to '{}' at {}", subject, destination.name, target_start);
        Ok(())
    }

    /// Copy every event on `date` of the active calendar to `target`, landing on `target_date`.
    pub fn copy_events_on(&mut self, date: NaiveDate, target: &str, target_date: NaiveDate) -> Outcome<usize> {
        let source = self
            .current_calendar()
            .cloned()
            .ok_or(DomainError::NoActiveCalendar)?;
        let destination = self.resolve(Some(target))?;

        let events = self.partition(&source.name)?.events_on_date(date);
        let copies = translate(events, source.zone, destination.zone, target_date - date);

        self.store_copies(&destination.name, copies)
    }

    /// Copy every event touching the inclusive span `from..=to` of the active calendar to
    /// `target`, with `from` landing on `target_from`.
    pub fn copy_events_between(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        target: &str,
        target_from: NaiveDate,
    ) -> Outcome<usize> {
        let source = self
            .current_calendar()
            .cloned()
            .ok_or(DomainError::NoActiveCalendar)?;
        let destination = self.resolve(Some(target))?;

        let window_start = from.and_time(NaiveTime::MIN);
        let window_end = to.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::nanoseconds(1);

        let events = self
            .partition(&source.name)?
            .events_in_range(window_start, window_end);
        let copies = translate(events, source.zone, destination.zone, target_from - from);

        self.store_copies(&destination.name, copies)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// The named calendar, or the active one when no name is given.
    fn resolve(&self, calendar: Option<&str>) -> Outcome<Calendar> {
        match calendar {
            Some(name) => self
                .calendars
                .get(name)
                .cloned()
                .ok_or_else(|| DomainError::CalendarNotFound(name.to_string())),
            None => self
                .current_calendar()
                .cloned()
                .ok_or(DomainError::NoActiveCalendar),
        }
    }

    fn partition(&self, name: &str) -> Outcome<&EventStorage> {
        self.registry
            .get(name)
            .ok_or_else(|| DomainError::CalendarNotFound(name.to_string()))
    }

    fn partition_mut(&mut self, name: &str) -> Outcome<&mut EventStorage> {
        self.registry
            .get_mut(name)
            .ok_or_else(|| DomainError::CalendarNotFound(name.to_string()))
    }

    fn store_copies(&mut self, name: &str, copies: Vec<Event>) -> Outcome<usize> {
        let storage = self.partition_mut(name)?;
        let count = copies.len();
        for copy in copies {
            storage.add_event(copy);
        }

        debug!("Copied {count} events into '{name}'");
        Ok(count)
    }
}

/// Re-express events from zone `from` in zone `to`, then move them by `day_offset`.
/// Occurrences of one series stay grouped under a fresh series id.
fn translate(events: Vec<&Event>, from: Tz, to: Tz, day_offset: Duration) -> Vec<Event> {
    let mut series_ids: HashMap<Uuid, Uuid> = HashMap::new();

    events
        .into_iter()
        .map(|event| {
            let mut copy = event.clone();
            copy.start = zone::convert(event.start, from, to) + day_offset;
            copy.end = zone::convert(event.end, from, to) + day_offset;
            copy.series = event
                .series
                .map(|id| *series_ids.entry(id).or_insert_with(Uuid::new_v4));
            copy
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::SeriesBound;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn manager_with(name: &str, zone: &str) -> CalendarManager {
        let mut manager = CalendarManager::new();
        manager.create_calendar(name, zone).unwrap();
        manager.use_calendar(name).unwrap();
        manager
    }

    fn meeting() -> Event {
        Event::new("Meeting", at(2025, 3, 1, 10, 0), at(2025, 3, 1, 11, 0)).unwrap()
    }

    #[test]
    fn create_does_not_activate() {
        let mut manager = CalendarManager::new();
        manager.create_calendar("Work", "UTC").unwrap();

        assert!(manager.current_calendar().is_none());
        assert!(manager.get_calendar("Work").is_some());
        assert!(manager.storage("Work").is_some_and(EventStorage::is_empty));
    }

    #[test]
    fn create_rejects_bad_zone_without_side_effects() {
        let mut manager = CalendarManager::new();
        let result = manager.create_calendar("Work", "Not/AZone");

        assert_eq!(result, Err(DomainError::InvalidTimezone("Not/AZone".into())));
        assert!(manager.get_calendar("Work").is_none());
        assert!(manager.storage("Work").is_none());
    }

    #[test]
    fn use_unknown_calendar_fails() {
        let mut manager = manager_with("Work", "UTC");
        assert_eq!(
            manager.use_calendar("Home"),
            Err(DomainError::CalendarNotFound("Home".into()))
        );
        assert_eq!(manager.current_calendar().map(|c| c.name.as_str()), Some("Work"));
    }

    #[test]
    fn clearing_active_keeps_calendars() {
        let mut manager = manager_with("Work", "UTC");
        manager.clear_active();

        assert!(manager.current_calendar().is_none());
        assert!(manager.get_calendar("Work").is_some());
        assert_eq!(
            manager.events_on(None, date(2025, 3, 1)).map(|events| events.len()),
            Err(DomainError::NoActiveCalendar)
        );
    }

    #[test]
    fn events_need_an_active_calendar() {
        let mut manager = CalendarManager::new();
        manager.create_calendar("Work", "UTC").unwrap();

        let result = manager.create_event(None, meeting(), ConflictPolicy::Allow);
        assert_eq!(result, Err(DomainError::NoActiveCalendar));

        manager
            .create_event(Some("Work"), meeting(), ConflictPolicy::Allow)
            .unwrap();
        assert_eq!(manager.storage("Work").map(EventStorage::len), Some(1));
    }

    #[test]
    fn decline_policy_rejects_overlap() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();

        let overlapping = Event::new("Call", at(2025, 3, 1, 10, 30), at(2025, 3, 1, 12, 0)).unwrap();
        let declined = manager.create_event(None, overlapping.clone(), ConflictPolicy::Decline);
        assert!(matches!(declined, Err(DomainError::Conflict { .. })));

        manager.create_event(None, overlapping, ConflictPolicy::Allow).unwrap();
        assert_eq!(manager.current_storage().map(EventStorage::len), Some(2));
    }

    #[test]
    fn declined_series_stores_nothing() {
        let mut manager = manager_with("Work", "UTC");
        let blocker = Event::new("Offsite", at(2025, 3, 17, 0, 0), at(2025, 3, 18, 0, 0)).unwrap();
        manager.create_event(None, blocker, ConflictPolicy::Allow).unwrap();

        let base = Event::new("Standup", at(2025, 3, 10, 9, 0), at(2025, 3, 10, 9, 15)).unwrap();
        let series = RecurringSeries::new(base, "M".parse().unwrap(), SeriesBound::Count(3));

        let result = manager.create_recurring_event(None, &series, ConflictPolicy::Decline);
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(manager.current_storage().map(EventStorage::len), Some(1));

        let stored = manager.create_recurring_event(None, &series, ConflictPolicy::Allow);
        assert_eq!(stored, Ok(3));
    }

    #[test]
    fn unknown_calendar_property_is_rejected() {
        let mut manager = manager_with("Work", "UTC");
        let result = manager.edit_calendar("Work", "color", "blue");

        assert_eq!(result, Err(DomainError::UnsupportedProperty("color".into())));
        assert_eq!(manager.get_calendar("Work").map(|c| c.zone), Some(chrono_tz::UTC));
    }

    #[test]
    fn rename_follows_active_pointer() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();

        manager.edit_calendar("Work", "name", "Office").unwrap();

        assert!(manager.get_calendar("Work").is_none());
        assert!(manager.storage("Work").is_none());
        let current = manager.current_calendar().expect("active calendar");
        assert_eq!(current.name, "Office");
        assert!(manager
            .storage("Office")
            .and_then(|s| s.find_event("Meeting", at(2025, 3, 1, 10, 0)))
            .is_some());
    }

    #[test]
    fn rename_onto_existing_name_fails() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_calendar("Home", "UTC").unwrap();
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();

        let result = manager.edit_calendar("Work", "name", "Home");

        assert_eq!(result, Err(DomainError::DuplicateCalendar("Home".into())));
        assert_eq!(manager.storage("Work").map(EventStorage::len), Some(1));
        assert_eq!(manager.storage("Home").map(EventStorage::len), Some(0));
    }

    #[test]
    fn rezone_empty_calendar_reports_note() {
        let mut manager = manager_with("Work", "UTC");

        let note = manager.edit_calendar("Work", "timezone", "Europe/Paris").unwrap();

        assert!(note.is_some());
        assert_eq!(
            manager.get_calendar("Work").map(|c| c.zone),
            Some(chrono_tz::Europe::Paris)
        );
    }

    #[test]
    fn rezone_with_invalid_zone_changes_nothing() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();
        let before = manager.current_storage().cloned();

        let result = manager.edit_calendar("Work", "timezone", "Nowhere/Special");

        assert!(matches!(result, Err(DomainError::InvalidTimezone(_))));
        assert_eq!(manager.current_storage().cloned(), before);
        assert_eq!(manager.current_calendar().map(|c| c.zone), Some(chrono_tz::UTC));
    }

    #[test]
    fn edit_events_from_only_touches_later_occurrences() {
        let mut manager = manager_with("Work", "UTC");
        let base = Event::new("Standup", at(2025, 3, 10, 9, 0), at(2025, 3, 10, 9, 15)).unwrap();
        let series = RecurringSeries::new(base, "M".parse().unwrap(), SeriesBound::Count(3));
        manager.create_recurring_event(None, &series, ConflictPolicy::Allow).unwrap();

        let changed = manager
            .edit_events(
                None,
                "Standup",
                Some(at(2025, 3, 17, 9, 0)),
                &EventEdit::Location("Room 7".into()),
            )
            .unwrap();

        assert_eq!(changed, 2);
        let storage = manager.current_storage().unwrap();
        let first = storage.find_event("Standup", at(2025, 3, 10, 9, 0)).unwrap();
        assert_eq!(first.location, None);
        let last = storage.find_event("Standup", at(2025, 3, 24, 9, 0)).unwrap();
        assert_eq!(last.location.as_deref(), Some("Room 7"));
    }

    #[test]
    fn edit_events_with_unknown_subject() {
        let mut manager = manager_with("Work", "UTC");
        let result = manager.edit_events(None, "Nothing", None, &EventEdit::Location("x".into()));
        assert_eq!(result, Err(DomainError::NoMatchingEvents("Nothing".into())));
    }

    #[test]
    fn busy_status() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();

        assert_eq!(manager.is_busy(None, at(2025, 3, 1, 10, 30)), Ok(true));
        assert_eq!(manager.is_busy(None, at(2025, 3, 1, 11, 0)), Ok(false));
    }

    #[test]
    fn copy_single_event_keeps_duration() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_calendar("Home", "Asia/Tokyo").unwrap();
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();

        manager
            .copy_event("Meeting", at(2025, 3, 1, 10, 0), "Home", at(2025, 3, 8, 15, 0))
            .unwrap();

        let copy = manager
            .storage("Home")
            .and_then(|s| s.find_event("Meeting", at(2025, 3, 8, 15, 0)))
            .expect("copied event");
        assert_eq!(copy.end, at(2025, 3, 8, 16, 0));
        assert!(!copy.is_recurring());
    }

    #[test]
    fn copy_missing_event_fails() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_calendar("Home", "UTC").unwrap();

        let result = manager.copy_event("Ghost", at(2025, 3, 1, 10, 0), "Home", at(2025, 3, 2, 10, 0));
        assert!(matches!(result, Err(DomainError::EventNotFound { .. })));

        let result = manager.copy_event("Ghost", at(2025, 3, 1, 10, 0), "Nowhere", at(2025, 3, 2, 10, 0));
        assert_eq!(result, Err(DomainError::CalendarNotFound("Nowhere".into())));
    }

    #[test]
    fn copy_day_converts_zone_then_shifts_date() {
        let mut manager = manager_with("Work", "America/New_York");
        manager.create_calendar("Tokyo", "Asia/Tokyo").unwrap();
        manager.create_event(None, meeting(), ConflictPolicy::Allow).unwrap();

        let copied = manager
            .copy_events_on(date(2025, 3, 1), "Tokyo", date(2025, 3, 10))
            .unwrap();

        assert_eq!(copied, 1);
        // 10:00 New York is 00:00 the next day in Tokyo; the date then moves nine days.
        assert!(manager
            .storage("Tokyo")
            .and_then(|s| s.find_event("Meeting", at(2025, 3, 11, 0, 0)))
            .is_some());
    }

    #[test]
    fn copy_span_regroups_series() {
        let mut manager = manager_with("Work", "UTC");
        manager.create_calendar("Archive", "UTC").unwrap();
        let base = Event::new("Standup", at(2025, 3, 10, 9, 0), at(2025, 3, 10, 9, 15)).unwrap();
        let series = RecurringSeries::new(base, "MW".parse().unwrap(), SeriesBound::Count(4));
        manager.create_recurring_event(None, &series, ConflictPolicy::Allow).unwrap();

        let copied = manager
            .copy_events_between(date(2025, 3, 10), date(2025, 3, 12), "Archive", date(2025, 4, 7))
            .unwrap();

        assert_eq!(copied, 2);
        let archive = manager.storage("Archive").unwrap();
        let ids: Vec<_> = archive.iter().map(|e| e.series).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids[0].is_some());
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[0], Some(series.id()));
        assert!(archive.find_event("Standup", at(2025, 4, 9, 9, 0)).is_some());
    }
}

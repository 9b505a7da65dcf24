//! Per-calendar event index keyed by start time.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::debug;

use crate::event::{Event, EventKey};
use crate::zone;

/// Events of one calendar, bucketed by their start timestamp.
///
/// Every event sits in the bucket of its own current `start`. Stored events only change through
/// `update_event`/`update_events`, which re-file them under their new start in the same call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStorage {
    events: BTreeMap<NaiveDateTime, Vec<Event>>,
}

impl EventStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event under its start. Overlaps are not checked here.
    pub fn add_event(&mut self, event: Event) {
        debug!("Storing '{}' at {}", event.subject, event.start);
        self.events.entry(event.start).or_default().push(event);
    }

    pub fn find_event(&self, subject: &str, start: NaiveDateTime) -> Option<&Event> {
        self.events
            .get(&start)?
            .iter()
            .find(|e| e.matches(subject, start))
    }

    /// Every event in the bucket of `start` that carries `subject`.
    pub fn find_events(&self, subject: &str, start: NaiveDateTime) -> Vec<&Event> {
        self.events
            .get(&start)
            .into_iter()
            .flatten()
            .filter(|e| e.matches(subject, start))
            .collect()
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.find_event(&key.subject, key.start).is_some()
    }

    /// Events that touch the 24 hours beginning at midnight of `date`.
    pub fn events_on_date(&self, date: NaiveDate) -> Vec<&Event> {
        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        self.events
            .range(..day_end)
            .flat_map(|(_, bucket)| bucket)
            .filter(|e| e.end > day_start || e.start >= day_start)
            .collect()
    }

    /// Events that touch the inclusive window [from, to].
    pub fn events_in_range(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<&Event> {
        if to < from {
            return Vec::new();
        }

        self.events
            .range(..=to)
            .flat_map(|(_, bucket)| bucket)
            .filter(|e| e.intersects(from, to))
            .collect()
    }

    /// Every event sharing `subject`, in start order.
    pub fn events_with_subject(&self, subject: &str) -> Vec<&Event> {
        self.iter().filter(|e| e.subject == subject).collect()
    }

    /// The full start → bucket view, for bulk readers such as exporters.
    pub fn all_events(&self) -> &BTreeMap<NaiveDateTime, Vec<Event>> {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove one event, dropping its bucket if it becomes empty.
    pub fn remove_event(&mut self, subject: &str, start: NaiveDateTime) -> Option<Event> {
        let bucket = self.events.get_mut(&start)?;
        let index = bucket.iter().position(|e| e.matches(subject, start))?;
        let removed = bucket.remove(index);

        if bucket.is_empty() {
            self.events.remove(&start);
        }

        debug!("Removed '{subject}' at {start}");
        Some(removed)
    }

    /// Mutate the event identified by `key` and file it under its (possibly new) start.
    ///
    /// Returns the updated event, or `None` when no event matches `key`.
    pub fn update_event(&mut self, key: &EventKey, change: impl FnOnce(&mut Event)) -> Option<&Event> {
        let mut event = self.remove_event(&key.subject, key.start)?;
        change(&mut event);

        let start = event.start;
        self.add_event(event);
        self.events.get(&start).and_then(|bucket| bucket.last())
    }

    /// Remove every event matching `key`, dropping the bucket if nothing is left in it.
    fn take_matching(&mut self, key: &EventKey) -> Vec<Event> {
        let Some(bucket) = self.events.get_mut(&key.start) else {
            return Vec::new();
        };
        let (taken, kept): (Vec<Event>, Vec<Event>) = std::mem::take(bucket)
            .into_iter()
            .partition(|e| e.matches(&key.subject, key.start));

        if kept.is_empty() {
            self.events.remove(&key.start);
        } else {
            *bucket = kept;
        }
        taken
    }

    /// Mutate several events in one step. Every event matching a key is changed.
    ///
    /// All of them are taken out before any is re-filed, so an event moving onto a key that
    /// another target still occupies cannot be confused with it.
    pub fn update_events(&mut self, keys: &[EventKey], mut change: impl FnMut(&mut Event)) -> Vec<Event> {
        let mut taken: Vec<Event> = keys.iter().flat_map(|key| self.take_matching(key)).collect();

        for event in &mut taken {
            change(event);
        }
        for event in &taken {
            self.add_event(event.clone());
        }

        taken
    }

    /// Stored events overlapping `event`, excluding an identical stored copy of it.
    pub fn conflicts_with(&self, event: &Event) -> Vec<&Event> {
        self.events
            .range(..event.end)
            .flat_map(|(_, bucket)| bucket)
            .filter(|e| *e != event && e.conflicts_with(event))
            .collect()
    }

    pub fn has_conflict(&self, event: &Event) -> bool {
        !self.conflicts_with(event).is_empty()
    }

    /// Whether any event is in progress at `at`.
    pub fn is_busy_at(&self, at: NaiveDateTime) -> bool {
        self.events
            .range(..=at)
            .flat_map(|(_, bucket)| bucket)
            .any(|e| e.covers(at))
    }

    /// A copy of this storage with every wall-clock time moved from zone `from` to zone `to`.
    /// The receiver is untouched, so callers can swap the result in as one step.
    pub fn rezoned(&self, from: Tz, to: Tz) -> EventStorage {
        let mut rezoned = EventStorage::new();

        for event in self.iter() {
            let mut moved = event.clone();
            moved.start = zone::convert(event.start, from, to);
            moved.end = zone::convert(event.end, from, to);
            rezoned.add_event(moved);
        }

        rezoned
    }

    /// Move every bucket of `other` into this storage.
    pub fn absorb(&mut self, other: EventStorage) {
        for (start, bucket) in other.events {
            self.events.entry(start).or_default().extend(bucket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventEdit;

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn event(subject: &str, start: NaiveDateTime, end: NaiveDateTime) -> Event {
        Event::new(subject, start, end).unwrap()
    }

    fn assert_keys_consistent(storage: &EventStorage) {
        for (key, bucket) in storage.all_events() {
            assert!(!bucket.is_empty(), "empty bucket left at {key}");
            for e in bucket {
                assert_eq!(e.start, *key, "'{}' filed under the wrong key", e.subject);
                assert!(e.end >= e.start);
            }
        }
    }

    #[test]
    fn shared_start_times_share_a_bucket() {
        let mut storage = EventStorage::new();
        storage.add_event(event("Standup", at(3, 9, 0), at(3, 9, 15)));
        storage.add_event(event("Coffee", at(3, 9, 0), at(3, 9, 30)));

        assert_eq!(storage.len(), 2);
        assert_eq!(storage.all_events().len(), 1);
        assert!(storage.find_event("Coffee", at(3, 9, 0)).is_some());
        assert!(storage.find_event("Coffee", at(3, 9, 15)).is_none());
    }

    #[test]
    fn removing_last_event_drops_bucket() {
        let mut storage = EventStorage::new();
        storage.add_event(event("Standup", at(3, 9, 0), at(3, 9, 15)));

        let removed = storage.remove_event("Standup", at(3, 9, 0));
        assert!(removed.is_some());
        assert!(storage.is_empty());
        assert!(storage.remove_event("Standup", at(3, 9, 0)).is_none());
    }

    #[test]
    fn events_on_date_include_overnight_spans() {
        let mut storage = EventStorage::new();
        storage.add_event(event("Flight", at(2, 22, 0), at(3, 2, 0)));
        storage.add_event(event("Lunch", at(3, 12, 0), at(3, 13, 0)));
        storage.add_event(event("Ends at midnight", at(2, 20, 0), at(3, 0, 0)));
        storage.add_event(event("Tomorrow", at(4, 0, 0), at(4, 1, 0)));

        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let subjects: Vec<_> = storage
            .events_on_date(day)
            .iter()
            .map(|e| e.subject.as_str())
            .collect();

        assert_eq!(subjects, vec!["Flight", "Lunch"]);
    }

    #[test]
    fn range_query_is_inclusive() {
        let mut storage = EventStorage::new();
        storage.add_event(event("A", at(3, 9, 0), at(3, 10, 0)));
        storage.add_event(event("B", at(3, 11, 0), at(3, 12, 0)));
        storage.add_event(event("C", at(3, 14, 0), at(3, 15, 0)));

        let hits = storage.events_in_range(at(3, 10, 0), at(3, 11, 0));
        let subjects: Vec<_> = hits.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["B"]);

        assert!(storage.events_in_range(at(3, 12, 0), at(3, 9, 0)).is_empty());
    }

    #[test]
    fn update_event_moves_key_on_start_change() {
        let mut storage = EventStorage::new();
        storage.add_event(event("Review", at(5, 14, 0), at(5, 15, 0)));

        let key = EventKey::new("Review", at(5, 14, 0));
        let updated = storage
            .update_event(&key, |e| EventEdit::Start(at(5, 13, 0)).apply(e))
            .cloned();

        assert_eq!(updated.map(|e| e.start), Some(at(5, 13, 0)));
        assert!(storage.find_event("Review", at(5, 14, 0)).is_none());
        assert!(storage.find_event("Review", at(5, 13, 0)).is_some());
        assert_keys_consistent(&storage);
    }

    #[test]
    fn update_event_missing_key_is_none() {
        let mut storage = EventStorage::new();
        let key = EventKey::new("Ghost", at(5, 14, 0));
        assert!(storage.update_event(&key, |_| {}).is_none());
    }

    #[test]
    fn conflicts_and_busy() {
        let mut storage = EventStorage::new();
        storage.add_event(event("Meeting", at(1, 10, 0), at(1, 11, 0)));

        let overlapping = event("Call", at(1, 10, 30), at(1, 10, 45));
        let adjacent = event("Lunch", at(1, 11, 0), at(1, 12, 0));

        assert!(storage.has_conflict(&overlapping));
        assert!(!storage.has_conflict(&adjacent));
        assert!(storage.is_busy_at(at(1, 10, 0)));
        assert!(!storage.is_busy_at(at(1, 11, 0)));
    }

    #[test]
    fn rezoned_leaves_original_untouched() {
        let mut storage = EventStorage::new();
        storage.add_event(event("Meeting", at(1, 10, 0), at(1, 11, 0)));

        let tokyo = storage.rezoned(chrono_tz::America::New_York, chrono_tz::Asia::Tokyo);

        assert!(storage.find_event("Meeting", at(1, 10, 0)).is_some());
        let moved = tokyo.find_event("Meeting", at(2, 0, 0)).expect("moved event");
        assert_eq!(moved.end, at(2, 1, 0));
        assert_keys_consistent(&tokyo);
    }
}

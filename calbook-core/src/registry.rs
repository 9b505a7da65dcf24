//! Name-keyed event storage partitions, one per calendar.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{DomainError, Outcome};
use crate::event::Event;
use crate::storage::EventStorage;

#[derive(Debug, Clone, Default)]
pub struct CalendarRegistry {
    partitions: HashMap<String, EventStorage>,
}

impl CalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the partition stored under `name`.
    pub fn put(&mut self, name: &str, storage: EventStorage) {
        debug!("Registering partition '{}' ({} events)", name, storage.len());
        self.partitions.insert(name.to_string(), storage);
    }

    pub fn get(&self, name: &str) -> Option<&EventStorage> {
        self.partitions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EventStorage> {
        self.partitions.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<EventStorage> {
        self.partitions.remove(name)
    }

    /// Move every event of `old_name` under `new_name`, merging into an existing partition.
    ///
    /// The merged partition is built before anything is removed, so a failure leaves both
    /// names exactly as they were.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Outcome {
        if old_name == new_name {
            return if self.contains(old_name) {
                Ok(())
            } else {
                Err(DomainError::CalendarNotFound(old_name.to_string()))
            };
        }

        let source = self
            .get(old_name)
            .ok_or_else(|| DomainError::CalendarNotFound(old_name.to_string()))?;

        let mut merged = self.get(new_name).cloned().unwrap_or_default();
        merged.absorb(source.clone());

        self.partitions.insert(new_name.to_string(), merged);
        self.partitions.remove(old_name);

        debug!("Renamed partition '{old_name}' to '{new_name}'");
        Ok(())
    }

    /// All events of one partition, flattened in start order.
    pub fn events_for(&self, name: &str) -> Option<Vec<&Event>> {
        self.get(name).map(|storage| storage.iter().collect())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.partitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

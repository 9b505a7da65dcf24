//! Named calendars and their manager.

mod manager;

pub use manager::CalendarManager;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named calendar. Its events live in the registry partition of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub name: String,
    pub zone: Tz,
}

impl Calendar {
    pub fn new(name: &str, zone: Tz) -> Self {
        Calendar {
            name: name.to_string(),
            zone,
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.zone)
    }
}

/// Calendar attributes that `edit_calendar` can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarProperty {
    Name,
    Timezone,
}

impl CalendarProperty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Some(CalendarProperty::Name),
            "timezone" | "zone" => Some(CalendarProperty::Timezone),
            _ => None,
        }
    }
}

/// What to do when a new event overlaps a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Store it anyway.
    #[default]
    Allow,
    /// Refuse the whole creation.
    Decline,
}

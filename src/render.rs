//! TUI rendering traits for calbook types.
//!
//! This module provides an extension trait that adds colored terminal rendering
//! to calbook-core types using owo_colors.

use calbook_core::{Calendar, DomainError, Event, Response, Visibility};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Calendar {
    fn render(&self) -> String {
        format!("📅 {} {}", self.name, self.zone.to_string().dimmed())
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let time = if self.start.date() == self.end.date() {
            format!(
                "{} {}-{}",
                self.start.format("%Y-%m-%d"),
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )
        } else {
            format!(
                "{} - {}",
                self.start.format("%Y-%m-%d %H:%M"),
                self.end.format("%Y-%m-%d %H:%M")
            )
        };

        let mut line = format!("{} {}", self.subject.bold(), time.dimmed());
        if let Some(location) = &self.location {
            line.push_str(&format!(" @ {location}"));
        }
        if self.visibility == Visibility::Private {
            line.push_str(&format!(" {}", "(private)".dimmed()));
        }
        if self.is_recurring() {
            line.push_str(" ↻");
        }
        line
    }
}

impl Render for DomainError {
    fn render(&self) -> String {
        format!("{} {}", "✗".red(), self.to_string().red())
    }
}

/// Simple pluralization helper
fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

impl Render for Response {
    fn render(&self) -> String {
        match self {
            Response::Done => format!("{} Done", "✓".green()),
            Response::Note(note) => format!("{} {}", "i".blue(), note),
            Response::Created(n) => format!("{} Created {} {}", "+".green(), n, pluralize("event", *n)),
            Response::Edited(n) => format!("{} Edited {} {}", "~".yellow(), n, pluralize("event", *n)),
            Response::Copied(n) => format!("{} Copied {} {}", "+".green(), n, pluralize("event", *n)),
            Response::Busy(true) => "Busy".yellow().to_string(),
            Response::Busy(false) => "Available".green().to_string(),
            Response::Events(events) if events.is_empty() => "   No events".dimmed().to_string(),
            Response::Events(events) => events
                .iter()
                .map(|event| format!("   {}", event.render()))
                .collect::<Vec<_>>()
                .join("\n"),
            Response::Calendars(calendars) if calendars.is_empty() => {
                "   No calendars".dimmed().to_string()
            }
            Response::Calendars(calendars) => calendars
                .iter()
                .map(|calendar| format!("   {}", calendar.render()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

//! Scripted sessions: seed calendars, then run requests in order.
//!
//! ```toml
//! [[calendars]]
//! name = "Work"
//! zone = "America/New_York"
//! import = "~/exports/work.csv"
//! active = true
//!
//! [[requests]]
//! op = "events_on"
//! date = "2025-03-10"
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use calbook_core::zone::parse_zone;
use calbook_core::{CalendarManager, Request, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::csv_codec;
use crate::render::Render;

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub calendars: Vec<CalendarSeed>,
    #[serde(default)]
    pub requests: Vec<Request>,
}

/// A calendar to create before any request runs.
#[derive(Debug, Deserialize)]
pub struct CalendarSeed {
    pub name: String,
    /// Falls back to the configured default zone.
    pub zone: Option<String>,
    /// CSV file whose events are transferred in. Its times are read in `import_zone`.
    pub import: Option<PathBuf>,
    /// Falls back to the calendar's own zone.
    pub import_zone: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Tally of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read script {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Create the seeded calendars and import their CSV files.
    ///
    /// Relative import paths resolve against `base_dir`. Any failure here aborts the run.
    pub fn seed(&self, manager: &mut CalendarManager, default_zone: &str, base_dir: &Path) -> Result<()> {
        if self.calendars.iter().filter(|seed| seed.active).count() > 1 {
            bail!("Only one seeded calendar can be active");
        }

        for seed in &self.calendars {
            let zone = seed.zone.as_deref().unwrap_or(default_zone);
            manager
                .create_calendar(&seed.name, zone)
                .with_context(|| format!("Could not create calendar '{}'", seed.name))?;

            if let Some(import) = &seed.import {
                let path = resolve_path(import, base_dir);
                let file = std::fs::File::open(&path)
                    .with_context(|| format!("Could not open {}", path.display()))?;
                let storage = csv_codec::read_events(file)
                    .with_context(|| format!("Could not import {}", path.display()))?;
                let source_zone = parse_zone(seed.import_zone.as_deref().unwrap_or(zone))?;

                // Importing goes through the active calendar; put the pointer back afterwards.
                let previous = manager.current_calendar().map(|c| c.name.clone());
                manager.use_calendar(&seed.name)?;
                let count = manager.transfer_events_from_storage(Some(&storage), source_zone)?;
                match previous {
                    Some(name) => manager.use_calendar(&name)?,
                    None => manager.clear_active(),
                }
                debug!("Imported {count} events into '{}'", seed.name);
            }
        }

        if let Some(seed) = self.calendars.iter().find(|seed| seed.active) {
            manager.use_calendar(&seed.name)?;
        }

        Ok(())
    }

    /// Run every request, writing one line (or block) per response to `out`.
    ///
    /// Domain failures are reported and the run continues. A malformed request stops it.
    pub fn run(self, manager: &mut CalendarManager, out: &mut impl Write, json: bool) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, request) in self.requests.into_iter().enumerate() {
            let number = index + 1;
            let outcome = manager
                .execute(request)
                .with_context(|| format!("Request #{number} is malformed"))?;

            match &outcome {
                Ok(_) => summary.succeeded += 1,
                Err(err) => {
                    warn!("Request #{number} failed: {err}");
                    summary.failed += 1;
                }
            }

            if json {
                writeln!(out, "{}", json_line(number, &outcome)?)?;
            } else {
                match &outcome {
                    Ok(response) => writeln!(out, "{}", response.render())?,
                    Err(err) => writeln!(out, "{}", err.render())?,
                }
            }
        }

        Ok(summary)
    }
}

fn json_line(number: usize, outcome: &Result<Response, calbook_core::DomainError>) -> Result<String> {
    let value = match outcome {
        Ok(response) => serde_json::json!({ "request": number, "ok": true, "response": response }),
        Err(err) => serde_json::json!({ "request": number, "ok": false, "error": err.to_string() }),
    };
    Ok(serde_json::to_string(&value)?)
}

fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

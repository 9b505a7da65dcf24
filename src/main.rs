mod config;
mod csv_codec;
mod render;
mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use calbook_core::CalendarManager;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::script::Script;

#[derive(Parser)]
#[command(name = "calbook")]
#[command(version, about = "Run scripted calendar sessions and move events in and out as CSV")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print one JSON object per response instead of colored text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed calendars and run the requests of a TOML script
    Run {
        script: PathBuf,

        /// Write the active calendar to this CSV file when the script finishes
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// List known time zone identifiers
    Zones {
        /// Only show zones containing this text (case-insensitive)
        filter: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { script, export } => run(&config, &script, export.as_deref(), cli.json),
        Commands::Zones { filter } => {
            zones(filter.as_deref());
            Ok(())
        }
    }
}

fn run(config: &CliConfig, script_path: &Path, export: Option<&Path>, json: bool) -> Result<()> {
    let script_path = PathBuf::from(shellexpand::tilde(&script_path.to_string_lossy()).into_owned());
    let script = Script::load(&script_path)?;
    let base_dir = script_path.parent().unwrap_or(Path::new("."));

    let mut manager = CalendarManager::new();
    script.seed(&mut manager, &config.default_zone, base_dir)?;

    let stdout = std::io::stdout();
    let summary = script.run(&mut manager, &mut stdout.lock(), json)?;
    info!("{} requests succeeded, {} failed", summary.succeeded, summary.failed);

    if let Some(path) = export {
        let Some(storage) = manager.current_storage() else {
            bail!("No calendar is in use; nothing to export");
        };
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        let count = csv_codec::write_events(file, storage)?;

        if !json {
            eprintln!("{} Exported {} events to {}", "✓".green(), count, path.display());
        }
    }

    if summary.failed > 0 && !json {
        eprintln!("{}", format!("{} of the requests failed", summary.failed).red());
    }

    Ok(())
}

fn zones(filter: Option<&str>) {
    let needle = filter.map(str::to_lowercase);

    for zone in chrono_tz::TZ_VARIANTS {
        let name = zone.name();
        if needle.as_deref().is_none_or(|needle| name.to_lowercase().contains(needle)) {
            println!("{name}");
        }
    }
}

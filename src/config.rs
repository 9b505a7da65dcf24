//! Global calbook configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

static DEFAULT_LOG_LEVEL: &str = "warn";

fn default_zone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Configuration at ~/.config/calbook/config.toml, overridden by `CALBOOK_*` variables.
#[derive(Deserialize, Clone, Debug)]
pub struct CliConfig {
    /// Zone for calendars a script creates without naming one, and for CSV imports.
    #[serde(default = "default_zone")]
    pub default_zone: String,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl CliConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("calbook");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` if given (it must exist), else from the default location,
    /// writing a commented default file there on first run.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source = match path {
            Some(path) => {
                let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
                File::from(expanded).required(true)
            }
            None => {
                let config_path = Self::config_path()?;
                if !config_path.exists() {
                    Self::create_default_config(&config_path)?;
                }
                File::from(config_path).required(false)
            }
        };

        Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix("CALBOOK"))
            .build()
            .context("Could not read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# calbook configuration

# Zone for new calendars and CSV imports (defaults to the system zone):
# default_zone = \"{}\"

# Log level when RUST_LOG is not set:
# log_level = \"{}\"
",
            default_zone(),
            DEFAULT_LOG_LEVEL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents).context("Could not write config file")?;

        Ok(())
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::data::loader::LoaderConfig;
use crate::data::tempo::{DEFAULT_TEMPO_BINS, DEFAULT_TEMPO_CAP};
use crate::data::views::ViewSettings;

pub const APP_NAME: &str = "music-health-dashboard";

/// Survey export used when neither the CLI nor the config file names one.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/mohidqadeer123/streamlit-tests/refs/heads/main/Dataset.csv";

/// Dashboard configuration loaded from a TOML config file.
/// All fields have defaults, so the file is optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// URL or local path of the survey table.
    pub source: String,
    /// Whole-request timeout for remote sources, in seconds.
    pub request_timeout_secs: u64,
    /// Number of quantile bins in the tempo box plot.
    pub tempo_bins: usize,
    /// Tempo values above this are bucketed as this value.
    pub tempo_cap: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            request_timeout_secs: 30,
            tempo_bins: DEFAULT_TEMPO_BINS,
            tempo_cap: DEFAULT_TEMPO_CAP,
        }
    }
}

impl DashboardConfig {
    /// Load config from `path`, or from `~/.config/music-health-dashboard/config.toml`
    /// when no path is given. Returns defaults if the file doesn't exist or
    /// can't be parsed (logging a warning in the latter case).
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).or_else(Self::config_path);
        match path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn loader(&self) -> LoaderConfig {
        LoaderConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            tempo_bins: self.tempo_bins.max(1),
            tempo_cap: self.tempo_cap,
        }
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::resolution::DEFAULT_MONTH_FALLBACK_CAP,
    domain::{Origin, OriginFilter},
    errors::{PaymentsError, Result},
    ingest::{pipeline::DEFAULT_CONTEXT_WINDOW, sources::default_web_sources, WebSource},
    utils::paths::{app_data_dir, config_file_in, ensure_dir, store_file_in, write_atomic},
};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Month rows recast per uncovered fund when resolving a day.
    pub month_fallback_cap: usize,
    /// Characters scanned on each side of a date found in free text.
    pub context_window: usize,
    pub http_timeout_secs: u64,
    pub default_origins: Vec<Origin>,
    pub web_sources: Vec<WebSource>,
    /// Spreadsheets imported silently, once per year, when present.
    pub autoload_tables: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            month_fallback_cap: DEFAULT_MONTH_FALLBACK_CAP,
            context_window: DEFAULT_CONTEXT_WINDOW,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            default_origins: Origin::STORABLE.to_vec(),
            web_sources: default_web_sources(),
            autoload_tables: Vec::new(),
        }
    }
}

impl Config {
    pub fn origin_filter(&self) -> OriginFilter {
        OriginFilter::from_selection(self.default_origins.iter().copied())
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_timeout_secs == 0 {
            return Err(PaymentsError::ConfigError(
                "http_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.default_origins.contains(&Origin::Info) {
            return Err(PaymentsError::ConfigError(
                "default_origins cannot include `info`".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::from_base(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    /// Reads the config file, falling back to defaults when it does not exist yet.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data).map_err(|e| {
            PaymentsError::ConfigError(format!("`{}`: {e}", self.path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Payment store location next to the config file.
    pub fn store_path(&self) -> PathBuf {
        store_file_in(&self.base)
    }
}

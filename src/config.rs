// src/config.rs

use crate::fetch::DataUrls;
use crate::process::QuoteMode;
use crate::report::RECOVERY_RATIO;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tracing::{debug, info};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/";

pub const ENV_BASE_URL: &str = "COVIDSCRAPER_BASE_URL";
pub const ENV_OUTPUT_DIR: &str = "COVIDSCRAPER_OUTPUT_DIR";
pub const ENV_COUNTRIES: &str = "COVIDSCRAPER_COUNTRIES";

/// Run settings, read from an optional YAML file and then the environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub confirmed_file: String,
    pub deaths_file: String,
    pub countries: Vec<String>,
    pub output_dir: PathBuf,
    pub quote_mode: QuoteMode,
    pub recovery_ratio: f64,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            confirmed_file: "time_series_covid19_confirmed_global.csv".to_string(),
            deaths_file: "time_series_covid19_deaths_global.csv".to_string(),
            countries: ["US", "Italy", "France", "Germany"]
                .map(String::from)
                .to_vec(),
            output_dir: PathBuf::from("exports"),
            quote_mode: QuoteMode::default(),
            recovery_ratio: RECOVERY_RATIO,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` when given, overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        info!(
            countries = config.countries.len(),
            output_dir = %config.output_dir.display(),
            "config loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", path))
    }

    /// An empty document gives the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(ENV_BASE_URL) {
            debug!(%base, "base url from environment");
            self.base_url = base;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(list) = lookup(ENV_COUNTRIES) {
            self.countries = list
                .split(';')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Resolve both dataset URLs against `base_url`.
    pub fn urls(&self) -> Result<DataUrls> {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        let base = Url::parse(&base).with_context(|| format!("parsing base URL {}", base))?;
        Ok(DataUrls {
            confirmed: base
                .join(&self.confirmed_file)
                .with_context(|| format!("joining {}", self.confirmed_file))?,
            deaths: base
                .join(&self.deaths_file)
                .with_context(|| format!("joining {}", self.deaths_file))?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

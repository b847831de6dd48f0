use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_DB_PATH: &str = "data/colleges.sqlite";
const SCORECARD_URL: &str = "https://api.collegescorecard.ed.gov/v1/schools.json";

/// Runtime settings: defaults, then `college_scraper.toml` if present,
/// then `COLLEGE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub scorecard_url: String,
    pub scorecard_api_key: Option<String>,
    pub enrichment_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let cfg = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("scorecard_url", SCORECARD_URL)?
            .set_default("enrichment_timeout_secs", 5_i64)?
            .set_default("fetch_timeout_secs", 20_i64)?
            .add_source(File::with_name("college_scraper").required(false))
            .add_source(Environment::with_prefix("COLLEGE"))
            .build()
            .context("Failed to load settings")?;
        cfg.try_deserialize().context("Invalid settings")
    }

    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

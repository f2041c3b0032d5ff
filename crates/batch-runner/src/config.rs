//! Runner configuration.
//!
//! Loaded from an optional config file layered under `STRATEGY_LAB__*`
//! environment variables (nested keys separated by `__`), after reading a
//! local `.env` if present.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::error::Result;
use crate::orchestrator::RunOptions;
use crate::types::{Scenario, Target};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STRATEGY_LAB";

/// Complete runner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub options: RunOptions,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Directory holding `<target>.json` candle files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl RunnerConfig {
    /// Load configuration from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

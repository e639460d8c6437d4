//! # Configuration Loader
//!
//! Layers configuration sources in increasing precedence:
//!
//! 1. Built-in defaults ([`ProcessorConfig::default`])
//! 2. Optional TOML file (explicit path, or `FARM_CONFIG_PATH`)
//! 3. Environment variables `FARM__<SECTION>__<KEY>`, e.g. `FARM__QUEUES__BATCH_SIZE=25`
//!
//! A `.env` file is loaded first when present.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use validator::Validate;

use super::ProcessorConfig;
use crate::error::{ProcessorError, ProcessorResult};

const ENV_PREFIX: &str = "FARM";
const ENV_SEPARATOR: &str = "__";
const CONFIG_PATH_VAR: &str = "FARM_CONFIG_PATH";

/// Zero-state loader; all functions are associated
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Detect environment from FARM_ENV or default to "development"
    pub fn detect_environment() -> String {
        std::env::var("FARM_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// Load configuration, using `path` or falling back to `FARM_CONFIG_PATH`
    pub fn load(path: Option<&Path>) -> ProcessorResult<ProcessorConfig> {
        // Load .env file if present (silently ignore if not found)
        dotenvy::dotenv().ok();

        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

        let mut builder =
            Config::builder().add_source(Config::try_from(&ProcessorConfig::default())?);

        if let Some(path) = &path {
            if !path.exists() {
                return Err(ProcessorError::ConfigurationError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            tracing::info!(
                path = %path.display(),
                environment = %Self::detect_environment(),
                "Loading processor configuration"
            );
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        let config: ProcessorConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("freshness.watched_tables")
                    .with_list_parse_key("cache.namespaces"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::debug!("Successfully loaded and validated ProcessorConfig");
        Ok(config)
    }

    /// Load configuration from a TOML string (defaults fill missing fields)
    pub fn load_from_str(contents: &str) -> ProcessorResult<ProcessorConfig> {
        let config: ProcessorConfig = Config::builder()
            .add_source(Config::try_from(&ProcessorConfig::default())?)
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

//! `pricesnap-config` - PriceSnap configuration management.
//!
//! Provides:
//! - Typed config schema
//! - YAML read/write with a backup of the previous file
//! - `${ENV_VAR}` substitution and API key env fallbacks
//! - Default value application
//! - Validation
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_fallbacks, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use redact::redact;
pub use schema::{ImageConfig, InferenceConfig, LocationConfig, LoggingConfig, PriceSnapConfig, StorageConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply defaults, and validate the config in `config_dir`.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(config_dir: &Path) -> Result<PriceSnapConfig> {
    let raw_config = load_config(&config_file_path(config_dir)).await?;
    let env: HashMap<String, String> = std::env::vars().collect();
    prepare(raw_config, config_dir, &env)
}

/// The processing pipeline behind `load_and_prepare`, with an explicit environment.
pub fn prepare(
    raw_config: PriceSnapConfig,
    config_dir: &Path,
    env: &HashMap<String, String>,
) -> Result<PriceSnapConfig> {
    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;

    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: PriceSnapConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_fallbacks(config, env);
    let config = apply_all_defaults(config, config_dir);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{first}");
    }

    Ok(config)
}

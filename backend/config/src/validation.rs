//! Config validation with user-friendly error messages.

use crate::schema::PriceSnapConfig;
use thiserror::Error;

const KNOWN_PROVIDERS: &[&str] = &["gemini", "google", "openai"];
const KNOWN_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PriceSnapConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_inference(config, &mut report);
    validate_image(config, &mut report);
    validate_logging(config, &mut report);
    validate_location(config, &mut report);
    report
}

fn validate_inference(config: &PriceSnapConfig, report: &mut ValidationReport) {
    let inference = &config.inference;
    if let Some(provider) = &inference.provider {
        if !KNOWN_PROVIDERS.iter().any(|p| p.eq_ignore_ascii_case(provider)) {
            report.error("inference.provider", format!("Unknown provider \"{provider}\""));
        }
    }
    if inference.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        report.warn("inference.apiKey", "No API key configured; scan and ask will fail");
    }
    if inference.timeout_secs == Some(0) {
        report.error("inference.timeoutSecs", "Timeout must be greater than zero");
    }
    if let Some(url) = &inference.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("inference.baseUrl", "Base URL must start with http:// or https://");
        }
    }
}

fn validate_image(config: &PriceSnapConfig, report: &mut ValidationReport) {
    if config.image.max_dimension == Some(0) {
        report.error("image.maxDimension", "Max dimension must be greater than zero");
    }
    if let Some(quality) = config.image.quality {
        if !(1..=100).contains(&quality) {
            report.error("image.quality", "Quality must be between 1 and 100");
        }
    }
}

fn validate_logging(config: &PriceSnapConfig, report: &mut ValidationReport) {
    if let Some(level) = &config.logging.level {
        if !KNOWN_LEVELS.iter().any(|l| l.eq_ignore_ascii_case(level)) {
            report.warn("logging.level", format!("Unrecognized level \"{level}\""));
        }
    }
}

fn validate_location(config: &PriceSnapConfig, report: &mut ValidationReport) {
    let Some(location) = &config.location else { return };
    if !(-90.0..=90.0).contains(&location.latitude) {
        report.error("location.latitude", "Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&location.longitude) {
        report.error("location.longitude", "Longitude must be between -180 and 180");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LocationConfig;

    #[test]
    fn default_config_only_warns_about_api_key() {
        let report = validate(&PriceSnapConfig::default());
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "inference.apiKey");
    }

    #[test]
    fn catches_bad_values() {
        let mut config = PriceSnapConfig::default();
        config.inference.provider = Some("ollama".into());
        config.inference.timeout_secs = Some(0);
        config.image.quality = Some(0);
        config.location = Some(LocationConfig { latitude: 95.0, longitude: 0.0 });

        let report = validate(&config);
        let paths: Vec<&str> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["inference.provider", "inference.timeoutSecs", "image.quality", "location.latitude"]
        );
    }
}

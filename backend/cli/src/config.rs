use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use pricesnap_config::PriceSnapConfig;
use pricesnap_core::GeoPosition;
use pricesnap_media::PreprocessOptions;
use pricesnap_understanding::{ProviderKind, ProviderSettings};

/// Prepared configuration plus the directory it came from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub config: PriceSnapConfig,
}

impl Settings {
    /// Load `config.yaml` from `config_dir`, with env substitution and defaults applied.
    pub async fn load(config_dir: PathBuf) -> Result<Self> {
        let config = pricesnap_config::load_and_prepare(&config_dir).await?;
        Ok(Self { config_dir, config })
    }

    pub fn storage_path(&self) -> PathBuf {
        self.config
            .storage
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config_dir.join(pricesnap_config::defaults::RECORDS_FILE_NAME))
    }

    /// Provider settings, or `None` when no API key is configured.
    pub fn provider_settings(&self) -> Result<Option<ProviderSettings>> {
        let inference = &self.config.inference;
        let Some(api_key) = inference.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        let kind = ProviderKind::from_str(
            inference
                .provider
                .as_deref()
                .unwrap_or(pricesnap_config::defaults::DEFAULT_PROVIDER),
        )?;
        Ok(Some(ProviderSettings {
            kind,
            api_key,
            model: inference.model.clone(),
            base_url: inference.base_url.clone(),
            timeout: Duration::from_secs(
                inference
                    .timeout_secs
                    .unwrap_or(pricesnap_config::defaults::DEFAULT_TIMEOUT_SECS),
            ),
        }))
    }

    pub fn preprocess_options(&self) -> PreprocessOptions {
        let defaults = PreprocessOptions::default();
        PreprocessOptions {
            max_dimension: self.config.image.max_dimension.unwrap_or(defaults.max_dimension),
            quality: self.config.image.quality.unwrap_or(defaults.quality),
        }
    }

    /// Default location from config, if set and valid.
    pub fn default_location(&self) -> Option<GeoPosition> {
        let location = self.config.location?;
        GeoPosition::new(location.latitude, location.longitude).ok()
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.config.logging.dir.as_deref().map(Path::new)
    }

    pub fn log_level(&self) -> &str {
        self.config.logging.level.as_deref().unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.config.logging.json.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricesnap_config::LocationConfig;

    fn settings(config: PriceSnapConfig) -> Settings {
        Settings {
            config_dir: PathBuf::from("/cfg"),
            config,
        }
    }

    #[test]
    fn no_api_key_means_no_provider() {
        assert!(settings(PriceSnapConfig::default()).provider_settings().unwrap().is_none());
    }

    #[test]
    fn maps_inference_section() {
        let mut config = PriceSnapConfig::default();
        config.inference.provider = Some("openai".into());
        config.inference.api_key = Some("sk-x".into());
        config.inference.timeout_secs = Some(15);

        let provider = settings(config).provider_settings().unwrap().unwrap();
        assert_eq!(provider.kind, ProviderKind::OpenAi);
        assert_eq!(provider.timeout, Duration::from_secs(15));
        assert!(provider.model.is_none());
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let mut config = PriceSnapConfig::default();
        config.inference.provider = Some("carrier-pigeon".into());
        config.inference.api_key = Some("k".into());
        assert!(settings(config).provider_settings().is_err());
    }

    #[test]
    fn storage_and_image_fall_back_to_defaults() {
        let s = settings(PriceSnapConfig::default());
        assert_eq!(s.storage_path(), PathBuf::from("/cfg/records.json"));
        assert_eq!(s.preprocess_options(), PreprocessOptions::default());
    }

    #[test]
    fn default_location_ignores_invalid_coordinates() {
        let mut config = PriceSnapConfig::default();
        config.location = Some(LocationConfig { latitude: 120.0, longitude: 0.0 });
        assert!(settings(config).default_location().is_none());
    }
}

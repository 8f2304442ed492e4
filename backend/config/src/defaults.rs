//! Config defaults: applies sensible default values to parsed config.

use std::path::Path;

use crate::schema::PriceSnapConfig;

pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default HTTP timeout for inference calls (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_MAX_DIMENSION: u32 = 400;

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the storage file inside the config directory.
pub const RECORDS_FILE_NAME: &str = "records.json";

/// Apply all defaults to a freshly loaded config.
///
/// Relative paths are resolved against `config_dir`.
pub fn apply_all_defaults(config: PriceSnapConfig, config_dir: &Path) -> PriceSnapConfig {
    let config = apply_inference_defaults(config);
    let config = apply_storage_defaults(config, config_dir);
    let config = apply_image_defaults(config);
    apply_logging_defaults(config, config_dir)
}

fn apply_inference_defaults(mut config: PriceSnapConfig) -> PriceSnapConfig {
    let inference = &mut config.inference;
    inference.provider.get_or_insert_with(|| DEFAULT_PROVIDER.to_string());
    inference.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    config
}

fn apply_storage_defaults(mut config: PriceSnapConfig, config_dir: &Path) -> PriceSnapConfig {
    let path = match config.storage.path.take() {
        Some(p) => resolve_against(config_dir, &p),
        None => config_dir.join(RECORDS_FILE_NAME).display().to_string(),
    };
    config.storage.path = Some(path);
    config
}

fn apply_image_defaults(mut config: PriceSnapConfig) -> PriceSnapConfig {
    config.image.max_dimension.get_or_insert(DEFAULT_MAX_DIMENSION);
    config.image.quality.get_or_insert(DEFAULT_JPEG_QUALITY);
    config
}

fn apply_logging_defaults(mut config: PriceSnapConfig, config_dir: &Path) -> PriceSnapConfig {
    let logging = &mut config.logging;
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    logging.dir = Some(match logging.dir.take() {
        Some(dir) => resolve_against(config_dir, &dir),
        None => config_dir.join("logs").display().to_string(),
    });
    config
}

fn resolve_against(base: &Path, raw: &str) -> String {
    let path = Path::new(raw);
    if path.is_absolute() {
        raw.to_string()
    } else {
        base.join(path).display().to_string()
    }
}

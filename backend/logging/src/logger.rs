//! Structured Logger
//!
//! Wraps `tracing` with an env-controlled level, a console layer on stderr,
//! and an optional rolling NDJSON file.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "pricesnap.log";

/// Target of the structured record events; kept out of the console.
pub const RECORD_EVENTS_TARGET: &str = "record_events";

/// Initialize the global logger.
///
/// `level` applies to the NDJSON file written to
/// `<log_dir>/pricesnap.log.YYYY-MM-DD`. The console on stderr only shows
/// warnings unless `level` asks for debug or trace, and never shows record
/// events. `RUST_LOG` overrides both.
pub fn init_logger(log_dir: Option<&Path>, level: &str, json_console: bool) {
    let console_filter = console_directives(level);

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_filter(env_filter(level))
    });

    let json_console_layer = json_console.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&console_filter))
    });

    let console_layer = (!json_console).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .with_filter(env_filter(&console_filter))
    });

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(json_console_layer)
        .with(file_layer)
        .try_init();
}

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

/// Console directives for a configured `level`.
fn console_directives(level: &str) -> String {
    let console_level = match level.trim().to_ascii_lowercase().as_str() {
        verbose @ ("trace" | "debug") => verbose.to_string(),
        "error" => "error".to_string(),
        _ => "warn".to_string(),
    };
    format!("{console_level},{RECORD_EVENTS_TARGET}=off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let dir = std::env::temp_dir().join(format!("pricesnap-logs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        init_logger(Some(&dir), "debug", false);
        init_logger(None, "info", true);
        tracing::info!("logger initialized");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn console_stays_quiet_at_default_level() {
        assert_eq!(console_directives("info"), "warn,record_events=off");
        assert_eq!(console_directives("warn"), "warn,record_events=off");
        assert_eq!(console_directives("error"), "error,record_events=off");
    }

    #[test]
    fn console_follows_verbose_levels() {
        assert_eq!(console_directives("debug"), "debug,record_events=off");
        assert_eq!(console_directives(" TRACE "), "trace,record_events=off");
    }
}

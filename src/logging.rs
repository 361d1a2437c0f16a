//! `env_logger` setup for the demo binary and for tests that want output.
//!
//! The library itself only emits through the `log` macros.
use env_logger::fmt::TimestampPrecision;
use log::LevelFilter;
use std::sync::Once;

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. "info" or "raster_engine=trace".
    /// Falls back to `RUST_LOG`, then to `default_level`.
    pub env_filter: Option<String>,
    pub default_level: LevelFilter,
    /// Timestamp precision for each record; `None` drops timestamps
    pub timestamps: Option<TimestampPrecision>,
    /// Prefix records with the emitting module path
    pub module_path: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: LevelFilter::Info,
            timestamps: Some(TimestampPrecision::Millis),
            module_path: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

fn builder(config: &LoggingConfig) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.default_level);

    if let Some(filter) = config.env_filter.clone().or_else(|| std::env::var("RUST_LOG").ok()) {
        builder.parse_filters(&filter);
    }

    builder
        .format_timestamp(config.timestamps)
        .format_module_path(config.module_path)
        .write_style(config.write_style);
    builder
}

static INIT: Once = Once::new();

/// Install the global logger. Only the first call has an effect; a logger
/// installed elsewhere beforehand is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        if builder(&config).try_init().is_ok() {
            log::debug!(
                "logging initialized (timestamps: {:?}, module path: {})",
                config.timestamps,
                config.module_path
            );
        }
    });
}

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "tessera_engine=debug,wgpu=warn") and takes precedence over `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    /// Level used when neither `env_filter` nor `RUST_LOG` is set.
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.env_filter.clone().or_else(|| std::env::var("RUST_LOG").ok());
        let mut builder = builder(&config, filter.as_deref());

        if builder.try_init().is_err() {
            // Another logger was installed by the host.
            return;
        }
        log::debug!("logging initialized");
    });
}

fn builder(config: &LoggingConfig, filter: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    match filter {
        Some(f) => builder.parse_filters(f),
        None => builder.filter_level(config.default_level),
    };
    builder.write_style(config.write_style);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_applies_without_filter() {
        let config = LoggingConfig { default_level: log::LevelFilter::Warn, ..Default::default() };
        let logger = builder(&config, None).build();
        assert_eq!(logger.filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn filter_string_wins() {
        let logger = builder(&LoggingConfig::default(), Some("debug")).build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
    }
}

//! Logging setup for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job. Output goes to stderr so command output on stdout stays
//! clean.
//!
//! Filter precedence: `EXAMDESK_LOG`, then `-v` (debug), then the configured
//! `log-filter`, then `warn`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "EXAMDESK_LOG";
const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub verbose: bool,
    /// Filter from the app config, used when neither env nor `-v` apply.
    pub configured: Option<String>,
}

impl LogConfig {
    pub fn new(verbose: bool, configured: Option<String>) -> Self {
        Self {
            verbose,
            configured,
        }
    }

    fn fallback_directive(&self) -> String {
        if self.verbose {
            "examdesk=debug,warn".to_string()
        } else {
            self.configured
                .clone()
                .unwrap_or_else(|| DEFAULT_FILTER.to_string())
        }
    }

    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::try_new(self.fallback_directive())
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        })
    }
}

/// Install the global subscriber. A second call is ignored.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins_over_configured_filter() {
        let config = LogConfig::new(true, Some("error".into()));
        assert_eq!(config.fallback_directive(), "examdesk=debug,warn");
    }

    #[test]
    fn configured_filter_then_default() {
        assert_eq!(
            LogConfig::new(false, Some("info".into())).fallback_directive(),
            "info"
        );
        assert_eq!(LogConfig::default().fallback_directive(), "warn");
    }
}

//! Process-wide logging setup.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Target used by every event this crate emits.
pub const LOG_TARGET: &str = "quill";

static INIT: Once = Once::new();

/// Logging settings applied by [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
    /// Print the event target.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: format!("{}=warn", LOG_TARGET),
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = directives.into();
        self
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}

/// Install a stderr subscriber. Only the first call has any effect, and it
/// leaves an already installed global subscriber alone.
pub fn init(config: &LogConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.filter))
            .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", LOG_TARGET)));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(config.with_target).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    });
}

use ms_config::{debug_logging, ConfigError, EnvSource, ProcessEnv, RuntimeMode};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEBUG_DIRECTIVE: &str = "debug";
const INFO_DIRECTIVE: &str = "info";

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Output settings resolved from the runtime mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub mode: RuntimeMode,
    pub debug: bool,
    /// Structured JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogSettings {
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ObservabilityError> {
        let mode = RuntimeMode::from_env(env)?;
        Ok(Self {
            mode,
            debug: debug_logging(env, mode),
            json: mode.is_production(),
        })
    }

    pub fn default_directive(&self) -> &'static str {
        if self.debug {
            DEBUG_DIRECTIVE
        } else {
            INFO_DIRECTIVE
        }
    }

    /// `RUST_LOG` wins over the mode-derived level when present.
    pub fn env_filter(&self, rust_log: Option<&str>) -> Result<EnvFilter, ObservabilityError> {
        let directive = rust_log
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.default_directive());
        EnvFilter::try_new(directive).map_err(|err| ObservabilityError::InvalidFilter {
            directive: directive.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Installs the global subscriber described by `settings`.
pub fn init(settings: &LogSettings, rust_log: Option<&str>) -> Result<(), ObservabilityError> {
    let filter = settings.env_filter(rust_log)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if settings.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_target(true).try_init()
    };
    installed.map_err(|_| ObservabilityError::AlreadyInitialized)?;

    debug!(mode = %settings.mode, json = settings.json, "tracing initialised");
    Ok(())
}

/// Resolves settings from the process environment and installs the subscriber.
///
/// Call once at the top of `main`; library crates only emit events.
pub fn init_from_env() -> Result<LogSettings, ObservabilityError> {
    let settings = LogSettings::from_env(&ProcessEnv)?;
    let rust_log = ProcessEnv.lookup(EnvFilter::DEFAULT_ENV);
    init(&settings, rust_log.as_deref())?;
    Ok(settings)
}

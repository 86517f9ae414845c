use std::fmt;
use std::str::FromStr;

use crate::env::EnvSource;
use crate::error::{ConfigError, ConfigResult};

pub const ENV_RUNNING_MODE: &str = "MS_MODE";
pub const ENV_LOG_MODE: &str = "MS_LOG_MODE";

const PRODUCTION_MODE: &str = "prod";
const DEVELOPMENT_MODE: &str = "dev";
const DEBUG_LOGGING_MODE: &str = "debug";

/// Deployment mode of a microservice, selected with `MS_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    #[default]
    Development,
}

impl RuntimeMode {
    /// Reads `MS_MODE`, defaulting to development when unset.
    pub fn from_env(env: &impl EnvSource) -> ConfigResult<Self> {
        match env.lookup(ENV_RUNNING_MODE) {
            Some(value) => value.parse().map_err(|_| ConfigError::Unsupported {
                key: ENV_RUNNING_MODE.to_string(),
                value,
            }),
            None => Ok(Self::default()),
        }
    }

    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Production => PRODUCTION_MODE,
            RuntimeMode::Development => DEVELOPMENT_MODE,
        }
    }
}

impl FromStr for RuntimeMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            PRODUCTION_MODE => Ok(RuntimeMode::Production),
            DEVELOPMENT_MODE => Ok(RuntimeMode::Development),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether debug-level logs are wanted.
///
/// An explicit `MS_LOG_MODE` wins; otherwise everything but production logs at debug.
pub fn debug_logging(env: &impl EnvSource, mode: RuntimeMode) -> bool {
    match env.lookup(ENV_LOG_MODE) {
        Some(value) => value.trim() == DEBUG_LOGGING_MODE,
        None => !mode.is_production(),
    }
}

use std::collections::HashMap;
use std::env;

use crate::error::{ConfigError, ConfigResult};

/// Source of configuration values keyed by environment variable name.
///
/// The process environment is the production source; tests hand in a plain
/// map so they never race on global state.
pub trait EnvSource {
    fn lookup(&self, key: &str) -> Option<String>;

    /// Value for `key`, failing when it is unset or blank.
    fn required(&self, key: &str) -> ConfigResult<String> {
        let value = self
            .lookup(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        if value.trim().is_empty() {
            return Err(ConfigError::Empty(key.to_string()));
        }
        Ok(value)
    }

    /// Value for `key`, or `default` when it is unset.
    fn optional(&self, key: &str, default: &str) -> String {
        self.lookup(key).unwrap_or_else(|| default.to_string())
    }
}

/// Reads from `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

pub fn get_required_env(key: &str) -> ConfigResult<String> {
    ProcessEnv.required(key)
}

pub fn get_optional_env(key: &str, default: &str) -> String {
    ProcessEnv.optional(key, default)
}

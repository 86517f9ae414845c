use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is missing")]
    Missing(String),
    #[error("{0} environment variable is empty")]
    Empty(String),
    #[error("{key} environment variable has unsupported value '{value}'")]
    Unsupported { key: String, value: String },
}

impl ConfigError {
    /// Name of the environment variable the error refers to.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::Missing(key) | ConfigError::Empty(key) => key,
            ConfigError::Unsupported { key, .. } => key,
        }
    }
}

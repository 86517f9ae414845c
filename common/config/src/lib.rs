pub mod env;
pub mod error;
pub mod mode;

pub use env::{get_optional_env, get_required_env, EnvSource, ProcessEnv};
pub use error::{ConfigError, ConfigResult};
pub use mode::{debug_logging, RuntimeMode, ENV_LOG_MODE, ENV_RUNNING_MODE};

//! Configuration loading and types.

pub mod env;
pub mod types;
pub mod validate;

pub use types::*;

use crate::common::error::ConfigError;

/// Load `.env` and read the environment without validating.
///
/// Logging needs `LOG_FILE` before validation problems can be reported.
pub fn load() -> Result<Config, ConfigError> {
    env::load_dotenv()?;
    env::from_env()
}

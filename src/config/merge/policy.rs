//! Base layer every config build starts from.

use crate::config::CodesyncConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// A builder seeded with the built-in defaults, so partial files only override
/// the keys they name.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&CodesyncConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

pub mod loader;
pub mod schema;

pub use loader::load_settings;
pub use schema::Settings;

use thiserror::Error;

/// Errors raised while assembling [`Settings`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    MissingRequired(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

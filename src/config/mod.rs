//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, NetworkConfig, GeneralConfig)
//! - [`policy`]: Defaults applied to a channel the first time the warden joins it
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup validation

mod defaults;
mod policy;
mod types;
mod validation;

pub use policy::PolicyDefaults;
pub use types::{
    Config, ConfigError, DatabaseConfig, GeneralConfig, IdentityConfig, LogFormat, NetworkConfig,
};
pub use validation::{ValidationError, validate};

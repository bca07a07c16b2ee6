//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("identity.nickname is required")]
    MissingNickname,
    #[error("network.host is required")]
    MissingHost,
    #[error("general.linerate must be a finite number >= 0, got {0}")]
    InvalidLinerate(f64),
    #[error("general.trigger must be a printable ASCII character, got {0:?}")]
    InvalidTrigger(char),
    #[error("general.outbound_queue must be greater than zero")]
    EmptyOutboundQueue,
    #[error("policy.{0} must be greater than zero")]
    ZeroThreshold(&'static str),
    #[error("network.channels entry is not a channel name: {0}")]
    InvalidChannel(String),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.identity.nickname.trim().is_empty() {
        errors.push(ValidationError::MissingNickname);
    }
    if config.network.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }

    let linerate = config.general.linerate;
    if !linerate.is_finite() || linerate < 0.0 {
        errors.push(ValidationError::InvalidLinerate(linerate));
    }

    let trigger = config.general.trigger;
    if !trigger.is_ascii_graphic() {
        errors.push(ValidationError::InvalidTrigger(trigger));
    }

    if config.general.outbound_queue == 0 {
        errors.push(ValidationError::EmptyOutboundQueue);
    }

    if config.policy.warn_to_kick == 0 {
        errors.push(ValidationError::ZeroThreshold("warn_to_kick"));
    }
    if config.policy.kick_to_ban == 0 {
        errors.push(ValidationError::ZeroThreshold("kick_to_ban"));
    }

    for channel in &config.network.channels {
        if !crate::network::is_channel_name(channel) {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }

    // Database path validation
    if let Some(ref db) = config.database {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r##"
[identity]
nickname = "warden"

[network]
host = "irc.example.net"
channels = ["#rust", "&local"]
"##
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_nickname_fails() {
        let toml = r##"
[identity]
nickname = ""

[network]
host = "irc.example.net"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingNickname)));
    }

    #[test]
    fn test_zero_thresholds_fail() {
        let toml = r##"
[identity]
nickname = "warden"

[network]
host = "irc.example.net"

[policy]
warn_to_kick = 0
kick_to_ban = 0
"##;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::ZeroThreshold(_)))
                .count(),
            2
        );
    }

    #[test]
    fn test_bad_channel_and_linerate_fail() {
        let toml = r##"
[identity]
nickname = "warden"

[network]
host = "irc.example.net"
channels = ["rust"]

[general]
linerate = -1.0
"##;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidChannel(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidLinerate(_))));
    }

    #[test]
    fn test_missing_database_dir_fails() {
        let toml = r##"
[identity]
nickname = "warden"

[network]
host = "irc.example.net"

[database]
path = "/nonexistent/dir/warden.db"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
    }
}

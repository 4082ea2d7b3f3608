//! Application Configuration
//!
//! Configuration for the directory application layer.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use platform::backoff::{BASE_DELAY, BackoffPolicy};
use platform::password::{
    Argon2Hasher, HashingParams, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PasswordPolicy,
};
use thiserror::Error;

use crate::domain::services::CredentialEngine;
use crate::error::DirectoryResult;

/// Default bus channel capacity (messages buffered per topic)
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable present but unparsable
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Directory application configuration
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Backoff unit: delay after n failures is `(2^n - 1) * base_delay`
    pub base_delay: Duration,
    /// Optional backoff ceiling (unbounded when `None`)
    pub max_delay: Option<Duration>,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Argon2 cost parameters
    pub hashing: HashingParams,
    /// Minimum password length (characters)
    pub min_password_length: usize,
    /// Maximum password length (characters)
    pub max_password_length: usize,
    /// Bus request timeout (none when `None`)
    pub request_timeout: Option<Duration>,
    /// Per-topic bus buffer
    pub bus_capacity: usize,
    /// JSON array of users created at startup
    pub seed_file: Option<PathBuf>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_delay: BASE_DELAY,
            max_delay: None,
            password_pepper: None,
            hashing: HashingParams::default(),
            min_password_length: MIN_PASSWORD_LENGTH,
            max_password_length: MAX_PASSWORD_LENGTH,
            request_timeout: None,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            seed_file: None,
        }
    }
}

impl DirectoryConfig {
    /// Create config for development (cheap hashing, short timeout)
    pub fn development() -> Self {
        Self {
            hashing: HashingParams {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
            },
            request_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        }
    }

    /// Load from `DIRECTORY_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            base_delay: env_parse::<u64>("DIRECTORY_BASE_DELAY_MS")?
                .map_or(defaults.base_delay, Duration::from_millis),
            max_delay: env_parse::<u64>("DIRECTORY_MAX_DELAY_MS")?.map(Duration::from_millis),
            password_pepper: env_string("DIRECTORY_PASSWORD_PEPPER").map(String::into_bytes),
            hashing: HashingParams {
                memory_cost: env_parse("DIRECTORY_HASH_MEMORY_KIB")?
                    .unwrap_or(defaults.hashing.memory_cost),
                time_cost: env_parse("DIRECTORY_HASH_ITERATIONS")?
                    .unwrap_or(defaults.hashing.time_cost),
                parallelism: env_parse("DIRECTORY_HASH_PARALLELISM")?
                    .unwrap_or(defaults.hashing.parallelism),
            },
            min_password_length: env_parse("DIRECTORY_MIN_PASSWORD_LENGTH")?
                .unwrap_or(defaults.min_password_length),
            max_password_length: env_parse("DIRECTORY_MAX_PASSWORD_LENGTH")?
                .unwrap_or(defaults.max_password_length),
            request_timeout: env_parse::<u64>("DIRECTORY_REQUEST_TIMEOUT_MS")?
                .map(Duration::from_millis),
            bus_capacity: env_parse("DIRECTORY_BUS_CAPACITY")?.unwrap_or(defaults.bus_capacity),
            seed_file: env_string("DIRECTORY_SEED_FILE").map(PathBuf::from),
        })
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.base_delay, self.max_delay)
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.min_password_length,
            max_length: self.max_password_length,
        }
    }

    /// Build the credential engine described by this config
    pub fn credential_engine(&self) -> DirectoryResult<CredentialEngine> {
        let hasher = Argon2Hasher::new(self.hashing, self.password_pepper.clone())?;
        Ok(CredentialEngine::new(
            hasher,
            self.password_policy(),
            self.backoff(),
        ))
    }
}

/// Non-empty value of an environment variable
fn env_string(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        None => Ok(None),
        Some(value) => parse_value(name, &value).map(Some),
    }
}

fn parse_value<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DirectoryConfig::default();
        assert_eq!(config.base_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, None);
        assert_eq!(config.hashing, HashingParams::default());
        assert_eq!(config.password_policy(), PasswordPolicy::default());
        assert_eq!(config.bus_capacity, DEFAULT_BUS_CAPACITY);
        assert!(config.pepper().is_none());
    }

    #[test]
    fn test_backoff_from_config() {
        let config = DirectoryConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Some(Duration::from_millis(250)),
            ..Default::default()
        };
        let backoff = config.backoff();
        assert_eq!(backoff.delay_ms(1), 100);
        assert_eq!(backoff.delay_ms(2), 250);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u64>("X", " 750 ").unwrap(), 750);

        let err = parse_value::<u64>("DIRECTORY_BASE_DELAY_MS", "soon").unwrap_err();
        assert!(err.to_string().contains("DIRECTORY_BASE_DELAY_MS"));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_credential_engine_rejects_bad_params() {
        let config = DirectoryConfig {
            hashing: HashingParams {
                memory_cost: 0,
                time_cost: 0,
                parallelism: 0,
            },
            ..Default::default()
        };
        assert!(config.credential_engine().is_err());
    }

    #[test]
    fn test_development_engine() {
        let config = DirectoryConfig::development();
        assert!(config.credential_engine().is_ok());
    }
}

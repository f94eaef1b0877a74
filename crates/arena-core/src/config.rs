//! Configuration for the session registry
//!
//! Layering follows file → environment → validation: load a TOML file (or
//! start from defaults), apply `ARENA_*` overrides, then validate.

use crate::errors::{ArenaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How `start` treats a session that is already in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Re-starting an in-progress session is a successful no-op
    #[default]
    Tolerant,
    /// Re-starting an in-progress session is an invalid transition
    Strict,
}

/// Which states `end` may finish a session from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndPolicy {
    /// Only from `in_progress`
    #[default]
    Strict,
    /// From `waiting` or `in_progress`
    Lenient,
}

impl FromStr for StartPolicy {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "tolerant" => Ok(Self::Tolerant),
            "strict" => Ok(Self::Strict),
            other => Err(ArenaError::invalid(format!("unknown start policy '{other}'"))),
        }
    }
}

impl FromStr for EndPolicy {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(ArenaError::invalid(format!("unknown end policy '{other}'"))),
        }
    }
}

/// Registry tuning and transition policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Default deadline for one registry operation, in milliseconds
    pub operation_timeout_ms: u64,
    /// Commit attempts before a contended write surfaces `Conflict`
    pub max_commit_attempts: u32,
    /// Base back-off between commit attempts, in milliseconds
    pub retry_backoff_ms: u64,
    /// Upper bound accepted for `max_players` at creation
    pub max_capacity: u32,
    /// Behaviour of `start` on an in-progress session
    pub start_policy: StartPolicy,
    /// Source states accepted by `end`
    pub end_policy: EndPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 5_000,
            max_commit_attempts: 5,
            retry_backoff_ms: 10,
            max_capacity: 64,
            start_policy: StartPolicy::default(),
            end_policy: EndPolicy::default(),
        }
    }
}

impl RegistryConfig {
    /// Default operation deadline
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Base retry back-off
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.operation_timeout_ms == 0 {
            return Err(ArenaError::invalid(
                "registry.operation_timeout_ms must be greater than 0",
            ));
        }
        if self.max_commit_attempts == 0 {
            return Err(ArenaError::invalid(
                "registry.max_commit_attempts must be at least 1",
            ));
        }
        if self.max_capacity == 0 {
            return Err(ArenaError::invalid("registry.max_capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Logging settings for binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `arena_registry=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Registry settings
    pub registry: RegistryConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl ArenaConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ArenaError::invalid(format!("Invalid TOML: {e}")))
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArenaError::invalid(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `ARENA_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `ARENA_*` overrides from an explicit variable list
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix("ARENA_") else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "OPERATION_TIMEOUT_MS" => {
                    self.registry.operation_timeout_ms = parse_number(name, value)?;
                }
                "MAX_COMMIT_ATTEMPTS" => {
                    self.registry.max_commit_attempts = parse_number(name, value)?;
                }
                "RETRY_BACKOFF_MS" => self.registry.retry_backoff_ms = parse_number(name, value)?,
                "MAX_CAPACITY" => self.registry.max_capacity = parse_number(name, value)?,
                "START_POLICY" => self.registry.start_policy = value.parse()?,
                "END_POLICY" => self.registry.end_policy = value.parse()?,
                "LOG_LEVEL" => self.logging.level = value.to_string(),
                other => tracing::debug!(variable = other, "ignoring unknown ARENA_ variable"),
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ArenaError::invalid("logging.level must not be empty"));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ArenaError::invalid(format!("ARENA_{name} must be a number, got '{value}'")))
}

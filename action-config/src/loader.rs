//! Configuration loader implementations.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::schema::{ConfigError, ConfigResult, RegistryConfig};

/// Environment variable overriding the conflict policy (`replace` or `reject`).
pub const ENV_CONFLICT_POLICY: &str = "ACTIONKIT_CONFLICT_POLICY";
/// Environment variable toggling response validation (`true` or `false`).
pub const ENV_VALIDATE_RESPONSES: &str = "ACTIONKIT_VALIDATE_RESPONSES";

impl RegistryConfig {
    /// Parses a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] for invalid JSON, unknown keys, or
    /// values of the wrong type.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse; the error carries
    /// the file path.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading registry config `{}`", path.display()))?;
        let config = Self::from_json_str(&raw)
            .with_context(|| format!("parsing registry config `{}`", path.display()))?;
        debug!(path = %path.display(), ?config, "loaded registry config");
        Ok(config)
    }

    /// Builds a configuration from defaults overlaid with process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to an
    /// unrecognised value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_env()
    }

    /// Overlays process environment variables on this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to an
    /// unrecognised value.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    /// Overlays values from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a value is unrecognised.
    pub fn apply_lookup<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CONFLICT_POLICY) {
            let policy = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CONFLICT_POLICY.into(),
                value: raw.clone(),
                expected: "`replace` or `reject`",
            })?;
            self = self.with_conflict_policy(policy);
        }

        if let Some(raw) = lookup(ENV_VALIDATE_RESPONSES) {
            let enabled = parse_flag(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_VALIDATE_RESPONSES.into(),
                value: raw.clone(),
                expected: "a boolean (`true`/`false`/`1`/`0`)",
            })?;
            self = self.with_response_validation(enabled);
        }

        Ok(self)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

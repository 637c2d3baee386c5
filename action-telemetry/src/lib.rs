//! Observability utilities for action hosts.
//!
//! Libraries in this workspace only emit `tracing` events; binaries call
//! [`init`] or [`try_init`] once to install a formatter.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset and no default is supplied.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Builds the filter: `RUST_LOG` if present, otherwise `default_directive`.
///
/// # Errors
///
/// Returns an error when `default_directive` is not a valid filter.
pub fn env_filter(default_directive: Option<&str>) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = default_directive.unwrap_or(DEFAULT_DIRECTIVE);
    EnvFilter::try_new(directive).map_err(|err| anyhow!("invalid log directive `{directive}`: {err}"))
}

/// Installs a global fmt subscriber.
///
/// # Errors
///
/// Returns an error if the directive is invalid or a global subscriber is
/// already installed.
pub fn try_init(default_directive: Option<&str>) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive)?)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

/// Installs a global fmt subscriber, ignoring a subscriber that is already set.
pub fn init(default_directive: Option<&str>) {
    if let Err(err) = try_init(default_directive) {
        tracing::debug!(%err, "tracing already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_default_directive() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(env_filter(Some("action_tools=loud")).is_err());
        assert!(env_filter(Some("action_tools=debug")).is_ok());
    }

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        init(Some("warn"));
        assert!(try_init(Some("warn")).is_err());
    }
}

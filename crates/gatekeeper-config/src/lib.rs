// crates/gatekeeper-config/src/lib.rs
// ============================================================================
// Module: Gatekeeper Configuration
// Description: Environment-driven configuration loading for the gate and
// its HTTP/CLI surfaces.
// Purpose: Provide strict, fail-closed config parsing with no hidden
// defaults for security-relevant fields.
// Dependencies: std::env, gatekeeper-core, thiserror
// ============================================================================

//! ## Overview
//! Four environment variables drive every Gatekeeper surface: `MARKETOPS_PORT`,
//! `OMEGA_SDK_URL`, and the two optional signing inputs `MARKETOPS_FC_HMAC_KEY`
//! and `MARKETOPS_ED25519_PRIVATE_KEY_PATH`. Loading never invents a default
//! for a security-relevant field; a missing or malformed required variable
//! is a construction error, not a runtime panic or a silent fallback.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the TCP port `gatekeeper-http` binds to.
pub const PORT_VAR: &str = "MARKETOPS_PORT";
/// Environment variable naming the Governance SDK base URL.
pub const SDK_URL_VAR: &str = "OMEGA_SDK_URL";
/// Environment variable naming the optional fail-closed HMAC signing key.
pub const FC_HMAC_KEY_VAR: &str = "MARKETOPS_FC_HMAC_KEY";
/// Environment variable naming the optional Ed25519 private key file path.
pub const ED25519_KEY_PATH_VAR: &str = "MARKETOPS_ED25519_PRIVATE_KEY_PATH";

/// Minimum value considered a legal, non-privileged TCP port.
const MIN_PORT: u32 = 1;
/// Maximum value a `u16` port can hold.
const MAX_PORT: u32 = u16::MAX as u32;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised loading or validating Gatekeeper configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    /// `MARKETOPS_PORT` was set but is not a valid TCP port.
    #[error("{var} must be a TCP port between {min} and {max}, got {value:?}")]
    InvalidPort {
        /// The offending variable name.
        var: &'static str,
        /// The raw, unparsed value.
        value: String,
        /// Lower bound of the accepted range.
        min: u32,
        /// Upper bound of the accepted range.
        max: u32,
    },
    /// `OMEGA_SDK_URL` was set but is not an absolute `http(s)` URL.
    #[error("{var} must be an absolute http(s) URL, got {value:?}")]
    InvalidUrl {
        /// The offending variable name.
        var: &'static str,
        /// The raw, unparsed value.
        value: String,
    },
    /// `MARKETOPS_FC_HMAC_KEY` was set but empty.
    #[error("{0} must not be empty when set")]
    EmptySecret(&'static str),
}

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Fully validated Gatekeeper runtime configuration.
///
/// `Debug` intentionally omits the raw value of `fc_hmac_key` so
/// configuration cannot leak into logs or panic messages.
#[derive(Clone)]
pub struct GatekeeperConfig {
    /// TCP port `gatekeeper-http` binds to.
    pub port: u16,
    /// Governance SDK base URL, e.g. `https://omega.internal`.
    pub omega_sdk_url: String,
    /// Optional fail-closed HMAC signing key, read from
    /// [`FC_HMAC_KEY_VAR`]. Absent means fail-closed receipts are unsigned.
    pub fc_hmac_key: Option<String>,
    /// Optional path to an Ed25519 private key file, read from
    /// [`ED25519_KEY_PATH_VAR`]. Absent means a Proof Pack signing key is
    /// generated in memory for the process lifetime.
    pub ed25519_private_key_path: Option<PathBuf>,
}

impl fmt::Debug for GatekeeperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatekeeperConfig")
            .field("port", &self.port)
            .field("omega_sdk_url", &self.omega_sdk_url)
            .field("fc_hmac_key", &self.fc_hmac_key.as_ref().map(|_| "<redacted>"))
            .field("ed25519_private_key_path", &self.ed25519_private_key_path)
            .finish()
    }
}

impl GatekeeperConfig {
    /// Loads and validates configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `MARKETOPS_PORT` or `OMEGA_SDK_URL` is
    /// missing or malformed, or if an optional secret variable is set but
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port(&require_var(PORT_VAR)?)?;
        let omega_sdk_url = parse_url(&require_var(SDK_URL_VAR)?)?;
        let fc_hmac_key = optional_non_empty_var(FC_HMAC_KEY_VAR)?;
        let ed25519_private_key_path = optional_non_empty_var(ED25519_KEY_PATH_VAR)?.map(PathBuf::from);

        Ok(Self {
            port,
            omega_sdk_url,
            fc_hmac_key,
            ed25519_private_key_path,
        })
    }

    /// Builds a configuration directly, applying the same validation
    /// [`GatekeeperConfig::from_env`] applies, without touching the
    /// environment. Intended for tests and programmatic callers (e.g. the
    /// CLI's `--control-url` flag overriding `OMEGA_SDK_URL`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] under the same conditions as
    /// [`GatekeeperConfig::from_env`].
    pub fn new(
        port: u16,
        omega_sdk_url: impl Into<String>,
        fc_hmac_key: Option<String>,
        ed25519_private_key_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let omega_sdk_url = parse_url(&omega_sdk_url.into())?;
        if let Some(key) = &fc_hmac_key {
            if key.is_empty() {
                return Err(ConfigError::EmptySecret(FC_HMAC_KEY_VAR));
            }
        }
        Ok(Self {
            port,
            omega_sdk_url,
            fc_hmac_key,
            ed25519_private_key_path,
        })
    }
}

// ============================================================================
// SECTION: Parsing Helpers
// ============================================================================

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn optional_non_empty_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.is_empty() => Err(ConfigError::EmptySecret(name)),
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let invalid = || ConfigError::InvalidPort {
        var: PORT_VAR,
        value: raw.to_owned(),
        min: MIN_PORT,
        max: MAX_PORT,
    };
    let value: u32 = raw.trim().parse().map_err(|_| invalid())?;
    if value < MIN_PORT || value > MAX_PORT {
        return Err(invalid());
    }
    u16::try_from(value).map_err(|_| invalid())
}

fn parse_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let looks_absolute = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    if trimmed.is_empty() || !looks_absolute || trimmed.len() <= "https://".len() {
        return Err(ConfigError::InvalidUrl {
            var: SDK_URL_VAR,
            value: raw.to_owned(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_rejects_zero_and_overflow() {
        assert!(parse_port("0").is_err());
        assert!(parse_port("70000").is_err());
        assert!(parse_port("not-a-port").is_err());
        assert_eq!(parse_port("8080").expect("valid port"), 8080);
    }

    #[test]
    fn parse_url_requires_absolute_http_scheme() {
        assert!(parse_url("omega.internal").is_err());
        assert!(parse_url("ftp://omega.internal").is_err());
        assert_eq!(parse_url("https://omega.internal/").expect("valid url"), "https://omega.internal");
    }

    #[test]
    fn new_rejects_empty_hmac_key() {
        let result = GatekeeperConfig::new(8080, "https://omega.internal", Some(String::new()), None);
        assert!(matches!(result, Err(ConfigError::EmptySecret(FC_HMAC_KEY_VAR))));
    }

    #[test]
    fn new_accepts_minimal_config() {
        let config = GatekeeperConfig::new(8080, "https://omega.internal", None, None).expect("config");
        assert_eq!(config.port, 8080);
        assert!(config.fc_hmac_key.is_none());
        assert!(config.ed25519_private_key_path.is_none());
    }

    #[test]
    fn debug_redacts_hmac_key() {
        let config = GatekeeperConfig::new(8080, "https://omega.internal", Some("super-secret".to_owned()), None).expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

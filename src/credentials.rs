//! Credential resolution and the portable token codec.
//!
//! The host orchestrator hands credentials over either as a single opaque
//! token (a serialized `{apiKey, region}` pair produced by an earlier login)
//! or as the discrete `CIVO_API_KEY`/`CIVO_REGION` values. The resolved
//! [`Credentials`] value is immutable and passed explicitly to every caller
//! that needs it.

use serde::{Deserialize, Serialize};

use crate::config::{CivoConfig, ConfigError, require_value};

/// Validated API credential pair for the Civo API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Credentials {
    #[serde(rename = "apiKey")]
    api_key: String,
    region: String,
}

impl Credentials {
    /// Builds credentials from an already validated pair.
    #[must_use]
    pub fn new(api_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            region: region.into(),
        }
    }

    /// Resolves credentials from the provider configuration.
    ///
    /// A non-empty token takes precedence and its decoded fields are used
    /// verbatim, so a token's region is never mixed with a separately
    /// supplied API key or vice versa. Without a token both discrete values
    /// must be present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedToken`] when the token cannot be
    /// decoded and [`ConfigError::MissingVariable`] naming whichever discrete
    /// value is absent.
    pub fn resolve(config: &CivoConfig) -> Result<Self, ConfigError> {
        if let Some(token) = raw_token(config) {
            return Self::from_token(token);
        }

        let api_key = require_value(config.api_key.as_deref(), "CIVO_API_KEY")?;
        let region = require_value(config.region.as_deref(), "CIVO_REGION")?;
        Ok(Self { api_key, region })
    }

    /// Decodes a serialized token into credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedToken`] when the payload is not the
    /// expected JSON pair.
    pub fn from_token(token: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(token).map_err(|err| ConfigError::MalformedToken {
            message: err.to_string(),
        })
    }

    /// Serialises the credentials into the portable token representation.
    ///
    /// Round-trips with [`Credentials::from_token`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when serialisation fails.
    pub fn token(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Returns the portable token for the current configuration.
///
/// When the host already logged in via a token it is forwarded verbatim so
/// its exact representation survives; otherwise the discrete pair is
/// serialised into a fresh token.
///
/// # Errors
///
/// Returns [`ConfigError::MissingVariable`] when neither a token nor the
/// discrete pair is available.
pub fn access_token(config: &CivoConfig) -> Result<String, ConfigError> {
    if let Some(token) = raw_token(config) {
        return Ok(token.to_owned());
    }
    Credentials::resolve(config)?.token()
}

fn raw_token(config: &CivoConfig) -> Option<&str> {
    config
        .token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

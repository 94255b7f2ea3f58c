//! Configuration loading via `ortho-config`.
//!
//! Provider-level values arrive through the `CIVO_*` namespace and merge the
//! usual ortho-config sources. Per-invocation values (`MACHINE_ID`,
//! `MACHINE_FOLDER`) are injected by the host orchestrator outside that
//! namespace and are captured directly from the process environment.

use std::env;
use std::ffi::OsString;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Prefix applied to the raw machine identifier to form the remote identity.
pub const MACHINE_ID_PREFIX: &str = "devpod-";

/// Civo provider configuration derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Default, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "CIVO")]
pub struct CivoConfig {
    /// Serialized credential token. Takes precedence over the discrete
    /// API key and region values when present.
    pub token: Option<String>,
    /// API key used to authenticate against the Civo API.
    pub api_key: Option<String>,
    /// Region the workspace resources live in (for example `lon1`).
    pub region: Option<String>,
    /// Commercial size for new instances (for example `g3.small`).
    pub instance_type: Option<String>,
    /// Disk image used to boot new instances.
    pub disk_image: Option<String>,
    /// Size of the persistent volume in gigabytes. Zero or absent means the
    /// machine runs without a separate volume.
    pub disk_size: Option<u32>,
}

impl CivoConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("devpod-civo")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

/// Host-supplied per-invocation values passed outside the `CIVO_*` namespace.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MachineEnv {
    /// Raw machine identifier from `MACHINE_ID`.
    pub machine_id: Option<String>,
    /// Local machine folder path from `MACHINE_FOLDER`.
    pub machine_folder: Option<String>,
}

impl MachineEnv {
    /// Captures `MACHINE_ID` and `MACHINE_FOLDER` from the process
    /// environment, treating empty values as absent.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            machine_id: env_non_empty("MACHINE_ID"),
            machine_folder: env_non_empty("MACHINE_FOLDER"),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Validation mode for [`ProviderOptions::resolve`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionsMode {
    /// Validate credentials and provider defaults only; no machine scoping.
    Init,
    /// Machine-scoped operation that never touches the local key pair.
    Operate,
    /// Machine-scoped operation that reads the local key pair, so the
    /// machine folder must be known.
    OperateWithKeys,
}

impl OptionsMode {
    const fn requires_machine(self) -> bool {
        !matches!(self, Self::Init)
    }

    const fn requires_machine_folder(self) -> bool {
        matches!(self, Self::OperateWithKeys)
    }
}

/// Resolved, immutable options for a single provider invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProviderOptions {
    /// Commercial size for new instances.
    pub machine_type: String,
    /// Disk image used to boot new instances.
    pub disk_image: String,
    /// Persistent volume size in gigabytes; zero disables the volume.
    pub disk_size_gb: u32,
    /// Region the resources live in.
    pub region: String,
    /// Remote machine identity (`devpod-` prefixed). Absent in init mode.
    pub machine_id: Option<String>,
    /// Local machine folder holding the SSH key pair, when known.
    pub machine_folder: Option<Utf8PathBuf>,
}

impl ProviderOptions {
    /// Resolves the options required by the requested operation mode.
    ///
    /// Validation is fail-fast: the first missing variable is reported by
    /// name and no further fields are checked. The region is taken from the
    /// already validated credentials so a token's region is never mixed with
    /// a separately supplied one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] naming the first variable
    /// that is absent or empty.
    pub fn resolve(
        config: &CivoConfig,
        credentials: &crate::credentials::Credentials,
        mode: OptionsMode,
        machine: &MachineEnv,
    ) -> Result<Self, ConfigError> {
        let machine_type = require_value(config.instance_type.as_deref(), "CIVO_INSTANCE_TYPE")?;
        let disk_image = require_value(config.disk_image.as_deref(), "CIVO_DISK_IMAGE")?;
        let disk_size_gb = config.disk_size.unwrap_or(0);
        let region = credentials.region().to_owned();

        if !mode.requires_machine() {
            return Ok(Self {
                machine_type,
                disk_image,
                disk_size_gb,
                region,
                machine_id: None,
                machine_folder: None,
            });
        }

        let raw_id = require_value(machine.machine_id.as_deref(), "MACHINE_ID")?;
        let machine_id = Some(format!("{MACHINE_ID_PREFIX}{raw_id}"));
        let machine_folder = if mode.requires_machine_folder() {
            Some(Utf8PathBuf::from(require_value(
                machine.machine_folder.as_deref(),
                "MACHINE_FOLDER",
            )?))
        } else {
            machine.machine_folder.clone().map(Utf8PathBuf::from)
        };

        Ok(Self {
            machine_type,
            disk_image,
            disk_size_gb,
            region,
            machine_id,
            machine_folder,
        })
    }
}

/// Requires a non-empty value, reporting the owning variable name otherwise.
pub(crate) fn require_value(
    value: Option<&str>,
    name: &'static str,
) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::MissingVariable { name })
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required environment variable is absent or empty.
    #[error("couldn't find option {name} in environment, please make sure {name} is defined")]
    MissingVariable {
        /// Name of the missing variable.
        name: &'static str,
    },
    /// Raised when `CIVO_TOKEN` cannot be decoded.
    #[error("CIVO_TOKEN is malformed: {message}")]
    MalformedToken {
        /// Underlying decode failure.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;

    fn full_config() -> CivoConfig {
        CivoConfig {
            token: None,
            api_key: Some(String::from("key")),
            region: Some(String::from("lon1")),
            instance_type: Some(String::from("g3.small")),
            disk_image: Some(String::from("ubuntu-20.04")),
            disk_size: Some(20),
        }
    }

    fn machine_env() -> MachineEnv {
        MachineEnv {
            machine_id: Some(String::from("abc123")),
            machine_folder: Some(String::from("/tmp/machine")),
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("key", "lon1")
    }

    #[test]
    fn resolve_prefixes_the_machine_identifier() {
        let options = ProviderOptions::resolve(
            &full_config(),
            &credentials(),
            OptionsMode::Operate,
            &machine_env(),
        )
        .unwrap_or_else(|err| panic!("resolve should succeed: {err}"));

        assert_eq!(options.machine_id.as_deref(), Some("devpod-abc123"));
        assert_eq!(options.machine_type, "g3.small");
        assert_eq!(options.disk_image, "ubuntu-20.04");
        assert_eq!(options.disk_size_gb, 20);
        assert_eq!(options.region, "lon1");
    }

    #[test]
    fn resolve_reports_the_first_missing_variable() {
        let config = CivoConfig {
            instance_type: None,
            disk_image: None,
            ..full_config()
        };
        let empty_machine = MachineEnv::default();

        let err = ProviderOptions::resolve(
            &config,
            &credentials(),
            OptionsMode::Operate,
            &empty_machine,
        )
        .expect_err("resolution should fail");

        assert_eq!(
            err,
            ConfigError::MissingVariable {
                name: "CIVO_INSTANCE_TYPE"
            }
        );
    }

    #[test]
    fn resolve_in_init_mode_ignores_machine_values() {
        let options = ProviderOptions::resolve(
            &full_config(),
            &credentials(),
            OptionsMode::Init,
            &MachineEnv::default(),
        )
        .unwrap_or_else(|err| panic!("init mode needs no machine values: {err}"));

        assert_eq!(options.machine_id, None);
        assert_eq!(options.machine_folder, None);
    }

    #[test]
    fn resolve_requires_machine_id_in_operate_mode() {
        let err = ProviderOptions::resolve(
            &full_config(),
            &credentials(),
            OptionsMode::Operate,
            &MachineEnv::default(),
        )
        .expect_err("operate mode requires a machine id");

        assert_eq!(err, ConfigError::MissingVariable { name: "MACHINE_ID" });
    }

    #[test]
    fn resolve_requires_machine_folder_only_for_key_operations() {
        let machine = MachineEnv {
            machine_id: Some(String::from("abc123")),
            machine_folder: None,
        };

        let options =
            ProviderOptions::resolve(&full_config(), &credentials(), OptionsMode::Operate, &machine)
                .unwrap_or_else(|err| panic!("operate mode tolerates a missing folder: {err}"));
        assert_eq!(options.machine_folder, None);

        let err = ProviderOptions::resolve(
            &full_config(),
            &credentials(),
            OptionsMode::OperateWithKeys,
            &machine,
        )
        .expect_err("key operations require the machine folder");
        assert_eq!(
            err,
            ConfigError::MissingVariable {
                name: "MACHINE_FOLDER"
            }
        );
    }

    #[test]
    fn resolve_defaults_disk_size_to_zero() {
        let config = CivoConfig {
            disk_size: None,
            ..full_config()
        };

        let options = ProviderOptions::resolve(
            &config,
            &credentials(),
            OptionsMode::Operate,
            &machine_env(),
        )
        .unwrap_or_else(|err| panic!("resolve should succeed: {err}"));

        assert_eq!(options.disk_size_gb, 0);
    }

    #[test]
    fn require_value_rejects_whitespace() {
        let err = require_value(Some("   "), "CIVO_REGION").expect_err("whitespace is empty");
        assert_eq!(err, ConfigError::MissingVariable { name: "CIVO_REGION" });
    }
}

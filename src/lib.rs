//! Core library for the DevPod Civo machine provider.
//!
//! The crate exposes the instance+volume lifecycle reconciler that powers the
//! `devpod-civo` binary, the narrow gateway capability it converges through,
//! and the supporting resolvers for configuration, credentials, bootstrap
//! user-data, and remote command execution. Each binary invocation performs
//! exactly one lifecycle operation and discovers remote state from scratch.

pub mod bootstrap;
pub mod civo;
pub mod config;
pub mod credentials;
pub mod gateway;
pub mod keypair;
pub mod reconciler;
pub mod remote;
pub mod test_support;

pub use bootstrap::{BOOTSTRAP_HOME, BOOTSTRAP_USER, build_bootstrap_script, volume_device_path};
pub use civo::{CivoApi, CivoApiError};
pub use config::{
    CivoConfig, ConfigError, MACHINE_ID_PREFIX, MachineEnv, OptionsMode, ProviderOptions,
};
pub use credentials::{Credentials, access_token};
pub use gateway::{
    Gateway, GatewayFuture, Instance, InstanceSpec, Network, Volume, VolumeSpec,
};
pub use keypair::KeypairError;
pub use reconciler::{LifecycleReconciler, MachineStatus, ReconcileError};
pub use remote::{CommandRunner, RemoteError, RemoteSession, StreamingCommandRunner};

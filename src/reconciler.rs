//! Instance and volume lifecycle reconciliation.
//!
//! Each provider invocation observes the remote state afresh and converges it
//! toward the requested operation: create-or-start, delete-or-stop, or a pure
//! status derivation. No state survives between invocations; the remote
//! gateway is the only source of truth. Every remote mutation is attempted
//! once, so a failure after a prior successful mutation is surfaced for the
//! caller to resolve by re-invoking delete or create.

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::bootstrap::build_bootstrap_script;
use crate::config::{ConfigError, ProviderOptions};
use crate::gateway::{Gateway, Instance, InstanceSpec, Volume, VolumeSpec};

/// Instance status string reported by the gateway for a running machine.
const STATUS_ACTIVE: &str = "ACTIVE";
/// Instance status string reported by the gateway for a powered-off machine.
const STATUS_SHUTOFF: &str = "SHUTOFF";

/// Observed machine status reported to the host orchestrator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MachineStatus {
    /// The instance exists and is `ACTIVE`.
    Running,
    /// The instance is `SHUTOFF`, or only its volume survives.
    Stopped,
    /// The instance is in a transitional state.
    Busy,
    /// Neither the instance nor its volume exists.
    NotFound,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Busy => "Busy",
            Self::NotFound => "NotFound",
        })
    }
}

/// Errors raised while reconciling remote state.
#[derive(Debug, Error)]
pub enum ReconcileError<E>
where
    E: std::error::Error + 'static,
{
    /// Raised when an operation requires an instance that does not exist.
    #[error("instance {machine_id} not found")]
    InstanceNotFound {
        /// Identity the lookup was performed with.
        machine_id: String,
    },
    /// Raised when an operation requires a volume that does not exist.
    #[error("volume {name} not found")]
    VolumeNotFound {
        /// Identity the lookup was performed with.
        name: String,
    },
    /// Wrapper for gateway failures, propagated verbatim and never retried.
    #[error("provider request failed: {0}")]
    Gateway(#[source] E),
}

/// Reconciles one machine identity against the remote gateway.
#[derive(Clone, Debug)]
pub struct LifecycleReconciler<G: Gateway> {
    gateway: G,
    options: ProviderOptions,
    machine_id: String,
}

impl<G: Gateway> LifecycleReconciler<G> {
    /// Creates a reconciler for the machine identified by the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when the options carry no
    /// machine identity (they were resolved in init mode).
    pub fn new(gateway: G, options: ProviderOptions) -> Result<Self, ConfigError> {
        let machine_id = options
            .machine_id
            .clone()
            .ok_or(ConfigError::MissingVariable { name: "MACHINE_ID" })?;
        Ok(Self {
            gateway,
            options,
            machine_id,
        })
    }

    /// Returns the resolved options this reconciler operates with.
    #[must_use]
    pub const fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// Returns the machine identity used for remote lookups.
    #[must_use]
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// Creates the instance, provisioning and attaching a fresh volume when
    /// the configured disk size asks for one.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::VolumeNotFound`] when the provisioned volume
    /// cannot be fetched back, or [`ReconcileError::Gateway`] for provider
    /// failures. An attach failure leaves the created instance in place.
    pub async fn create(&self, public_key: &str) -> Result<Instance, ReconcileError<G::Error>> {
        self.create_or_start(public_key, false).await
    }

    /// Recreates the instance around its previously provisioned volume.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::VolumeNotFound`] when no volume survives a
    /// prior stop, or [`ReconcileError::Gateway`] for provider failures.
    pub async fn start(&self, public_key: &str) -> Result<Instance, ReconcileError<G::Error>> {
        self.create_or_start(public_key, true).await
    }

    /// Tears the instance down while keeping the volume for a later start.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InstanceNotFound`] when there is nothing to
    /// stop, or [`ReconcileError::Gateway`] for provider failures.
    pub async fn stop(&self) -> Result<(), ReconcileError<G::Error>> {
        self.delete_or_stop(true).await
    }

    /// Deletes the instance and, when the configuration carries a volume,
    /// the volume as well.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InstanceNotFound`] when there is nothing to
    /// delete, [`ReconcileError::VolumeNotFound`] when the expected volume is
    /// already gone, or [`ReconcileError::Gateway`] for provider failures.
    pub async fn delete(&self) -> Result<(), ReconcileError<G::Error>> {
        self.delete_or_stop(false).await
    }

    async fn create_or_start(
        &self,
        public_key: &str,
        is_start: bool,
    ) -> Result<Instance, ReconcileError<G::Error>> {
        let volume = if is_start {
            // Starting reuses the volume a previous stop left behind.
            Some(self.require_volume().await?)
        } else if self.wants_volume() {
            Some(self.provision_volume().await?)
        } else {
            None
        };

        let spec = InstanceSpec {
            hostname: self.machine_id.clone(),
            size: self.options.machine_type.clone(),
            region: self.options.region.clone(),
            disk_image: self.options.disk_image.clone(),
            count: 1,
            public_ip_required: true,
            script: build_bootstrap_script(public_key, volume.as_ref()),
        };
        let instance = self
            .gateway
            .create_instance(&spec)
            .await
            .map_err(ReconcileError::Gateway)?;
        info!(
            machine_id = %self.machine_id,
            instance_id = %instance.id,
            "created instance"
        );

        if let Some(volume) = volume {
            self.gateway
                .attach_volume(&volume.id, &instance.id)
                .await
                .map_err(ReconcileError::Gateway)?;
            info!(
                volume_id = %volume.id,
                instance_id = %instance.id,
                "attached volume"
            );
        }

        Ok(instance)
    }

    /// Provisions a new volume scoped to the default network, then re-fetches
    /// it by identity.
    ///
    /// Creation and fetch stay two separate calls: the provider may accept
    /// the request without returning a fully populated volume record.
    async fn provision_volume(&self) -> Result<Volume, ReconcileError<G::Error>> {
        let network = self
            .gateway
            .default_network()
            .await
            .map_err(ReconcileError::Gateway)?;
        let spec = VolumeSpec {
            name: self.machine_id.clone(),
            size_gb: self.options.disk_size_gb,
            network_id: network.id,
        };
        self.gateway
            .create_volume(&spec)
            .await
            .map_err(ReconcileError::Gateway)?;
        info!(name = %spec.name, size_gb = spec.size_gb, "created volume");

        self.require_volume().await
    }

    async fn delete_or_stop(&self, stop: bool) -> Result<(), ReconcileError<G::Error>> {
        let instance = self.resolve_instance().await?;
        self.gateway
            .delete_instance(&instance.id)
            .await
            .map_err(ReconcileError::Gateway)?;
        info!(
            machine_id = %self.machine_id,
            instance_id = %instance.id,
            stop,
            "deleted instance"
        );

        if !stop && self.wants_volume() {
            let volume = self.require_volume().await?;
            self.gateway
                .delete_volume(&volume.id)
                .await
                .map_err(ReconcileError::Gateway)?;
            info!(volume_id = %volume.id, "deleted volume");
        }

        Ok(())
    }

    /// Derives the machine status from the observed instance/volume pair
    /// without mutating anything.
    ///
    /// A surviving volume distinguishes a stopped machine from one that was
    /// never created; without a configured volume, instance absence means
    /// not-found directly.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Gateway`] when a lookup itself fails.
    pub async fn status(&self) -> Result<MachineStatus, ReconcileError<G::Error>> {
        let instance = self
            .gateway
            .find_instance(&self.machine_id)
            .await
            .map_err(ReconcileError::Gateway)?;
        if let Some(instance) = instance {
            return Ok(match instance.status.as_str() {
                STATUS_ACTIVE => MachineStatus::Running,
                STATUS_SHUTOFF => MachineStatus::Stopped,
                _ => MachineStatus::Busy,
            });
        }

        if self.wants_volume() {
            let volume = self
                .gateway
                .find_volume(&self.machine_id)
                .await
                .map_err(ReconcileError::Gateway)?;
            if volume.is_some() {
                return Ok(MachineStatus::Stopped);
            }
        }

        Ok(MachineStatus::NotFound)
    }

    /// Resolves the instance by identity, treating absence as fatal.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InstanceNotFound`] when no instance answers
    /// to the machine identity.
    pub async fn resolve_instance(&self) -> Result<Instance, ReconcileError<G::Error>> {
        self.gateway
            .find_instance(&self.machine_id)
            .await
            .map_err(ReconcileError::Gateway)?
            .ok_or_else(|| ReconcileError::InstanceNotFound {
                machine_id: self.machine_id.clone(),
            })
    }

    async fn require_volume(&self) -> Result<Volume, ReconcileError<G::Error>> {
        self.gateway
            .find_volume(&self.machine_id)
            .await
            .map_err(ReconcileError::Gateway)?
            .ok_or_else(|| ReconcileError::VolumeNotFound {
                name: self.machine_id.clone(),
            })
    }

    const fn wants_volume(&self) -> bool {
        self.options.disk_size_gb > 0
    }
}

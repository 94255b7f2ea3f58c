//! Gateway abstraction over the remote compute and storage API.
//!
//! The reconciler never talks to the provider directly; it converges through
//! this narrow capability so tests can simulate not-found, transitional, and
//! failure-after-partial-success conditions without a network dependency.

use std::future::Future;
use std::pin::Pin;

/// A remote virtual machine resource as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instance {
    /// Provider-assigned identifier.
    pub id: String,
    /// Hostname the instance was created under (the machine identity).
    pub hostname: String,
    /// Public IPv4 address, once one has been assigned.
    pub public_ip: Option<String>,
    /// Raw status string: `ACTIVE`, `SHUTOFF`, or a transitional state.
    pub status: String,
}

/// A remote persistent block-storage resource, independently lifecycled from
/// its instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Volume {
    /// Provider-assigned identifier.
    pub id: String,
    /// Name the volume was created under (the machine identity).
    pub name: String,
    /// Size in gigabytes.
    pub size_gb: u32,
    /// Network the volume is scoped to.
    pub network_id: String,
}

/// A provider network; new volumes are scoped to the region's default one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Network {
    /// Provider-assigned identifier.
    pub id: String,
}

/// Parameters for creating a new instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSpec {
    /// Requested hostname; doubles as the lookup identity.
    pub hostname: String,
    /// Commercial size of the instance.
    pub size: String,
    /// Region to create the instance in.
    pub region: String,
    /// Disk image to boot from.
    pub disk_image: String,
    /// Number of instances to create; always one for a workspace.
    pub count: u32,
    /// Whether the instance must receive a public IP.
    pub public_ip_required: bool,
    /// Cloud-init user-data script executed on first boot.
    pub script: String,
}

/// Parameters for creating a new volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeSpec {
    /// Requested name; doubles as the lookup identity.
    pub name: String,
    /// Size in gigabytes.
    pub size_gb: u32,
    /// Network the volume is scoped to.
    pub network_id: String,
}

/// Future returned by gateway operations.
pub type GatewayFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Remote resource operations consumed by the reconciler.
///
/// Lookups return `Ok(None)` when the object does not exist so callers can
/// treat absence as a signal rather than an error.
pub trait Gateway {
    /// Provider specific error type returned by the gateway.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up an instance by its hostname identity.
    fn find_instance<'a>(
        &'a self,
        name: &'a str,
    ) -> GatewayFuture<'a, Option<Instance>, Self::Error>;

    /// Creates a new instance and returns the provider's record of it.
    fn create_instance<'a>(
        &'a self,
        spec: &'a InstanceSpec,
    ) -> GatewayFuture<'a, Instance, Self::Error>;

    /// Powers on an existing instance.
    fn start_instance<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error>;

    /// Powers off an existing instance.
    fn stop_instance<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error>;

    /// Deletes an instance.
    fn delete_instance<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error>;

    /// Looks up a volume by its name identity.
    fn find_volume<'a>(&'a self, name: &'a str) -> GatewayFuture<'a, Option<Volume>, Self::Error>;

    /// Requests creation of a new volume.
    ///
    /// The creation response may be a partial record; callers re-fetch the
    /// volume by identity to observe its assigned id.
    fn create_volume<'a>(&'a self, spec: &'a VolumeSpec) -> GatewayFuture<'a, (), Self::Error>;

    /// Attaches a volume to an instance. Both ids must already be known.
    fn attach_volume<'a>(
        &'a self,
        volume_id: &'a str,
        instance_id: &'a str,
    ) -> GatewayFuture<'a, (), Self::Error>;

    /// Deletes a volume.
    fn delete_volume<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error>;

    /// Returns the region's default network.
    fn default_network(&self) -> GatewayFuture<'_, Network, Self::Error>;
}

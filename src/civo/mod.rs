//! Civo implementation of the remote resource gateway.
//!
//! Civo has no maintained Rust SDK, so the client speaks to the v2 REST
//! endpoints directly over `reqwest`. Every call authenticates with the
//! bearer API key and is scoped to the credential's region.

mod error;
mod instances;
mod networks;
mod volumes;

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::credentials::Credentials;
use crate::gateway::{Gateway, GatewayFuture, Instance, InstanceSpec, Network, Volume, VolumeSpec};

pub use error::CivoApiError;

const CIVO_API_BASE: &str = "https://api.civo.com/v2";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Civo v2 REST API.
#[derive(Clone, Debug)]
pub struct CivoApi {
    client: reqwest::Client,
    api_key: String,
    region: String,
    base_url: String,
}

impl CivoApi {
    /// Constructs a client from validated credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_key: credentials.api_key().to_owned(),
            region: credentials.region().to_owned(),
            base_url: String::from(CIVO_API_BASE),
        }
    }

    /// Overrides the API base URL; used by tests against a local server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the region every call is scoped to.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Consumes a response, surfacing non-success bodies verbatim.
    async fn expect_success(response: reqwest::Response) -> Result<Vec<u8>, CivoApiError> {
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(body.to_vec());
        }
        Err(CivoApiError::Api {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, CivoApiError> {
        serde_json::from_slice(body).map_err(|err| CivoApiError::Decode {
            message: err.to_string(),
        })
    }
}

impl Gateway for CivoApi {
    type Error = CivoApiError;

    fn find_instance<'a>(
        &'a self,
        name: &'a str,
    ) -> GatewayFuture<'a, Option<Instance>, Self::Error> {
        Box::pin(async move { self.find_instance_by_hostname(name).await })
    }

    fn create_instance<'a>(
        &'a self,
        spec: &'a InstanceSpec,
    ) -> GatewayFuture<'a, Instance, Self::Error> {
        Box::pin(async move { self.create_instance_from_spec(spec).await })
    }

    fn start_instance<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error> {
        Box::pin(async move { self.instance_action(id, "start").await })
    }

    fn stop_instance<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error> {
        Box::pin(async move { self.instance_action(id, "stop").await })
    }

    fn delete_instance<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_instance_by_id(id).await })
    }

    fn find_volume<'a>(&'a self, name: &'a str) -> GatewayFuture<'a, Option<Volume>, Self::Error> {
        Box::pin(async move { self.find_volume_by_name(name).await })
    }

    fn create_volume<'a>(&'a self, spec: &'a VolumeSpec) -> GatewayFuture<'a, (), Self::Error> {
        Box::pin(async move { self.create_volume_from_spec(spec).await })
    }

    fn attach_volume<'a>(
        &'a self,
        volume_id: &'a str,
        instance_id: &'a str,
    ) -> GatewayFuture<'a, (), Self::Error> {
        Box::pin(async move { self.attach_volume_to_instance(volume_id, instance_id).await })
    }

    fn delete_volume<'a>(&'a self, id: &'a str) -> GatewayFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete_volume_by_id(id).await })
    }

    fn default_network(&self) -> GatewayFuture<'_, Network, Self::Error> {
        Box::pin(async move { self.find_default_network().await })
    }
}

//! Instance operations against the Civo API.

use serde::{Deserialize, Serialize};

use crate::gateway::{Instance, InstanceSpec};

use super::{CivoApi, CivoApiError};

/// Paginated instance listing as returned by `GET /v2/instances`.
#[derive(Debug, Deserialize)]
struct InstanceList {
    items: Vec<CivoInstance>,
}

#[derive(Debug, Deserialize)]
struct CivoInstance {
    id: String,
    hostname: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    public_ip: Option<String>,
}

impl From<CivoInstance> for Instance {
    fn from(value: CivoInstance) -> Self {
        Self {
            id: value.id,
            hostname: value.hostname,
            public_ip: value.public_ip.filter(|ip| !ip.is_empty()),
            status: value.status,
        }
    }
}

/// Request body for `POST /v2/instances`. The API expects booleans for the
/// public IP flag as the string values `"true"`/`"false"`.
#[derive(Debug, Serialize)]
struct CreateInstanceBody<'a> {
    hostname: &'a str,
    size: &'a str,
    region: &'a str,
    disk_image: &'a str,
    count: u32,
    public_ip_required: &'static str,
    script: &'a str,
}

impl<'a> CreateInstanceBody<'a> {
    fn from_spec(spec: &'a InstanceSpec) -> Self {
        Self {
            hostname: &spec.hostname,
            size: &spec.size,
            region: &spec.region,
            disk_image: &spec.disk_image,
            count: spec.count,
            public_ip_required: if spec.public_ip_required {
                "true"
            } else {
                "false"
            },
            script: &spec.script,
        }
    }
}

impl CivoApi {
    pub(super) async fn find_instance_by_hostname(
        &self,
        name: &str,
    ) -> Result<Option<Instance>, CivoApiError> {
        let response = self
            .client
            .get(self.url("instances"))
            .query(&[("region", self.region.as_str()), ("per_page", "200")])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = Self::expect_success(response).await?;
        let list: InstanceList = Self::decode(&body)?;

        Ok(list
            .items
            .into_iter()
            .find(|item| item.hostname == name)
            .map(Instance::from))
    }

    pub(super) async fn create_instance_from_spec(
        &self,
        spec: &InstanceSpec,
    ) -> Result<Instance, CivoApiError> {
        let response = self
            .client
            .post(self.url("instances"))
            .bearer_auth(&self.api_key)
            .json(&CreateInstanceBody::from_spec(spec))
            .send()
            .await?;
        let body = Self::expect_success(response).await?;
        let created: CivoInstance = Self::decode(&body)?;
        Ok(created.into())
    }

    pub(super) async fn instance_action(&self, id: &str, action: &str) -> Result<(), CivoApiError> {
        let response = self
            .client
            .put(self.url(&format!("instances/{id}/{action}")))
            .query(&[("region", self.region.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    pub(super) async fn delete_instance_by_id(&self, id: &str) -> Result<(), CivoApiError> {
        let response = self
            .client
            .delete(self.url(&format!("instances/{id}")))
            .query(&[("region", self.region.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }
}

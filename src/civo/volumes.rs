//! Volume operations against the Civo API.

use serde::{Deserialize, Serialize};

use crate::gateway::{Volume, VolumeSpec};

use super::{CivoApi, CivoApiError};

// `GET /v2/volumes` returns a bare array rather than a paginated wrapper.
#[derive(Debug, Deserialize)]
struct CivoVolume {
    id: String,
    name: String,
    #[serde(default)]
    size_gb: u32,
    #[serde(default)]
    network_id: String,
}

impl From<CivoVolume> for Volume {
    fn from(value: CivoVolume) -> Self {
        Self {
            id: value.id,
            name: value.name,
            size_gb: value.size_gb,
            network_id: value.network_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateVolumeBody<'a> {
    name: &'a str,
    size_gb: u32,
    network_id: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct AttachVolumeBody<'a> {
    instance_id: &'a str,
    region: &'a str,
}

impl CivoApi {
    pub(super) async fn find_volume_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Volume>, CivoApiError> {
        let response = self
            .client
            .get(self.url("volumes"))
            .query(&[("region", self.region.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = Self::expect_success(response).await?;
        let volumes: Vec<CivoVolume> = Self::decode(&body)?;

        Ok(volumes
            .into_iter()
            .find(|volume| volume.name == name)
            .map(Volume::from))
    }

    /// Requests volume creation; the response body is discarded because the
    /// API acknowledges with a thin result record rather than the full
    /// volume. Callers re-fetch by name to observe the assigned id.
    pub(super) async fn create_volume_from_spec(
        &self,
        spec: &VolumeSpec,
    ) -> Result<(), CivoApiError> {
        let body = CreateVolumeBody {
            name: &spec.name,
            size_gb: spec.size_gb,
            network_id: &spec.network_id,
            region: &self.region,
        };
        let response = self
            .client
            .post(self.url("volumes"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    pub(super) async fn attach_volume_to_instance(
        &self,
        volume_id: &str,
        instance_id: &str,
    ) -> Result<(), CivoApiError> {
        let body = AttachVolumeBody {
            instance_id,
            region: &self.region,
        };
        let response = self
            .client
            .put(self.url(&format!("volumes/{volume_id}/attach")))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    pub(super) async fn delete_volume_by_id(&self, id: &str) -> Result<(), CivoApiError> {
        let response = self
            .client
            .delete(self.url(&format!("volumes/{id}")))
            .query(&[("region", self.region.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_list_decodes_the_bare_array() {
        let body = br#"[
            {"id": "vol-1", "name": "devpod-abc123", "size_gb": 20, "network_id": "net-1"},
            {"id": "vol-2", "name": "other"}
        ]"#;

        let volumes: Vec<CivoVolume> =
            CivoApi::decode(body).unwrap_or_else(|err| panic!("decode: {err}"));
        assert_eq!(volumes.len(), 2);

        let first = Volume::from(
            volumes
                .into_iter()
                .next()
                .unwrap_or_else(|| panic!("missing volume")),
        );
        assert_eq!(first.id, "vol-1");
        assert_eq!(first.name, "devpod-abc123");
        assert_eq!(first.size_gb, 20);
        assert_eq!(first.network_id, "net-1");
    }

    #[test]
    fn create_body_serialises_the_wire_shape() {
        let body = CreateVolumeBody {
            name: "devpod-abc123",
            size_gb: 20,
            network_id: "net-1",
            region: "lon1",
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|err| panic!("serialise: {err}"));
        assert_eq!(
            json,
            r#"{"name":"devpod-abc123","size_gb":20,"network_id":"net-1","region":"lon1"}"#
        );
    }

    #[test]
    fn attach_body_carries_instance_and_region() {
        let body = AttachVolumeBody {
            instance_id: "inst-1",
            region: "lon1",
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|err| panic!("serialise: {err}"));
        assert_eq!(json, r#"{"instance_id":"inst-1","region":"lon1"}"#);
    }
}

//! Network lookups against the Civo API.

use serde::Deserialize;

use crate::gateway::Network;

use super::{CivoApi, CivoApiError};

#[derive(Debug, Deserialize)]
struct CivoNetwork {
    id: String,
    #[serde(default)]
    default: bool,
}

impl CivoApi {
    /// Finds the region's default network, which scopes new volumes.
    pub(super) async fn find_default_network(&self) -> Result<Network, CivoApiError> {
        let response = self
            .client
            .get(self.url("networks"))
            .query(&[("region", self.region.as_str())])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = Self::expect_success(response).await?;
        let networks: Vec<CivoNetwork> = Self::decode(&body)?;

        networks
            .into_iter()
            .find(|network| network.default)
            .map(|network| Network { id: network.id })
            .ok_or_else(|| CivoApiError::DefaultNetworkMissing {
                region: self.region.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_list_decodes_the_default_flag() {
        let body = br#"[
            {"id": "net-1", "name": "custom", "default": false},
            {"id": "net-2", "name": "default", "default": true}
        ]"#;

        let networks: Vec<CivoNetwork> =
            CivoApi::decode(body).unwrap_or_else(|err| panic!("decode: {err}"));
        let default = networks
            .into_iter()
            .find(|network| network.default)
            .unwrap_or_else(|| panic!("missing default network"));
        assert_eq!(default.id, "net-2");
    }
}

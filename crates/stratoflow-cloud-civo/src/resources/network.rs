//! `civo_network`: private networks

use super::{delete_when_free, fetch, non_empty, region_attribute, scoped};
use crate::client::CivoClient;
use crate::models::{CreateNetworkRequest, Network, SimpleResponse, UpdateNetworkRequest};
use async_trait::async_trait;
use std::sync::Arc;
use stratoflow_cloud::validation::cidr_v4;
use stratoflow_cloud::{Attribute, AttributeType, Resource, ResourceData, Result, Schema};
use stratoflow_core::Operation;
use tracing::info;

pub struct NetworkResource {
    client: Arc<CivoClient>,
}

impl NetworkResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn network_schema() -> Schema {
    Schema::new()
        .describe("A private network")
        .attribute(
            "label",
            Attribute::string().required().description("Network name shown in the dashboard"),
        )
        .attribute("region", region_attribute())
        .attribute(
            "cidr_v4",
            Attribute::string()
                .optional()
                .computed()
                .force_new()
                .validate_with(cidr_v4())
                .description("IPv4 range of the network"),
        )
        .attribute(
            "nameservers_v4",
            Attribute::list(AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute("name", Attribute::string().computed())
        .attribute("default", Attribute::bool().computed())
}

pub(crate) fn flatten_network(data: &mut ResourceData, network: &Network, region: &str) {
    data.set_id(&network.id);
    data.set("label", network.label.clone());
    data.set("name", network.name.clone());
    data.set("cidr_v4", network.cidr.clone());
    data.set("nameservers_v4", network.nameservers_v4.clone());
    data.set("default", network.default);
    data.set("region", region);
}

#[async_trait]
impl Resource for NetworkResource {
    fn type_name(&self) -> &'static str {
        "civo_network"
    }

    fn schema(&self) -> Schema {
        network_schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let request = CreateNetworkRequest {
            label: data.require_str("label")?.to_string(),
            cidr_v4: non_empty(data.get_str("cidr_v4")),
            nameservers_v4: data.get_string_list("nameservers_v4"),
        };

        info!("Creating network {}", request.label);
        let created: SimpleResponse = client.post("networks", &request).await?;
        data.set_id(&created.id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        match fetch::<Network>(&client, &format!("networks/{}", id)).await? {
            Some(network) => flatten_network(data, &network, client.region()),
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        if data.has_change("label") {
            let request = UpdateNetworkRequest {
                label: data.require_str("label")?.to_string(),
            };
            let _: SimpleResponse = client.put(&format!("networks/{}", id), &request).await?;
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        info!("Deleting network {}", id);
        delete_when_free(&client, &format!("networks/{}", id), data.timeout(Operation::Delete))
            .await
    }
}

//! `civo_dns_domain_name`: DNS zones hosted by Civo

use super::fetch;
use crate::client::CivoClient;
use crate::models::{DnsDomain, DnsDomainRequest, SimpleResponse};
use async_trait::async_trait;
use std::sync::Arc;
use stratoflow_cloud::validation::not_empty;
use stratoflow_cloud::{Attribute, Resource, ResourceData, Result, Schema};
use tracing::info;

pub struct DnsDomainResource {
    client: Arc<CivoClient>,
}

impl DnsDomainResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn dns_domain_schema() -> Schema {
    Schema::new()
        .describe("A DNS domain")
        .attribute(
            "name",
            Attribute::string()
                .required()
                .validate_with(not_empty())
                .description("Domain name, e.g. example.com"),
        )
        .attribute("account_id", Attribute::string().computed())
}

pub(crate) fn flatten_dns_domain(data: &mut ResourceData, domain: &DnsDomain) {
    data.set_id(&domain.id);
    data.set("name", domain.name.clone());
    data.set("account_id", domain.account_id.clone());
}

#[async_trait]
impl Resource for DnsDomainResource {
    fn type_name(&self) -> &'static str {
        "civo_dns_domain_name"
    }

    fn schema(&self) -> Schema {
        dns_domain_schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let request = DnsDomainRequest {
            name: data.require_str("name")?.to_string(),
        };

        info!("Creating DNS domain {}", request.name);
        let created: SimpleResponse = self.client.post("dns", &request).await?;
        data.set_id(&created.id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();

        match fetch::<DnsDomain>(&self.client, &format!("dns/{}", id)).await? {
            Some(domain) => flatten_dns_domain(data, &domain),
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();

        if data.has_change("name") {
            let request = DnsDomainRequest {
                name: data.require_str("name")?.to_string(),
            };
            let _: DnsDomain = self.client.put(&format!("dns/{}", id), &request).await?;
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();

        info!("Deleting DNS domain {}", id);
        self.client.delete(&format!("dns/{}", id)).await?;
        Ok(())
    }
}

//! `civo_dns_domain_record`: records inside a DNS domain
//!
//! Records live under their domain (`dns/{domain_id}/records/{id}`), so
//! import takes `<domain_id>:<record_id>`.

use super::found;
use crate::client::CivoClient;
use crate::models::{DnsRecord, DnsRecordRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use stratoflow_cloud::validation::{int_at_least, not_empty, string_in};
use stratoflow_cloud::{
    Attribute, CloudError, Diagnostic, Diagnostics, Resource, ResourceData, Result, Schema,
};
use stratoflow_core::Attributes;
use tracing::info;

pub const RECORD_TYPES: [&str; 6] = ["A", "CNAME", "MX", "SRV", "TXT", "NS"];
pub const MIN_TTL: i64 = 600;

pub struct DnsRecordResource {
    client: Arc<CivoClient>,
}

impl DnsRecordResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn dns_record_schema() -> Schema {
    Schema::new()
        .describe("A DNS record")
        .attribute("domain_id", Attribute::string().required().force_new())
        .attribute(
            "type",
            Attribute::string()
                .required()
                .validate_with(string_in(&RECORD_TYPES)),
        )
        .attribute(
            "name",
            Attribute::string()
                .required()
                .description("Record name; \"@\" for the domain apex"),
        )
        .attribute("value", Attribute::string().required().validate_with(not_empty()))
        .attribute(
            "priority",
            Attribute::int()
                .optional()
                .computed()
                .description("Required for MX and SRV records"),
        )
        .attribute(
            "ttl",
            Attribute::int()
                .optional()
                .default(MIN_TTL)
                .validate_with(int_at_least(MIN_TTL)),
        )
        .attribute("account_id", Attribute::string().computed())
}

fn records_path(domain_id: &str) -> String {
    format!("dns/{}/records", domain_id)
}

pub(crate) fn flatten_dns_record(data: &mut ResourceData, record: &DnsRecord) {
    data.set_id(&record.id);
    data.set("domain_id", record.domain_id.clone());
    data.set("type", record.record_type.clone());
    data.set("name", record.name.clone());
    data.set("value", record.value.clone());
    data.set("priority", record.priority);
    data.set("ttl", record.ttl);
}

fn record_request(data: &ResourceData) -> Result<DnsRecordRequest> {
    Ok(DnsRecordRequest {
        record_type: data.require_str("type")?.to_string(),
        name: data.require_str("name")?.to_string(),
        value: data.require_str("value")?.to_string(),
        priority: data.get_i64("priority").unwrap_or(0),
        ttl: data.get_i64("ttl").unwrap_or(MIN_TTL),
    })
}

/// Split an import ID of the form `<domain_id>:<record_id>`
pub(crate) fn parse_import_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once(':') {
        Some((domain, record)) if !domain.is_empty() && !record.is_empty() => Ok((domain, record)),
        _ => Err(CloudError::InvalidConfig(format!(
            "DNS record import ID must be <domain_id>:<record_id>, got \"{}\"",
            id
        ))),
    }
}

#[async_trait]
impl Resource for DnsRecordResource {
    fn type_name(&self) -> &'static str {
        "civo_dns_domain_record"
    }

    fn schema(&self) -> Schema {
        dns_record_schema()
    }

    fn validate(&self, config: &Attributes) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let record_type = config.get("type").and_then(Value::as_str).unwrap_or_default();
        let has_priority = config.get("priority").is_some_and(|v| !v.is_null());

        if matches!(record_type, "MX" | "SRV") && !has_priority {
            diagnostics.push(
                Diagnostic::error("Missing required argument")
                    .with_detail(format!("priority is required for {} records", record_type))
                    .with_attribute("priority"),
            );
        }
        diagnostics
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let domain_id = data.require_str("domain_id")?.to_string();
        let request = record_request(data)?;

        info!(
            "Creating DNS record {} {} in domain {}",
            request.record_type, request.name, domain_id
        );
        let created: DnsRecord = self.client.post(&records_path(&domain_id), &request).await?;
        data.set_id(&created.id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();
        let domain_id = data.require_str("domain_id")?.to_string();
        let path = format!("{}/{}", records_path(&domain_id), id);

        match found(self.client.get::<DnsRecord>(&path).await)? {
            Some(mut record) => {
                if record.domain_id.is_empty() {
                    record.domain_id = domain_id;
                }
                flatten_dns_record(data, &record);
            }
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();
        let domain_id = data.require_str("domain_id")?.to_string();
        let request = record_request(data)?;

        let _: DnsRecord = self
            .client
            .put(&format!("{}/{}", records_path(&domain_id), id), &request)
            .await?;

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();
        let domain_id = data.require_str("domain_id")?.to_string();

        info!("Deleting DNS record {}", id);
        self.client
            .delete(&format!("{}/{}", records_path(&domain_id), id))
            .await?;
        Ok(())
    }

    async fn import(&self, id: &str, data: &mut ResourceData) -> Result<()> {
        let (domain_id, record_id) = parse_import_id(id)?;
        data.set("domain_id", domain_id);
        data.set_id(record_id);

        self.read(data).await?;
        if data.id().is_none() {
            return Err(CloudError::ResourceNotFound(format!(
                "civo_dns_domain_record with ID {}",
                id
            )));
        }
        Ok(())
    }
}

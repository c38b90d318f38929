//! `civo_size`: instance and cluster sizes offered in a region

use crate::client::CivoClient;
use crate::models::Size;
use crate::resources::scoped;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use stratoflow_cloud::validation::string_in;
use stratoflow_cloud::{Attribute, DataSource, ResourceData, Result, Schema};

pub struct SizeDataSource {
    client: Arc<CivoClient>,
}

impl SizeDataSource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

fn size_schema() -> Schema {
    Schema::new()
        .attribute("name", Attribute::string().computed())
        .attribute("type", Attribute::string().computed())
        .attribute("description", Attribute::string().computed())
        .attribute("cpu_cores", Attribute::int().computed())
        .attribute("ram_mb", Attribute::int().computed())
        .attribute("disk_gb", Attribute::int().computed())
}

/// Selectable sizes matching the optional name prefix and type
pub(crate) fn filter_sizes(sizes: Vec<Size>, prefix: Option<&str>, size_type: Option<&str>) -> Vec<Size> {
    sizes
        .into_iter()
        .filter(|s| s.selectable)
        .filter(|s| prefix.is_none_or(|p| s.name.starts_with(p)))
        .filter(|s| size_type.is_none_or(|t| s.size_type.eq_ignore_ascii_case(t)))
        .collect()
}

fn size_to_value(size: &Size) -> Value {
    json!({
        "name": size.name,
        "type": size.size_type.to_lowercase(),
        "description": size.description,
        "cpu_cores": size.cpu_cores,
        "ram_mb": size.ram_mb,
        "disk_gb": size.disk_gb,
    })
}

#[async_trait]
impl DataSource for SizeDataSource {
    fn type_name(&self) -> &'static str {
        "civo_size"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .describe("Sizes available for instances, clusters and databases")
            .attribute(
                "name",
                Attribute::string()
                    .optional()
                    .description("Only sizes whose name starts with this prefix"),
            )
            .attribute(
                "type",
                Attribute::string()
                    .optional()
                    .validate_with(string_in(&["instance", "kubernetes", "database"])),
            )
            .attribute("region", Attribute::string().optional().computed())
            .attribute("sizes", Attribute::block(size_schema()).computed())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let sizes: Vec<Size> = client.get("sizes").await?;

        let matching = filter_sizes(sizes, data.get_str("name"), data.get_str("type"));
        let values: Vec<Value> = matching.iter().map(size_to_value).collect();

        data.set_id(format!("sizes-{}", client.region().to_lowercase()));
        data.set("region", client.region());
        data.set("sizes", values);
        Ok(())
    }
}

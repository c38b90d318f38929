//! `civo_instance`: compute instances
//!
//! Create waits until the instance is `ACTIVE`; delete waits until the API
//! no longer knows it. A resize also waits for `ACTIVE` again.

use super::{fetch, found, non_empty, region_attribute, scoped};
use crate::client::CivoClient;
use crate::models::{
    CreateInstanceRequest, DiskImage, Instance, InstanceFirewallRequest, InstanceTagsRequest,
    ResizeInstanceRequest, SimpleResponse, UpdateInstanceRequest,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stratoflow_cloud::validation::{hostname, string_in};
use stratoflow_cloud::{
    Attribute, AttributeType, CloudError, Resource, ResourceData, Result, Schema, StateChangeConf,
    random_name, wait_until_gone,
};
use stratoflow_core::{Operation, Timeouts};
use tracing::info;
use uuid::Uuid;

const PENDING_STATUSES: [&str; 5] = ["BUILD_PENDING", "BUILDING", "PENDING", "STARTING", "REBOOTING"];
const ACTIVE: &str = "ACTIVE";

pub struct InstanceResource {
    client: Arc<CivoClient>,
}

impl InstanceResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn instance_schema() -> Schema {
    Schema::new()
        .describe("A compute instance")
        .attribute(
            "hostname",
            Attribute::string()
                .optional()
                .computed()
                .validate_with(hostname())
                .description("Generated when omitted"),
        )
        .attribute("reverse_dns", Attribute::string().optional())
        .attribute("size", Attribute::string().required().description("e.g. g3.small"))
        .attribute(
            "public_ip_required",
            Attribute::string()
                .optional()
                .default("create")
                .force_new()
                .validate_with(string_in(&["create", "none"])),
        )
        .attribute(
            "network_id",
            Attribute::string().optional().computed().force_new(),
        )
        .attribute(
            "disk_image",
            Attribute::string()
                .required()
                .force_new()
                .description("Disk image name or ID"),
        )
        .attribute(
            "initial_user",
            Attribute::string().optional().computed().force_new(),
        )
        .attribute("notes", Attribute::string().optional())
        .attribute("sshkey_id", Attribute::string().optional().force_new())
        .attribute("firewall_id", Attribute::string().optional().computed())
        .attribute("tags", Attribute::set(AttributeType::String).optional())
        .attribute("script", Attribute::string().optional().force_new().sensitive())
        .attribute("region", region_attribute())
        .attribute("status", Attribute::string().computed())
        .attribute("public_ip", Attribute::string().computed())
        .attribute("private_ip", Attribute::string().computed())
        .attribute("initial_password", Attribute::string().computed().sensitive())
        .attribute("source_id", Attribute::string().computed())
        .attribute("cpu_cores", Attribute::int().computed())
        .attribute("ram_mb", Attribute::int().computed())
        .attribute("disk_gb", Attribute::int().computed())
        .attribute("created_at", Attribute::string().computed())
}

pub(crate) fn flatten_instance(data: &mut ResourceData, instance: &Instance, region: &str) {
    data.set_id(&instance.id);
    data.set("hostname", instance.hostname.clone());
    data.set("reverse_dns", instance.reverse_dns.clone());
    data.set("size", instance.size.clone());
    data.set("network_id", instance.network_id.clone());
    data.set("initial_user", instance.initial_user.clone());
    data.set("notes", instance.notes.clone());
    data.set("sshkey_id", instance.sshkey_id.clone());
    data.set("firewall_id", instance.firewall_id.clone());

    let mut tags = instance.tags.clone();
    tags.sort();
    tags.dedup();
    data.set("tags", tags);

    data.set("region", region);
    data.set("status", instance.status.clone());
    data.set("public_ip", instance.public_ip.clone());
    data.set("private_ip", instance.private_ip.clone());
    data.set("source_id", instance.source_id.clone());
    data.set("cpu_cores", instance.cpu_cores);
    data.set("ram_mb", instance.ram_mb);
    data.set("disk_gb", instance.disk_gb);
    data.set("created_at", instance.created_at.clone());

    if !instance.initial_password.is_empty() {
        data.set("initial_password", instance.initial_password.clone());
    }
    // Configured by name or ID; only fill it in when unknown (import)
    if data.get_str("disk_image").is_none() && !instance.source_id.is_empty() {
        data.set("disk_image", instance.source_id.clone());
    }
}

/// Resolve a disk image name to its ID
async fn resolve_disk_image(client: &CivoClient, image: &str) -> Result<String> {
    if Uuid::parse_str(image).is_ok() {
        return Ok(image.to_string());
    }

    let images: Vec<DiskImage> = client.get("disk_images").await?;
    images
        .into_iter()
        .find(|i| i.name == image || i.label == image)
        .map(|i| i.id)
        .ok_or_else(|| CloudError::InvalidConfig(format!("disk image '{}' not found", image)))
}

async fn wait_for_active(client: &CivoClient, id: &str, timeout: Duration) -> Result<Instance> {
    let path = format!("instances/{}", id);
    let path = path.as_str();
    StateChangeConf::new(&PENDING_STATUSES, &[ACTIVE], timeout)
        .wait_for_state(|| async move {
            let instance = found(client.get::<Instance>(path).await)?;
            Ok(instance.map(|i| {
                let status = i.status.clone();
                (i, status)
            }))
        })
        .await
}

fn joined_tags(data: &ResourceData) -> String {
    data.get_string_list("tags").join(" ")
}

#[async_trait]
impl Resource for InstanceResource {
    fn type_name(&self) -> &'static str {
        "civo_instance"
    }

    fn schema(&self) -> Schema {
        instance_schema()
    }

    fn default_timeouts(&self) -> Timeouts {
        let mut timeouts = Timeouts::all(Duration::from_secs(20 * 60));
        timeouts.read = Some(Duration::from_secs(5 * 60));
        timeouts
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let hostname = data
            .get_str("hostname")
            .map(str::to_string)
            .unwrap_or_else(random_name);
        let template_id = resolve_disk_image(&client, data.require_str("disk_image")?).await?;

        let request = CreateInstanceRequest {
            count: 1,
            hostname: hostname.clone(),
            reverse_dns: non_empty(data.get_str("reverse_dns")),
            size: data.require_str("size")?.to_string(),
            public_ip: data
                .get_str("public_ip_required")
                .unwrap_or("create")
                .to_string(),
            network_id: non_empty(data.get_str("network_id")),
            template_id,
            initial_user: non_empty(data.get_str("initial_user")),
            notes: non_empty(data.get_str("notes")),
            sshkey_id: non_empty(data.get_str("sshkey_id")),
            firewall_id: non_empty(data.get_str("firewall_id")),
            tags: joined_tags(data),
            script: non_empty(data.get_str("script")),
        };

        info!("Creating instance {} ({})", hostname, request.size);
        let created: Instance = client.post("instances", &request).await?;
        data.set_id(&created.id);
        data.set("hostname", hostname);

        let instance = wait_for_active(&client, &created.id, data.timeout(Operation::Create)).await?;
        flatten_instance(data, &instance, client.region());
        Ok(())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        match fetch::<Instance>(&client, &format!("instances/{}", id)).await? {
            Some(instance) => flatten_instance(data, &instance, client.region()),
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();
        let path = format!("instances/{}", id);

        if ["hostname", "notes", "reverse_dns"]
            .iter()
            .any(|key| data.has_change(key))
        {
            let request = UpdateInstanceRequest {
                hostname: data.get_str("hostname").unwrap_or_default().to_string(),
                reverse_dns: data.get_str("reverse_dns").unwrap_or_default().to_string(),
                notes: data.get_str("notes").unwrap_or_default().to_string(),
            };
            let _: SimpleResponse = client.put(&path, &request).await?;
        }

        if data.has_change("size") {
            let request = ResizeInstanceRequest {
                size: data.require_str("size")?.to_string(),
            };
            info!("Resizing instance {} to {}", id, request.size);
            let _: SimpleResponse = client.put(&format!("{}/resize", path), &request).await?;
            wait_for_active(&client, &id, data.timeout(Operation::Update)).await?;
        }

        if data.has_change("tags") {
            let request = InstanceTagsRequest {
                tags: joined_tags(data),
            };
            let _: SimpleResponse = client.put(&format!("{}/tags", path), &request).await?;
        }

        if data.has_change("firewall_id") {
            let request = InstanceFirewallRequest {
                firewall_id: data.require_str("firewall_id")?.to_string(),
            };
            let _: SimpleResponse = client.put(&format!("{}/firewall", path), &request).await?;
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();
        let path = format!("instances/{}", id);

        info!("Deleting instance {}", id);
        client.delete(&path).await?;

        let (client, path) = (&client, path.as_str());
        wait_until_gone(data.timeout(Operation::Delete), || async move {
            let instance = found(client.get::<Instance>(path).await)?;
            Ok(instance.map(|i| i.status))
        })
        .await
    }
}

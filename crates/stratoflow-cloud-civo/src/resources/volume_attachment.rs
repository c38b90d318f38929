//! `civo_volume_attachment`: attaches a volume to an instance
//!
//! The attachment has no ID of its own; it is identified by the volume ID.

use super::{found, region_attribute, scoped};
use crate::client::CivoClient;
use crate::models::{AttachVolumeRequest, DetachVolumeRequest, SimpleResponse, Volume};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stratoflow_cloud::{Attribute, Resource, ResourceData, Result, Schema, StateChangeConf};
use stratoflow_core::{Operation, Timeouts};
use tracing::info;

pub struct VolumeAttachmentResource {
    client: Arc<CivoClient>,
}

impl VolumeAttachmentResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn volume_attachment_schema() -> Schema {
    Schema::new()
        .describe("Attachment of a volume to an instance")
        .attribute("instance_id", Attribute::string().required().force_new())
        .attribute("volume_id", Attribute::string().required().force_new())
        .attribute("region", region_attribute())
}

async fn wait_for_volume(
    client: &CivoClient,
    volume_id: &str,
    pending: &[&str],
    target: &str,
    timeout: Duration,
) -> Result<Volume> {
    let path = format!("volumes/{}", volume_id);
    let path = path.as_str();
    // Attach and detach settle within seconds
    StateChangeConf::new(pending, &[target], timeout)
        .with_min_interval(Duration::from_secs(1))
        .with_max_interval(Duration::from_secs(4))
        .wait_for_state(|| async move {
            let volume = found(client.get::<Volume>(path).await)?;
            Ok(volume.map(|v| {
                let status = v.status.clone();
                (v, status)
            }))
        })
        .await
}

#[async_trait]
impl Resource for VolumeAttachmentResource {
    fn type_name(&self) -> &'static str {
        "civo_volume_attachment"
    }

    fn schema(&self) -> Schema {
        volume_attachment_schema()
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts::all(Duration::from_secs(5 * 60))
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let volume_id = data.require_str("volume_id")?.to_string();
        let request = AttachVolumeRequest {
            instance_id: data.require_str("instance_id")?.to_string(),
        };

        info!("Attaching volume {} to instance {}", volume_id, request.instance_id);
        let _: SimpleResponse = client
            .put(&format!("volumes/{}/attach", volume_id), &request)
            .await?;
        data.set_id(&volume_id);

        wait_for_volume(
            &client,
            &volume_id,
            &["available", "attaching"],
            "attached",
            data.timeout(Operation::Create),
        )
        .await?;

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        match found(client.get::<Volume>(&format!("volumes/{}", id)).await)? {
            Some(volume) if !volume.instance_id.is_empty() => {
                data.set("volume_id", volume.id.clone());
                data.set("instance_id", volume.instance_id.clone());
                data.set("region", client.region());
            }
            _ => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        // Every argument forces replacement
        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        info!("Detaching volume {}", id);
        let _: SimpleResponse = client
            .put(&format!("volumes/{}/detach", id), &DetachVolumeRequest {})
            .await?;

        wait_for_volume(
            &client,
            &id,
            &["attached", "detaching"],
            "available",
            data.timeout(Operation::Delete),
        )
        .await?;
        Ok(())
    }
}

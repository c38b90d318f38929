//! `civo_volume`: block storage volumes
//!
//! Volumes can only grow; shrinking is rejected instead of replacing the
//! volume and losing its data.

use super::{delete_when_free, fetch, non_empty, region_attribute, scoped};
use crate::client::CivoClient;
use crate::models::{CreateVolumeRequest, ResizeVolumeRequest, SimpleResponse, Volume};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use stratoflow_cloud::validation::int_at_least;
use stratoflow_cloud::{Attribute, CloudError, Resource, ResourceData, Result, Schema};
use stratoflow_core::Operation;
use tracing::info;

pub struct VolumeResource {
    client: Arc<CivoClient>,
}

impl VolumeResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn volume_schema() -> Schema {
    Schema::new()
        .describe("A block storage volume")
        .attribute("name", Attribute::string().required().force_new())
        .attribute(
            "size_gb",
            Attribute::int()
                .required()
                .validate_with(int_at_least(1))
                .description("Size in gigabytes; can only be increased"),
        )
        .attribute(
            "network_id",
            Attribute::string().optional().computed().force_new(),
        )
        .attribute("region", region_attribute())
        .attribute("mount_point", Attribute::string().computed())
        .attribute("instance_id", Attribute::string().computed())
        .attribute("status", Attribute::string().computed())
        .attribute("created_at", Attribute::string().computed())
}

pub(crate) fn flatten_volume(data: &mut ResourceData, volume: &Volume, region: &str) {
    data.set_id(&volume.id);
    data.set("name", volume.name.clone());
    data.set("size_gb", volume.size_gigabytes);
    data.set("network_id", volume.network_id.clone());
    data.set("mount_point", volume.mount_point.clone());
    data.set("instance_id", volume.instance_id.clone());
    data.set("status", volume.status.clone());
    data.set("created_at", volume.created_at.clone());
    data.set("region", region);
}

/// New size for a resize, rejecting shrinks
pub(crate) fn grown_size(old: Option<&Value>, new: Option<&Value>) -> Result<Option<i64>> {
    let new = new.and_then(Value::as_i64);
    match (old.and_then(Value::as_i64), new) {
        (Some(old), Some(new)) if new < old => Err(CloudError::InvalidConfig(format!(
            "volume size cannot be reduced from {} GB to {} GB",
            old, new
        ))),
        (Some(old), Some(new)) if new == old => Ok(None),
        _ => Ok(new),
    }
}

#[async_trait]
impl Resource for VolumeResource {
    fn type_name(&self) -> &'static str {
        "civo_volume"
    }

    fn schema(&self) -> Schema {
        volume_schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let request = CreateVolumeRequest {
            name: data.require_str("name")?.to_string(),
            size_gb: data
                .get_i64("size_gb")
                .ok_or_else(|| CloudError::InvalidConfig("size_gb is required".to_string()))?,
            network_id: non_empty(data.get_str("network_id")),
        };

        info!("Creating volume {} ({} GB)", request.name, request.size_gb);
        let created: SimpleResponse = client.post("volumes", &request).await?;
        data.set_id(&created.id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        match fetch::<Volume>(&client, &format!("volumes/{}", id)).await? {
            Some(volume) => flatten_volume(data, &volume, client.region()),
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        if data.has_change("size_gb") {
            let (old, new) = data.get_change("size_gb");
            if let Some(size_gb) = grown_size(old, new)? {
                info!("Resizing volume {} to {} GB", id, size_gb);
                let _: SimpleResponse = client
                    .put(
                        &format!("volumes/{}/resize", id),
                        &ResizeVolumeRequest { size_gb },
                    )
                    .await?;
            }
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        info!("Deleting volume {}", id);
        delete_when_free(&client, &format!("volumes/{}", id), data.timeout(Operation::Delete))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grown_size() {
        assert_eq!(grown_size(Some(&json!(10)), Some(&json!(20))).unwrap(), Some(20));
        assert_eq!(grown_size(Some(&json!(10)), Some(&json!(10))).unwrap(), None);
        assert_eq!(grown_size(None, Some(&json!(5))).unwrap(), Some(5));
    }

    #[test]
    fn test_shrink_rejected() {
        let err = grown_size(Some(&json!(50)), Some(&json!(20))).unwrap_err();
        assert!(err.to_string().contains("cannot be reduced"));
    }
}

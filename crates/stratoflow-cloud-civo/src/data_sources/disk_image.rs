//! `civo_disk_image`: operating system images for instances

use crate::client::CivoClient;
use crate::models::DiskImage;
use crate::resources::scoped;
use async_trait::async_trait;
use std::sync::Arc;
use stratoflow_cloud::{Attribute, CloudError, DataSource, ResourceData, Result, Schema};

pub struct DiskImageDataSource {
    client: Arc<CivoClient>,
}

impl DiskImageDataSource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

/// Find an image by name (`ubuntu-jammy`) or label
pub(crate) fn find_image<'a>(images: &'a [DiskImage], name: &str) -> Option<&'a DiskImage> {
    images
        .iter()
        .find(|i| i.name == name)
        .or_else(|| images.iter().find(|i| i.label == name))
}

#[async_trait]
impl DataSource for DiskImageDataSource {
    fn type_name(&self) -> &'static str {
        "civo_disk_image"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .describe("A disk image to boot instances from")
            .attribute(
                "name",
                Attribute::string()
                    .required()
                    .description("Image name, e.g. ubuntu-jammy"),
            )
            .attribute("region", Attribute::string().optional().computed())
            .attribute("version", Attribute::string().computed())
            .attribute("distribution", Attribute::string().computed())
            .attribute("label", Attribute::string().computed())
            .attribute("state", Attribute::string().computed())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let name = data.require_str("name")?.to_string();
        let images: Vec<DiskImage> = client.get("disk_images").await?;

        let image = find_image(&images, &name)
            .ok_or_else(|| CloudError::ResourceNotFound(format!("disk image \"{}\"", name)))?;

        data.set_id(&image.id);
        data.set("version", image.version.clone());
        data.set("distribution", image.distribution.clone());
        data.set("label", image.label.clone());
        data.set("state", image.state.clone());
        data.set("region", client.region());
        Ok(())
    }
}

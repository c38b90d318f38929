//! `civo_ssh_key`: SSH public keys for instance login

use super::fetch;
use crate::client::CivoClient;
use crate::models::{CreateSshKeyRequest, SimpleResponse, SshKey, UpdateSshKeyRequest};
use async_trait::async_trait;
use std::sync::Arc;
use stratoflow_cloud::validation::not_empty;
use stratoflow_cloud::{Attribute, Resource, ResourceData, Result, Schema};
use tracing::info;

pub struct SshKeyResource {
    client: Arc<CivoClient>,
}

impl SshKeyResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn ssh_key_schema() -> Schema {
    Schema::new()
        .describe("An SSH public key")
        .attribute("name", Attribute::string().required().validate_with(not_empty()))
        .attribute(
            "public_key",
            Attribute::string()
                .required()
                .force_new()
                .validate_with(not_empty()),
        )
        .attribute("fingerprint", Attribute::string().computed())
}

pub(crate) fn flatten_ssh_key(data: &mut ResourceData, key: &SshKey) {
    data.set_id(&key.id);
    data.set("name", key.name.clone());
    data.set("fingerprint", key.fingerprint.clone());
    // Keep the configured spelling (trailing newline from a key file)
    if data.get_str("public_key").is_none() && !key.public_key.is_empty() {
        data.set("public_key", key.public_key.trim().to_string());
    }
}

#[async_trait]
impl Resource for SshKeyResource {
    fn type_name(&self) -> &'static str {
        "civo_ssh_key"
    }

    fn schema(&self) -> Schema {
        ssh_key_schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let request = CreateSshKeyRequest {
            name: data.require_str("name")?.to_string(),
            public_key: data.require_str("public_key")?.trim().to_string(),
        };

        info!("Creating SSH key {}", request.name);
        let created: SimpleResponse = self.client.post("sshkeys", &request).await?;
        data.set_id(&created.id);

        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();

        match fetch::<SshKey>(&self.client, &format!("sshkeys/{}", id)).await? {
            Some(key) => flatten_ssh_key(data, &key),
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();

        if data.has_change("name") {
            let request = UpdateSshKeyRequest {
                name: data.require_str("name")?.to_string(),
            };
            let _: SshKey = self.client.put(&format!("sshkeys/{}", id), &request).await?;
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.require_id()?.to_string();

        info!("Deleting SSH key {}", id);
        self.client.delete(&format!("sshkeys/{}", id)).await?;
        Ok(())
    }
}

//! `civo_object_store`: S3-compatible object store buckets

use super::{found, non_empty, region_attribute, scoped};
use crate::client::CivoClient;
use crate::models::{CreateObjectStoreRequest, ObjectStore, UpdateObjectStoreRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stratoflow_cloud::validation::multiple_of;
use stratoflow_cloud::{
    Attribute, Resource, ResourceData, Result, Schema, StateChangeConf, random_name,
    wait_until_gone,
};
use stratoflow_core::{Operation, Timeouts};
use tracing::info;

pub const DEFAULT_MAX_SIZE_GB: i64 = 500;

pub struct ObjectStoreResource {
    client: Arc<CivoClient>,
}

impl ObjectStoreResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

pub(crate) fn object_store_schema() -> Schema {
    Schema::new()
        .describe("An object store bucket")
        .attribute(
            "name",
            Attribute::string()
                .optional()
                .computed()
                .force_new()
                .description("Generated when omitted"),
        )
        .attribute(
            "max_size_gb",
            Attribute::int()
                .optional()
                .default(DEFAULT_MAX_SIZE_GB)
                .validate_with(multiple_of(DEFAULT_MAX_SIZE_GB)),
        )
        .attribute(
            "access_key_id",
            Attribute::string()
                .optional()
                .computed()
                .force_new()
                .description("Credential to own the bucket; a new one is created when omitted"),
        )
        .attribute("region", region_attribute())
        .attribute("bucket_url", Attribute::string().computed())
        .attribute("endpoint", Attribute::string().computed())
        .attribute("status", Attribute::string().computed())
}

pub(crate) fn flatten_object_store(data: &mut ResourceData, store: &ObjectStore, region: &str) {
    data.set_id(&store.id);
    data.set("name", store.name.clone());
    data.set("max_size_gb", store.max_size);
    data.set("access_key_id", store.owner_info.access_key_id.clone());
    data.set("bucket_url", store.url());
    data.set("endpoint", store.objectstore_endpoint.clone());
    data.set("status", store.status.clone());
    data.set("region", region);
}

async fn wait_for_ready(client: &CivoClient, id: &str, timeout: Duration) -> Result<ObjectStore> {
    let path = format!("objectstores/{}", id);
    let path = path.as_str();
    StateChangeConf::new(&["pending", "creating"], &["ready"], timeout)
        .wait_for_state(|| async move {
            let store = found(client.get::<ObjectStore>(path).await)?;
            Ok(store.map(|s| {
                let status = s.status.to_lowercase();
                (s, status)
            }))
        })
        .await
}

#[async_trait]
impl Resource for ObjectStoreResource {
    fn type_name(&self) -> &'static str {
        "civo_object_store"
    }

    fn schema(&self) -> Schema {
        object_store_schema()
    }

    fn default_timeouts(&self) -> Timeouts {
        Timeouts::all(Duration::from_secs(10 * 60))
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let request = CreateObjectStoreRequest {
            name: data
                .get_str("name")
                .map(str::to_string)
                .unwrap_or_else(random_name),
            max_size_gb: data.get_i64("max_size_gb").unwrap_or(DEFAULT_MAX_SIZE_GB),
            access_key_id: non_empty(data.get_str("access_key_id")),
        };

        info!("Creating object store {} ({} GB)", request.name, request.max_size_gb);
        let created: ObjectStore = client.post("objectstores", &request).await?;
        data.set_id(&created.id);

        let store = wait_for_ready(&client, &created.id, data.timeout(Operation::Create)).await?;
        flatten_object_store(data, &store, client.region());
        Ok(())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        match found(client.get::<ObjectStore>(&format!("objectstores/{}", id)).await)? {
            Some(store) => flatten_object_store(data, &store, client.region()),
            None => data.clear_id(),
        }
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        if data.has_change("max_size_gb") {
            let request = UpdateObjectStoreRequest {
                max_size_gb: data.get_i64("max_size_gb").unwrap_or(DEFAULT_MAX_SIZE_GB),
            };
            info!("Resizing object store {} to {} GB", id, request.max_size_gb);
            let _: ObjectStore = client.put(&format!("objectstores/{}", id), &request).await?;
            wait_for_ready(&client, &id, data.timeout(Operation::Update)).await?;
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();
        let path = format!("objectstores/{}", id);

        info!("Deleting object store {}", id);
        client.delete(&path).await?;

        let (client, path) = (&client, path.as_str());
        wait_until_gone(data.timeout(Operation::Delete), || async move {
            let store = found(client.get::<ObjectStore>(path).await)?;
            Ok(store.map(|s| s.status))
        })
        .await
    }
}

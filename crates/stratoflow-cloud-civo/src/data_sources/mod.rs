//! Civo data sources
//!
//! Most data sources find one existing object by `id` or by name and expose
//! the same attributes as the matching resource, all computed. They share
//! [`LookupDataSource`]; each object type only describes itself through
//! [`Lookup`].

mod disk_image;
mod lookups;
mod size;

pub use disk_image::DiskImageDataSource;
pub use lookups::{
    DnsDomainLookup, FirewallLookup, InstanceLookup, NetworkLookup, ObjectStoreLookup,
    VolumeLookup,
};
pub use size::SizeDataSource;

use crate::client::CivoClient;
use crate::models::PaginatedList;
use crate::resources::scoped;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use stratoflow_cloud::{
    Attribute, CloudError, DataSource, ResourceData, Result, Schema,
};
use tracing::debug;

const PAGE_SIZE: &str = "100";

/// How to list, match and flatten one object type
#[async_trait]
pub trait Lookup: Send + Sync {
    type Item: DeserializeOwned + Send + Sync;

    fn type_name(&self) -> &'static str;

    /// Collection path, e.g. `networks`
    fn collection(&self) -> &'static str;

    /// Attribute that holds the human readable name (`label`, `hostname`, ...)
    fn name_attribute(&self) -> &'static str;

    /// Schema of the matching resource
    fn resource_schema(&self) -> Schema;

    /// Whether the collection answers with `{page, pages, items}`
    fn paginated(&self) -> bool {
        false
    }

    fn id_of<'a>(&self, item: &'a Self::Item) -> &'a str;

    fn name_of<'a>(&self, item: &'a Self::Item) -> &'a str;

    async fn flatten(
        &self,
        client: &CivoClient,
        data: &mut ResourceData,
        item: &Self::Item,
    ) -> Result<()>;
}

/// Turn a resource schema into a lookup schema
///
/// Every attribute becomes computed; `id` and the name attribute become the
/// (mutually exclusive) search arguments.
pub(crate) fn lookup_schema(resource: &Schema, name_attribute: &str) -> Schema {
    let mut schema = Schema::new().describe(resource.description.clone());

    for (name, attribute) in resource.attributes() {
        let mut attribute = attribute.clone();
        attribute.required = false;
        attribute.force_new = false;
        attribute.default = None;
        attribute.computed = true;
        attribute.optional = name == name_attribute || name == "region";
        schema = schema.attribute(name.clone(), attribute);
    }

    schema
        .attribute("id", Attribute::string().optional().computed())
        .exactly_one_of(&["id", name_attribute])
}

pub struct LookupDataSource<L> {
    client: Arc<CivoClient>,
    lookup: L,
}

impl<L: Lookup> LookupDataSource<L> {
    pub fn new(client: Arc<CivoClient>, lookup: L) -> Self {
        Self { client, lookup }
    }

    async fn list(&self, client: &CivoClient) -> Result<Vec<L::Item>> {
        let collection = self.lookup.collection();
        if !self.lookup.paginated() {
            return Ok(client.get(collection).await?);
        }

        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let page_number = page.to_string();
            let list: PaginatedList<L::Item> = client
                .get_with_query(collection, &[("page", &page_number), ("per_page", PAGE_SIZE)])
                .await?;
            debug!("{}: page {} of {}", collection, page, list.pages);

            let empty = list.items.is_empty();
            items.extend(list.items);
            if empty || page >= list.pages {
                return Ok(items);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl<L: Lookup> DataSource for LookupDataSource<L> {
    fn type_name(&self) -> &'static str {
        self.lookup.type_name()
    }

    fn schema(&self) -> Schema {
        lookup_schema(&self.lookup.resource_schema(), self.lookup.name_attribute())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let type_name = self.lookup.type_name();

        let item = if let Some(id) = data.get_str("id") {
            let path = format!("{}/{}", self.lookup.collection(), id);
            client.get::<L::Item>(&path).await.map_err(|e| {
                if e.is_not_found() {
                    CloudError::ResourceNotFound(format!("{} with ID {}", type_name, id))
                } else {
                    e.into()
                }
            })?
        } else {
            let name_attribute = self.lookup.name_attribute();
            let name = data.require_str(name_attribute)?.to_string();
            let mut matches: Vec<L::Item> = self
                .list(&client)
                .await?
                .into_iter()
                .filter(|item| self.lookup.name_of(item) == name)
                .collect();

            match matches.len() {
                0 => {
                    return Err(CloudError::ResourceNotFound(format!(
                        "{} with {} \"{}\"",
                        type_name, name_attribute, name
                    )));
                }
                1 => matches.remove(0),
                n => {
                    return Err(CloudError::InvalidConfig(format!(
                        "{} {} \"{}\" matches {} objects; look it up by id instead",
                        type_name, name_attribute, name, n
                    )));
                }
            }
        };

        debug!("{} resolved to {}", type_name, self.lookup.id_of(&item));
        self.lookup.flatten(&client, data, &item).await
    }
}

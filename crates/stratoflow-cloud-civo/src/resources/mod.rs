//! Civo resources
//!
//! Each resource converts between the attribute map and the API models:
//! request builders on the way out, `flatten_*` functions on the way back.

pub mod dns_domain;
pub mod dns_record;
pub mod firewall;
pub mod instance;
pub mod network;
pub mod object_store;
pub mod ssh_key;
pub mod volume;
pub mod volume_attachment;

pub use dns_domain::DnsDomainResource;
pub use dns_record::DnsRecordResource;
pub use firewall::FirewallResource;
pub use instance::InstanceResource;
pub use network::NetworkResource;
pub use object_store::ObjectStoreResource;
pub use ssh_key::SshKeyResource;
pub use volume::VolumeResource;
pub use volume_attachment::VolumeAttachmentResource;

use crate::client::CivoClient;
use crate::error::CivoError;
use serde::de::DeserializeOwned;
use std::time::Duration;
use stratoflow_cloud::{Attribute, CloudError, ResourceData, RetryError, retry};

/// `region` attribute shared by regional resources
pub(crate) fn region_attribute() -> Attribute {
    Attribute::string()
        .optional()
        .computed()
        .force_new()
        .description("Region to create the resource in; defaults to the provider region")
}

/// Client scoped to the resource's configured region
pub(crate) fn scoped(client: &CivoClient, data: &ResourceData) -> CivoClient {
    client.in_region(data.get_str("region"))
}

/// GET that maps "not found" to `None`
pub(crate) async fn fetch<T: DeserializeOwned>(
    client: &CivoClient,
    path: &str,
) -> Result<Option<T>, CloudError> {
    match client.get(path).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// DELETE, retried while the API reports the object as still in use
pub(crate) async fn delete_when_free(
    client: &CivoClient,
    path: &str,
    timeout: Duration,
) -> Result<(), CloudError> {
    retry(timeout, || async move {
        match client.delete(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_in_use() => Err(RetryError::Retryable(e.into())),
            Err(e) => Err(RetryError::NonRetryable(e.into())),
        }
    })
    .await
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Map "not found" to `Ok(None)` for status refresh closures
pub(crate) fn found<T>(result: Result<T, CivoError>) -> Result<Option<T>, CloudError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

//! Civo provider implementation

use crate::client::{CivoClient, ClientConfig, DEFAULT_API_URL, DEFAULT_REGION};
use crate::data_sources::{
    DiskImageDataSource, DnsDomainLookup, FirewallLookup, InstanceLookup, LookupDataSource,
    NetworkLookup, ObjectStoreLookup, SizeDataSource, VolumeLookup,
};
use crate::error::CivoError;
use crate::models::Region;
use crate::resources::{
    DnsDomainResource, DnsRecordResource, FirewallResource, InstanceResource, NetworkResource,
    ObjectStoreResource, SshKeyResource, VolumeAttachmentResource, VolumeResource,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use stratoflow_cloud::{
    Attribute, AuthStatus, CloudError, CloudProvider, DataSource, Resource, Result, Schema,
};
use stratoflow_config::Profile;
use stratoflow_core::Attributes;
use tracing::{debug, info};

pub const TOKEN_ENV: &str = "CIVO_TOKEN";
pub const REGION_ENV: &str = "CIVO_REGION";
pub const API_URL_ENV: &str = "CIVO_API_URL";

/// Civo provider
pub struct CivoProvider {
    client: Arc<CivoClient>,
}

/// Schema of the `provider "civo" { ... }` block
pub fn provider_schema() -> Schema {
    Schema::new()
        .describe("Civo cloud")
        .attribute(
            "token",
            Attribute::string()
                .optional()
                .sensitive()
                .description(format!("API token; falls back to {} and the credentials file", TOKEN_ENV)),
        )
        .attribute(
            "region",
            Attribute::string()
                .optional()
                .description(format!("Default region; falls back to {}, then {}", REGION_ENV, DEFAULT_REGION)),
        )
        .attribute(
            "api_endpoint",
            Attribute::string()
                .optional()
                .description(format!("API base URL; falls back to {}", API_URL_ENV)),
        )
}

/// First non-empty value of config, environment, profile
fn setting(
    config: &Attributes,
    key: &str,
    env: &str,
    profile: Option<&str>,
) -> Option<String> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
        .or_else(|| profile.filter(|v| !v.is_empty()).map(str::to_string))
}

/// Client settings from the provider block, environment and credentials profile
pub fn client_config(config: &Attributes, profile: Option<&Profile>) -> ClientConfig {
    let token = setting(config, "token", TOKEN_ENV, profile.and_then(|p| p.token.as_deref()));
    let region = setting(
        config,
        "region",
        REGION_ENV,
        profile.and_then(|p| p.region.as_deref()),
    )
    .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let api_url = setting(
        config,
        "api_endpoint",
        API_URL_ENV,
        profile.and_then(|p| p.api_endpoint.as_deref()),
    )
    .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    ClientConfig {
        token,
        region,
        api_url,
        ..ClientConfig::default()
    }
}

impl CivoProvider {
    pub fn new(client: CivoClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Build the provider from its configuration block
    pub fn configure(config: &Attributes) -> Result<Self> {
        let diagnostics = provider_schema().validate(config);
        if diagnostics.has_errors() {
            return Err(CloudError::Validation(diagnostics));
        }

        let profile = stratoflow_config::load_active_profile()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;
        let client_config = client_config(config, profile.as_ref());

        debug!(
            "Civo provider: region {}, endpoint {}",
            client_config.region, client_config.api_url
        );
        Ok(Self::new(CivoClient::new(client_config)?))
    }

    pub fn client(&self) -> &CivoClient {
        &self.client
    }
}

#[async_trait]
impl CloudProvider for CivoProvider {
    fn name(&self) -> &str {
        "civo"
    }

    fn display_name(&self) -> &str {
        "Civo"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        if !self.client.has_token() {
            return Ok(AuthStatus::failed(format!(
                "no API token: set {} or add a profile to the credentials file",
                TOKEN_ENV
            )));
        }

        match self.client.get::<Vec<Region>>("regions").await {
            Ok(regions) => {
                info!("Authenticated with Civo ({} regions)", regions.len());
                Ok(AuthStatus::ok(format!(
                    "region {} at {}",
                    self.client.region(),
                    self.client.base_url()
                )))
            }
            Err(e @ (CivoError::Unauthorized(_) | CivoError::MissingToken)) => {
                Ok(AuthStatus::failed(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resources(&self) -> Vec<Arc<dyn Resource>> {
        let client = &self.client;
        vec![
            Arc::new(DnsDomainResource::new(client.clone())),
            Arc::new(DnsRecordResource::new(client.clone())),
            Arc::new(FirewallResource::new(client.clone())),
            Arc::new(InstanceResource::new(client.clone())),
            Arc::new(NetworkResource::new(client.clone())),
            Arc::new(ObjectStoreResource::new(client.clone())),
            Arc::new(SshKeyResource::new(client.clone())),
            Arc::new(VolumeResource::new(client.clone())),
            Arc::new(VolumeAttachmentResource::new(client.clone())),
        ]
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSource>> {
        let client = &self.client;
        vec![
            Arc::new(DiskImageDataSource::new(client.clone())),
            Arc::new(LookupDataSource::new(client.clone(), DnsDomainLookup)),
            Arc::new(LookupDataSource::new(client.clone(), FirewallLookup)),
            Arc::new(LookupDataSource::new(client.clone(), InstanceLookup)),
            Arc::new(LookupDataSource::new(client.clone(), NetworkLookup)),
            Arc::new(LookupDataSource::new(client.clone(), ObjectStoreLookup)),
            Arc::new(SizeDataSource::new(client.clone())),
            Arc::new(LookupDataSource::new(client.clone(), VolumeLookup)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn profile() -> Profile {
        Profile {
            token: Some("profile-token".to_string()),
            region: Some("FRA1".to_string()),
            api_endpoint: None,
        }
    }

    #[test]
    #[serial]
    fn test_config_wins() {
        temp_env::with_vars(
            [(TOKEN_ENV, Some("env-token")), (REGION_ENV, Some("NYC1"))],
            || {
                let config = client_config(
                    &attrs(json!({"token": "cfg-token", "region": "PHX1"})),
                    Some(&profile()),
                );
                assert_eq!(config.token.as_deref(), Some("cfg-token"));
                assert_eq!(config.region, "PHX1");
            },
        );
    }

    #[test]
    #[serial]
    fn test_env_before_profile() {
        temp_env::with_vars(
            [(TOKEN_ENV, Some("env-token")), (REGION_ENV, None::<&str>)],
            || {
                let config = client_config(&Attributes::new(), Some(&profile()));
                assert_eq!(config.token.as_deref(), Some("env-token"));
                assert_eq!(config.region, "FRA1");
            },
        );
    }

    #[test]
    #[serial]
    fn test_defaults() {
        temp_env::with_vars(
            [
                (TOKEN_ENV, None::<&str>),
                (REGION_ENV, None),
                (API_URL_ENV, None),
            ],
            || {
                let config = client_config(&Attributes::new(), None);
                assert!(config.token.is_none());
                assert_eq!(config.region, DEFAULT_REGION);
                assert_eq!(config.api_url, DEFAULT_API_URL);
            },
        );
    }

    #[test]
    fn test_unknown_provider_argument() {
        let result = CivoProvider::configure(&attrs(json!({"tokn": "x"})));
        assert!(matches!(result, Err(CloudError::Validation(_))));
    }

    #[test]
    fn test_registers_every_type() {
        let provider = CivoProvider::new(CivoClient::new(ClientConfig::default()).unwrap());

        let mut resources: Vec<&str> = provider.resources().iter().map(|r| r.type_name()).collect();
        resources.sort();
        assert_eq!(
            resources,
            vec![
                "civo_dns_domain_name",
                "civo_dns_domain_record",
                "civo_firewall",
                "civo_instance",
                "civo_network",
                "civo_object_store",
                "civo_ssh_key",
                "civo_volume",
                "civo_volume_attachment",
            ]
        );

        assert_eq!(provider.data_sources().len(), 8);
        assert!(provider.data_source("civo_size").is_some());
        assert!(provider.resource("civo_kubernetes_cluster").is_none());
    }
}

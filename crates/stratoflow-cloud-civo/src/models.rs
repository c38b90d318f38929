//! Civo API request and response types
//!
//! Response types default every field so that objects missing optional
//! fields (or carrying new ones) still decode.

use serde::{Deserialize, Serialize};

/// `{"id": "...", "result": "success"}` style acknowledgement
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimpleResponse {
    pub id: String,
    pub result: String,
}

/// Page of a paginated collection (`instances`, `objectstores`)
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedList<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub default: bool,
}

// ============ Networks ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub label: String,
    pub default: bool,
    pub cidr: String,
    pub status: String,
    pub nameservers_v4: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateNetworkRequest {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_v4: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nameservers_v4: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateNetworkRequest {
    pub label: String,
}

// ============ Firewalls ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Firewall {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub rules_count: i64,
    pub instance_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateFirewallRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub create_rules: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateFirewallRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallRule {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub firewall_id: String,
    pub protocol: String,
    pub start_port: String,
    pub end_port: String,
    pub cidr: Vec<String>,
    pub direction: String,
    pub action: String,
    pub label: String,
}

// ============ Instances ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub id: String,
    pub hostname: String,
    pub reverse_dns: String,
    pub size: String,
    pub status: String,
    pub network_id: String,
    pub source_id: String,
    pub initial_user: String,
    pub initial_password: String,
    pub sshkey_id: String,
    pub tags: Vec<String>,
    pub firewall_id: String,
    pub public_ip: String,
    pub private_ip: String,
    pub notes: String,
    pub script: String,
    pub cpu_cores: i64,
    pub ram_mb: i64,
    pub disk_gb: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CreateInstanceRequest {
    pub count: u32,
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<String>,
    pub size: String,
    pub public_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sshkey_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall_id: Option<String>,
    /// Space separated
    pub tags: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateInstanceRequest {
    pub hostname: String,
    pub reverse_dns: String,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct ResizeInstanceRequest {
    pub size: String,
}

#[derive(Debug, Serialize)]
pub struct InstanceTagsRequest {
    /// Space separated
    pub tags: String,
}

#[derive(Debug, Serialize)]
pub struct InstanceFirewallRequest {
    pub firewall_id: String,
}

// ============ Volumes ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub instance_id: String,
    pub network_id: String,
    pub size_gigabytes: i64,
    pub mount_point: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CreateVolumeRequest {
    pub name: String,
    pub size_gb: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResizeVolumeRequest {
    pub size_gb: i64,
}

#[derive(Debug, Serialize)]
pub struct AttachVolumeRequest {
    pub instance_id: String,
}

#[derive(Debug, Serialize)]
pub struct DetachVolumeRequest {}

// ============ Object stores ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectStoreOwner {
    pub access_key_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectStore {
    pub id: String,
    pub name: String,
    pub max_size: i64,
    pub owner_info: ObjectStoreOwner,
    pub objectstore_endpoint: String,
    pub bucket_url: String,
    pub status: String,
}

impl ObjectStore {
    /// Bucket URL as reported, or derived from the endpoint
    pub fn url(&self) -> String {
        if !self.bucket_url.is_empty() {
            return self.bucket_url.clone();
        }
        if self.objectstore_endpoint.is_empty() {
            return String::new();
        }
        format!(
            "https://{}/{}",
            self.objectstore_endpoint.trim_start_matches("https://"),
            self.name
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CreateObjectStoreRequest {
    pub name: String,
    pub max_size_gb: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateObjectStoreRequest {
    pub max_size_gb: i64,
}

// ============ SSH keys ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SshKey {
    pub id: String,
    pub name: String,
    pub public_key: String,
    pub fingerprint: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSshKeyRequest {
    pub name: String,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateSshKeyRequest {
    pub name: String,
}

// ============ DNS ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DnsDomain {
    pub id: String,
    pub account_id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DnsDomainRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    pub id: String,
    pub domain_id: String,
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub priority: i64,
    pub ttl: i64,
}

#[derive(Debug, Serialize)]
pub struct DnsRecordRequest {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub priority: i64,
    pub ttl: i64,
}

// ============ Catalog ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Size {
    pub name: String,
    #[serde(rename = "type")]
    pub size_type: String,
    pub description: String,
    pub cpu_cores: i64,
    pub ram_mb: i64,
    pub disk_gb: i64,
    pub selectable: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiskImage {
    pub id: String,
    pub name: String,
    pub version: String,
    pub state: String,
    pub distribution: String,
    pub label: String,
}

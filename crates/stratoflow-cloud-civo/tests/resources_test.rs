//! Civo resources and data sources against a mock API server

use httpmock::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use stratoflow_cloud::{CloudError, DataSource, Resource, ResourceData, RetryConfig};
use stratoflow_cloud_civo::data_sources::{
    DiskImageDataSource, LookupDataSource, NetworkLookup, ObjectStoreLookup,
};
use stratoflow_cloud_civo::resources::{
    DnsRecordResource, FirewallResource, InstanceResource, NetworkResource, ObjectStoreResource,
    VolumeAttachmentResource, VolumeResource,
};
use stratoflow_cloud_civo::{CivoClient, ClientConfig};
use stratoflow_core::{Attributes, Timeouts};

fn client_for(server: &MockServer) -> Arc<CivoClient> {
    let client = CivoClient::new(ClientConfig {
        token: Some("test-token".to_string()),
        region: "LON1".to_string(),
        api_url: server.base_url(),
        retry: RetryConfig::none(),
    })
    .unwrap();
    Arc::new(client)
}

fn attrs(value: Value) -> Attributes {
    value.as_object().cloned().unwrap()
}

// ============ civo_network ============

#[tokio::test]
async fn test_network_create_reads_back_computed_values() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/networks")
                .json_body_partial(r#"{ "label": "backend", "region": "LON1" }"#);
            then.status(200)
                .json_body(json!({ "id": "net-1", "label": "backend", "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/networks/net-1");
            then.status(200).json_body(json!({
                "id": "net-1",
                "name": "cust-default-net-1",
                "label": "backend",
                "default": false,
                "cidr": "10.20.0.0/24",
                "status": "Active",
                "nameservers_v4": ["8.8.8.8", "1.1.1.1"]
            }));
        })
        .await;

    let resource = NetworkResource::new(client_for(&server));
    let mut data = ResourceData::new("civo_network.backend", attrs(json!({ "label": "backend" })));
    resource.create(&mut data).await.unwrap();

    create.assert_async().await;
    let state = data.into_attributes();
    assert_eq!(state["id"], "net-1");
    assert_eq!(state["cidr_v4"], "10.20.0.0/24");
    assert_eq!(state["region"], "LON1");
    assert_eq!(state["nameservers_v4"], json!(["8.8.8.8", "1.1.1.1"]));
}

#[tokio::test]
async fn test_network_read_clears_id_when_gone() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/networks/net-1");
            then.status(404)
                .json_body(json!({ "code": "database_network_not_found", "reason": "gone" }));
        })
        .await;

    let resource = NetworkResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_network.backend",
        "net-1",
        attrs(json!({ "label": "backend" })),
    );
    resource.read(&mut data).await.unwrap();

    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_network_rename_in_place() {
    let server = MockServer::start_async().await;
    let rename = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v2/networks/net-1")
                .json_body_partial(r#"{ "label": "renamed" }"#);
            then.status(200)
                .json_body(json!({ "id": "net-1", "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/networks/net-1");
            then.status(200)
                .json_body(json!({ "id": "net-1", "label": "renamed", "cidr": "10.0.0.0/24" }));
        })
        .await;

    let resource = NetworkResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_network.backend",
        "net-1",
        attrs(json!({ "label": "backend", "cidr_v4": "10.0.0.0/24" })),
    )
    .with_config(attrs(json!({ "label": "renamed" })))
    .with_changes(["label"]);
    resource.update(&mut data).await.unwrap();

    rename.assert_async().await;
    assert_eq!(data.get_str("label"), Some("renamed"));
}

#[tokio::test]
async fn test_network_delete_retries_while_in_use() {
    let server = MockServer::start_async().await;
    let busy = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/networks/net-1");
            then.status(400).json_body(json!({
                "code": "database_network_inuse_by_instances",
                "reason": "The network is in use"
            }));
        })
        .await;

    let resource = NetworkResource::new(client_for(&server));
    let mut data = ResourceData::from_state("civo_network.backend", "net-1", Attributes::new())
        .with_timeouts(Timeouts::all(Duration::from_millis(50)));
    let err = resource.delete(&mut data).await.unwrap_err();

    assert!(matches!(err, CloudError::Timeout(_)));
    assert!(busy.hits_async().await >= 2);
}

#[tokio::test]
async fn test_network_delete_other_errors_are_not_retried() {
    let server = MockServer::start_async().await;
    let forbidden = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/networks/net-1");
            then.status(400)
                .json_body(json!({ "code": "default_network", "reason": "cannot delete the default network" }));
        })
        .await;

    let resource = NetworkResource::new(client_for(&server));
    let mut data = ResourceData::from_state("civo_network.backend", "net-1", Attributes::new());
    let err = resource.delete(&mut data).await.unwrap_err();

    forbidden.assert_hits_async(1).await;
    assert!(err.to_string().contains("default network"));
}

// ============ civo_firewall ============

#[tokio::test]
async fn test_firewall_create_reconciles_configured_rules() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/firewalls")
                .json_body_partial(r#"{ "name": "web", "create_rules": true }"#);
            then.status(200)
                .json_body(json!({ "id": "fw-1", "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/firewalls/fw-1/rules");
            then.status(200).json_body(json!([
                {
                    "id": "r-http", "firewall_id": "fw-1", "protocol": "tcp",
                    "start_port": "80", "end_port": "80", "cidr": ["0.0.0.0/0"],
                    "direction": "ingress", "action": "allow", "label": "http"
                },
                {
                    "id": "r-ssh", "firewall_id": "fw-1", "protocol": "tcp",
                    "start_port": "22", "end_port": "22", "cidr": ["0.0.0.0/0"],
                    "direction": "ingress", "action": "allow", "label": "ssh"
                },
                {
                    "id": "r-out", "firewall_id": "fw-1", "protocol": "tcp",
                    "start_port": "1", "end_port": "65535", "cidr": ["0.0.0.0/0"],
                    "direction": "egress", "action": "allow", "label": "all out"
                }
            ]));
        })
        .await;
    let remove_http = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/firewalls/fw-1/rules/r-http");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    let add_https = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/firewalls/fw-1/rules")
                .json_body_partial(
                    r#"{ "direction": "ingress", "start_port": "443", "end_port": "443", "label": "https" }"#,
                );
            then.status(200).json_body(json!({ "id": "r-https" }));
        })
        .await;
    let remove_ssh = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/firewalls/fw-1/rules/r-ssh");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    let remove_out = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/firewalls/fw-1/rules/r-out");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/firewalls/fw-1");
            then.status(200)
                .json_body(json!({ "id": "fw-1", "name": "web", "network_id": "net-1" }));
        })
        .await;

    let resource = FirewallResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_firewall.web",
        attrs(json!({
            "name": "web",
            "create_default_rules": true,
            "ingress_rule": [
                { "label": "ssh", "protocol": "tcp", "port_range": "22", "cidr": ["0.0.0.0/0"], "action": "allow" },
                { "label": "https", "protocol": "tcp", "port_range": "443", "cidr": ["0.0.0.0/0"], "action": "allow" }
            ]
        })),
    );
    resource.create(&mut data).await.unwrap();

    remove_http.assert_async().await;
    add_https.assert_async().await;
    // ssh is kept, egress is not configured and left alone
    remove_ssh.assert_hits_async(0).await;
    remove_out.assert_hits_async(0).await;

    let state = data.into_attributes();
    assert_eq!(state["network_id"], "net-1");
    assert_eq!(state["egress_rule"][0]["port_range"], "1-65535");
}

#[tokio::test]
async fn test_firewall_update_renames_and_reconciles_changed_direction_only() {
    let server = MockServer::start_async().await;
    let rename = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v2/firewalls/fw-1")
                .json_body_partial(r#"{ "name": "edge" }"#);
            then.status(200)
                .json_body(json!({ "id": "fw-1", "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/firewalls/fw-1/rules");
            then.status(200).json_body(json!([
                {
                    "id": "r-ssh", "protocol": "tcp", "start_port": "22", "end_port": "22",
                    "cidr": ["0.0.0.0/0"], "direction": "ingress", "action": "allow", "label": "ssh"
                },
                {
                    "id": "r-smtp", "protocol": "tcp", "start_port": "25", "end_port": "25",
                    "cidr": ["0.0.0.0/0"], "direction": "egress", "action": "allow", "label": "smtp"
                }
            ]));
        })
        .await;
    // removed by someone else in the meantime
    let remove_ssh = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/firewalls/fw-1/rules/r-ssh");
            then.status(404)
                .json_body(json!({ "code": "database_firewall_rule_not_found" }));
        })
        .await;
    let add_https = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/firewalls/fw-1/rules")
                .json_body_partial(
                    r#"{ "direction": "ingress", "start_port": "443", "end_port": "443", "label": "https" }"#,
                );
            then.status(200).json_body(json!({ "id": "r-https" }));
        })
        .await;
    let remove_smtp = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v2/firewalls/fw-1/rules/r-smtp");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/firewalls/fw-1");
            then.status(200)
                .json_body(json!({ "id": "fw-1", "name": "edge", "network_id": "net-1" }));
        })
        .await;

    let resource = FirewallResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_firewall.web",
        "fw-1",
        attrs(json!({
            "name": "web",
            "ingress_rule": [
                { "label": "ssh", "protocol": "tcp", "port_range": "22", "cidr": ["0.0.0.0/0"], "action": "allow" }
            ],
            "egress_rule": [
                { "label": "all out", "protocol": "tcp", "port_range": "all", "cidr": ["0.0.0.0/0"], "action": "allow" }
            ]
        })),
    )
    .with_config(attrs(json!({
        "name": "edge",
        "ingress_rule": [
            { "label": "https", "protocol": "tcp", "port_range": "443", "cidr": ["0.0.0.0/0"], "action": "allow" }
        ],
        "egress_rule": [
            { "label": "all out", "protocol": "tcp", "port_range": "all", "cidr": ["0.0.0.0/0"], "action": "allow" }
        ]
    })))
    .with_changes(["name", "ingress_rule"]);
    resource.update(&mut data).await.unwrap();

    rename.assert_async().await;
    remove_ssh.assert_async().await;
    add_https.assert_async().await;
    // egress did not change, so the drifted smtp rule is left alone
    remove_smtp.assert_hits_async(0).await;
    assert_eq!(data.get_str("name"), Some("edge"));
}

// ============ civo_instance ============

fn instance_json(status: &str) -> Value {
    json!({
        "id": "inst-1",
        "hostname": "web-1",
        "size": "g3.small",
        "status": status,
        "network_id": "net-1",
        "source_id": "ubuntu-jammy",
        "initial_user": "civo",
        "initial_password": "s3cret",
        "tags": ["web", "prod"],
        "firewall_id": "fw-1",
        "public_ip": "203.0.113.10",
        "private_ip": "10.0.0.5",
        "cpu_cores": 1,
        "ram_mb": 2048,
        "disk_gb": 25
    })
}

#[tokio::test]
async fn test_instance_create_resolves_image_and_waits_for_active() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/disk_images");
            then.status(200).json_body(json!([
                { "id": "7c0c1e4a-3b6e-4b77-9a4e-2f1f1e7d0b11", "name": "debian-11" },
                { "id": "0f5c5b66-8a3d-4f3c-a7c6-6c2a7b1c9d22", "name": "ubuntu-jammy" }
            ]));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/instances").json_body_partial(
                r#"{
                    "hostname": "web-1",
                    "size": "g3.small",
                    "template_id": "0f5c5b66-8a3d-4f3c-a7c6-6c2a7b1c9d22",
                    "tags": "prod web",
                    "region": "LON1"
                }"#,
            );
            then.status(200).json_body(instance_json("BUILDING"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/instances/inst-1");
            then.status(200).json_body(instance_json("ACTIVE"));
        })
        .await;

    let resource = InstanceResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_instance.web",
        attrs(json!({
            "hostname": "web-1",
            "size": "g3.small",
            "disk_image": "ubuntu-jammy",
            "tags": ["prod", "web"]
        })),
    );
    resource.create(&mut data).await.unwrap();

    create.assert_async().await;
    let state = data.into_attributes();
    assert_eq!(state["status"], "ACTIVE");
    assert_eq!(state["public_ip"], "203.0.113.10");
    assert_eq!(state["tags"], json!(["prod", "web"]));
    // configured spelling is kept
    assert_eq!(state["disk_image"], "ubuntu-jammy");
}

#[tokio::test]
async fn test_instance_unknown_image_fails_before_create() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/disk_images");
            then.status(200).json_body(json!([{ "id": "x", "name": "debian-11" }]));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/instances");
            then.status(200).json_body(instance_json("BUILDING"));
        })
        .await;

    let resource = InstanceResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_instance.web",
        attrs(json!({ "size": "g3.small", "disk_image": "centos-7" })),
    );
    let err = resource.create(&mut data).await.unwrap_err();

    assert!(err.to_string().contains("centos-7"));
    create.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_instance_delete_waits_until_gone() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v2/instances/inst-1")
                .query_param("region", "LON1");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/instances/inst-1");
            then.status(404).json_body(json!({ "code": "database_instance_not_found" }));
        })
        .await;

    let resource = InstanceResource::new(client_for(&server));
    let mut data = ResourceData::from_state("civo_instance.web", "inst-1", Attributes::new());
    resource.delete(&mut data).await.unwrap();

    delete.assert_async().await;
}

#[tokio::test]
async fn test_instance_update_tags_only() {
    let server = MockServer::start_async().await;
    let tags = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v2/instances/inst-1/tags")
                .json_body_partial(r#"{ "tags": "prod web" }"#);
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    let resize = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v2/instances/inst-1/resize");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/instances/inst-1");
            then.status(200).json_body(instance_json("ACTIVE"));
        })
        .await;

    let resource = InstanceResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_instance.web",
        "inst-1",
        attrs(json!({ "size": "g3.small", "tags": ["web"] })),
    )
    .with_config(attrs(json!({ "size": "g3.small", "tags": ["prod", "web"], "disk_image": "ubuntu-jammy" })))
    .with_changes(["tags"]);
    resource.update(&mut data).await.unwrap();

    tags.assert_async().await;
    resize.assert_hits_async(0).await;
}

// ============ civo_object_store ============

fn object_store_json(status: &str, max_size: i64) -> Value {
    json!({
        "id": "os-1",
        "name": "assets",
        "max_size": max_size,
        "owner_info": { "access_key_id": "AKIA1", "name": "default" },
        "objectstore_endpoint": "objectstore.lon1.civo.com",
        "status": status
    })
}

#[tokio::test]
async fn test_object_store_create_waits_for_ready() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/objectstores")
                .json_body_partial(r#"{ "name": "assets", "max_size_gb": 500, "region": "LON1" }"#);
            then.status(200).json_body(object_store_json("pending", 500));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/objectstores/os-1");
            then.status(200).json_body(object_store_json("ready", 500));
        })
        .await;

    let resource = ObjectStoreResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_object_store.assets",
        attrs(json!({ "name": "assets", "max_size_gb": 500 })),
    );
    resource.create(&mut data).await.unwrap();

    create.assert_async().await;
    poll.assert_hits_async(1).await;
    let state = data.into_attributes();
    assert_eq!(state["id"], "os-1");
    assert_eq!(state["status"], "ready");
    assert_eq!(state["access_key_id"], "AKIA1");
}

#[tokio::test]
async fn test_object_store_create_times_out_while_pending() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/objectstores");
            then.status(200).json_body(object_store_json("pending", 500));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/objectstores/os-1");
            then.status(200).json_body(object_store_json("creating", 500));
        })
        .await;

    let resource = ObjectStoreResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_object_store.assets",
        attrs(json!({ "name": "assets", "max_size_gb": 500 })),
    )
    .with_timeouts(Timeouts::all(Duration::from_millis(50)));
    let err = resource.create(&mut data).await.unwrap_err();

    match err {
        CloudError::Timeout(message) => assert!(message.contains("creating")),
        other => panic!("Expected timeout, got {:?}", other),
    }
    assert!(poll.hits_async().await >= 2);
    // the bucket exists remotely, so the ID is kept for a later replace
    assert_eq!(data.id(), Some("os-1"));
}

#[tokio::test]
async fn test_object_store_resize_waits_for_ready() {
    let server = MockServer::start_async().await;
    let resize = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v2/objectstores/os-1")
                .json_body_partial(r#"{ "max_size_gb": 1000 }"#);
            then.status(200).json_body(object_store_json("pending", 1000));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/objectstores/os-1");
            then.status(200).json_body(object_store_json("ready", 1000));
        })
        .await;

    let resource = ObjectStoreResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_object_store.assets",
        "os-1",
        attrs(json!({ "name": "assets", "max_size_gb": 500 })),
    )
    .with_config(attrs(json!({ "name": "assets", "max_size_gb": 1000 })))
    .with_changes(["max_size_gb"]);
    resource.update(&mut data).await.unwrap();

    resize.assert_async().await;
    // once for the wait, once for the final read
    poll.assert_hits_async(2).await;
    assert_eq!(data.get_i64("max_size_gb"), Some(1000));
}

// ============ civo_volume_attachment ============

fn volume_json(status: &str, instance_id: &str) -> Value {
    json!({
        "id": "vol-1",
        "name": "data",
        "instance_id": instance_id,
        "network_id": "net-1",
        "size_gigabytes": 50,
        "status": status
    })
}

#[tokio::test]
async fn test_volume_attachment_waits_for_attached() {
    let server = MockServer::start_async().await;
    let attach = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v2/volumes/vol-1/attach")
                .json_body_partial(r#"{ "instance_id": "inst-1", "region": "LON1" }"#);
            then.status(200)
                .json_body(json!({ "id": "vol-1", "result": "success" }));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/volumes/vol-1");
            then.status(200).json_body(volume_json("attached", "inst-1"));
        })
        .await;

    let resource = VolumeAttachmentResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_volume_attachment.data",
        attrs(json!({ "volume_id": "vol-1", "instance_id": "inst-1" })),
    );
    resource.create(&mut data).await.unwrap();

    attach.assert_async().await;
    poll.assert_hits_async(2).await;
    assert_eq!(data.id(), Some("vol-1"));
    assert_eq!(data.get_str("instance_id"), Some("inst-1"));
}

#[tokio::test]
async fn test_volume_attachment_times_out_while_attaching() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v2/volumes/vol-1/attach");
            then.status(200)
                .json_body(json!({ "id": "vol-1", "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/volumes/vol-1");
            then.status(200).json_body(volume_json("attaching", "inst-1"));
        })
        .await;

    let resource = VolumeAttachmentResource::new(client_for(&server));
    let mut data = ResourceData::new(
        "civo_volume_attachment.data",
        attrs(json!({ "volume_id": "vol-1", "instance_id": "inst-1" })),
    )
    .with_timeouts(Timeouts::all(Duration::from_millis(50)));
    let err = resource.create(&mut data).await.unwrap_err();

    assert!(matches!(err, CloudError::Timeout(_)));
}

#[tokio::test]
async fn test_volume_attachment_detach_waits_for_available() {
    let server = MockServer::start_async().await;
    let detach = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v2/volumes/vol-1/detach");
            then.status(200)
                .json_body(json!({ "id": "vol-1", "result": "success" }));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/volumes/vol-1");
            then.status(200).json_body(volume_json("available", ""));
        })
        .await;

    let resource = VolumeAttachmentResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_volume_attachment.data",
        "vol-1",
        attrs(json!({ "volume_id": "vol-1", "instance_id": "inst-1" })),
    );
    resource.delete(&mut data).await.unwrap();

    detach.assert_async().await;
    poll.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_volume_attachment_detach_unexpected_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v2/volumes/vol-1/detach");
            then.status(200)
                .json_body(json!({ "id": "vol-1", "result": "success" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/volumes/vol-1");
            then.status(200).json_body(volume_json("error", "inst-1"));
        })
        .await;

    let resource = VolumeAttachmentResource::new(client_for(&server));
    let mut data = ResourceData::from_state("civo_volume_attachment.data", "vol-1", Attributes::new());
    let err = resource.delete(&mut data).await.unwrap_err();

    assert!(matches!(
        err,
        CloudError::UnexpectedState { ref status, .. } if status == "error"
    ));
}

// ============ civo_volume ============

#[tokio::test]
async fn test_volume_shrink_is_rejected() {
    let server = MockServer::start_async().await;
    let resize = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v2/volumes/vol-1/resize");
            then.status(200).json_body(json!({ "result": "success" }));
        })
        .await;

    let resource = VolumeResource::new(client_for(&server));
    let mut data = ResourceData::from_state(
        "civo_volume.data",
        "vol-1",
        attrs(json!({ "name": "data", "size_gb": 50 })),
    )
    .with_config(attrs(json!({ "name": "data", "size_gb": 20 })))
    .with_changes(["size_gb"]);
    let err = resource.update(&mut data).await.unwrap_err();

    assert!(err.to_string().contains("cannot be reduced"));
    resize.assert_hits_async(0).await;
}

// ============ civo_dns_domain_record ============

#[tokio::test]
async fn test_dns_record_import() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/dns/dom-1/records/rec-1");
            then.status(200).json_body(json!({
                "id": "rec-1",
                "domain_id": "dom-1",
                "name": "www",
                "value": "203.0.113.10",
                "type": "A",
                "priority": 0,
                "ttl": 600
            }));
        })
        .await;

    let resource = DnsRecordResource::new(client_for(&server));
    let mut data = ResourceData::new("civo_dns_domain_record.www", Attributes::new());
    resource.import("dom-1:rec-1", &mut data).await.unwrap();

    let state = data.into_attributes();
    assert_eq!(state["id"], "rec-1");
    assert_eq!(state["domain_id"], "dom-1");
    assert_eq!(state["type"], "A");
}

// ============ data sources ============

#[tokio::test]
async fn test_network_lookup_by_label() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/networks");
            then.status(200).json_body(json!([
                { "id": "net-default", "label": "default", "default": true, "cidr": "192.168.1.0/24" },
                { "id": "net-2", "label": "backend", "cidr": "10.0.0.0/24" }
            ]));
        })
        .await;

    let data_source = LookupDataSource::new(client_for(&server), NetworkLookup);
    let mut data = ResourceData::new("data.civo_network.backend", attrs(json!({ "label": "backend" })));
    data_source.read(&mut data).await.unwrap();

    let state = data.into_attributes();
    assert_eq!(state["id"], "net-2");
    assert_eq!(state["cidr_v4"], "10.0.0.0/24");
}

#[tokio::test]
async fn test_network_lookup_missing_label() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/networks");
            then.status(200).json_body(json!([]));
        })
        .await;

    let data_source = LookupDataSource::new(client_for(&server), NetworkLookup);
    let mut data = ResourceData::new("data.civo_network.x", attrs(json!({ "label": "nope" })));
    let err = data_source.read(&mut data).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_object_store_lookup_walks_pages() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/objectstores").query_param("page", "1");
            then.status(200).json_body(json!({
                "page": 1, "pages": 2,
                "items": [{ "id": "os-1", "name": "logs", "status": "ready" }]
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/objectstores").query_param("page", "2");
            then.status(200).json_body(json!({
                "page": 2, "pages": 2,
                "items": [{
                    "id": "os-2", "name": "assets", "max_size": 1000, "status": "ready",
                    "objectstore_endpoint": "objectstore.lon1.civo.com"
                }]
            }));
        })
        .await;

    let data_source = LookupDataSource::new(client_for(&server), ObjectStoreLookup);
    let mut data = ResourceData::new("data.civo_object_store.assets", attrs(json!({ "name": "assets" })));
    data_source.read(&mut data).await.unwrap();

    second.assert_async().await;
    let state = data.into_attributes();
    assert_eq!(state["id"], "os-2");
    assert_eq!(state["max_size_gb"], 1000);
    assert_eq!(state["bucket_url"], "https://objectstore.lon1.civo.com/assets");
}

#[tokio::test]
async fn test_disk_image_lookup() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/disk_images");
            then.status(200).json_body(json!([
                { "id": "img-1", "name": "ubuntu-jammy", "version": "22.04", "distribution": "ubuntu", "state": "available" }
            ]));
        })
        .await;

    let data_source = DiskImageDataSource::new(client_for(&server));
    let mut data = ResourceData::new("data.civo_disk_image.ubuntu", attrs(json!({ "name": "ubuntu-jammy" })));
    data_source.read(&mut data).await.unwrap();

    let state = data.into_attributes();
    assert_eq!(state["id"], "img-1");
    assert_eq!(state["version"], "22.04");
    assert_eq!(state["distribution"], "ubuntu");
}

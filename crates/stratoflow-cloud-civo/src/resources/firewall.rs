//! `civo_firewall`: firewalls and their rule sets
//!
//! Rules are separate API objects. Updates diff the remote rules of each
//! changed direction against the desired blocks, delete the stale ones
//! and add the missing ones. A direction without any block in the
//! configuration is left alone (e.g. the default rules Civo creates).

use super::{delete_when_free, fetch, region_attribute, scoped};
use crate::client::CivoClient;
use crate::models::{
    CreateFirewallRequest, Firewall, FirewallRule, SimpleResponse, UpdateFirewallRequest,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use stratoflow_cloud::validation::{cidr_v4, port_range, string_in};
use stratoflow_cloud::{
    Attribute, AttributeType, Resource, ResourceData, Result, Schema, diff_sets,
};
use stratoflow_core::{Attributes, Operation};
use tracing::{debug, info};

pub const DIRECTIONS: [(&str, &str); 2] = [("ingress", "ingress_rule"), ("egress", "egress_rule")];

pub struct FirewallResource {
    client: Arc<CivoClient>,
}

impl FirewallResource {
    pub fn new(client: Arc<CivoClient>) -> Self {
        Self { client }
    }
}

fn rule_schema() -> Schema {
    Schema::new()
        .attribute("id", Attribute::string().computed())
        .attribute("label", Attribute::string().optional())
        .attribute(
            "protocol",
            Attribute::string()
                .optional()
                .default("tcp")
                .validate_with(string_in(&["tcp", "udp", "icmp"])),
        )
        .attribute(
            "port_range",
            Attribute::string()
                .optional()
                .validate_with(port_range())
                .description("\"80\", \"1-65535\" or \"all\""),
        )
        .attribute(
            "cidr",
            Attribute::set(AttributeType::String)
                .required()
                .validate_with(cidr_v4()),
        )
        .attribute(
            "action",
            Attribute::string()
                .optional()
                .default("allow")
                .validate_with(string_in(&["allow", "deny"])),
        )
}

pub(crate) fn firewall_schema() -> Schema {
    Schema::new()
        .describe("A firewall with ingress and egress rules")
        .attribute("name", Attribute::string().required())
        .attribute(
            "network_id",
            Attribute::string().optional().computed().force_new(),
        )
        .attribute("region", region_attribute())
        .attribute(
            "create_default_rules",
            Attribute::bool()
                .optional()
                .default(true)
                .force_new()
                .description("Let Civo create its default rules"),
        )
        .attribute(
            "ingress_rule",
            Attribute::block(rule_schema()).optional().computed(),
        )
        .attribute(
            "egress_rule",
            Attribute::block(rule_schema()).optional().computed(),
        )
}

/// Split a port range into start and end port
///
/// Empty and `all` mean every port.
pub fn split_port_range(range: &str) -> (String, String) {
    match range.trim() {
        "" | "all" => ("1".to_string(), "65535".to_string()),
        r => match r.split_once('-') {
            Some((start, end)) => (start.trim().to_string(), end.trim().to_string()),
            None => (r.to_string(), r.to_string()),
        },
    }
}

/// Port range as shown in configuration
pub fn join_port_range(start: &str, end: &str) -> String {
    if end.is_empty() || start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// direction, protocol, (start, end), sorted cidr, action, label
pub type RuleKey = (String, String, (String, String), Vec<String>, String, String);

/// Identity of a rule for reconciliation
pub fn rule_key(rule: &FirewallRule) -> RuleKey {
    let end = if rule.end_port.is_empty() {
        rule.start_port.clone()
    } else {
        rule.end_port.clone()
    };
    let ports = if rule.start_port.is_empty() {
        split_port_range("")
    } else {
        (rule.start_port.clone(), end)
    };

    let mut cidr = rule.cidr.clone();
    cidr.sort();

    (
        rule.direction.to_lowercase(),
        rule.protocol.to_lowercase(),
        ports,
        cidr,
        rule.action.to_lowercase(),
        rule.label.clone(),
    )
}

/// Desired rule from a configuration block
pub fn rule_from_block(direction: &str, block: &Attributes) -> FirewallRule {
    let text = |key: &str| {
        block
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let (start_port, end_port) = split_port_range(&text("port_range"));
    let cidr = match block.get("cidr") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    };
    let protocol = text("protocol");
    let action = text("action");

    FirewallRule {
        protocol: if protocol.is_empty() { "tcp".into() } else { protocol },
        start_port,
        end_port,
        cidr,
        direction: direction.to_string(),
        action: if action.is_empty() { "allow".into() } else { action },
        label: text("label"),
        ..FirewallRule::default()
    }
}

/// `port_range` keeps the spelling already known for the same rule
/// (`"all"` stays `"all"`)
fn flatten_rule(rule: &FirewallRule, known_ranges: &[(RuleKey, String)]) -> Value {
    let key = rule_key(rule);
    let port_range = known_ranges
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, range)| range.clone())
        .unwrap_or_else(|| join_port_range(&rule.start_port, &rule.end_port));

    let mut cidr = rule.cidr.clone();
    cidr.sort();

    json!({
        "id": rule.id,
        "label": rule.label,
        "protocol": rule.protocol,
        "port_range": port_range,
        "cidr": cidr,
        "action": rule.action,
    })
}

pub(crate) fn flatten_firewall(
    data: &mut ResourceData,
    firewall: &Firewall,
    rules: &[FirewallRule],
    region: &str,
) {
    data.set_id(&firewall.id);
    data.set("name", firewall.name.clone());
    data.set("network_id", firewall.network_id.clone());
    data.set("region", region);

    for (direction, key) in DIRECTIONS {
        let known_ranges: Vec<(RuleKey, String)> = data
            .get_blocks(key)
            .into_iter()
            .filter_map(|block| {
                let range = block.get("port_range")?.as_str()?.to_string();
                Some((rule_key(&rule_from_block(direction, block)), range))
            })
            .collect();

        let blocks: Vec<Value> = rules
            .iter()
            .filter(|r| r.direction.eq_ignore_ascii_case(direction))
            .map(|r| flatten_rule(r, &known_ranges))
            .collect();
        data.set(key, blocks);
    }
}

pub(crate) fn rules_path(firewall_id: &str) -> String {
    format!("firewalls/{}/rules", firewall_id)
}

/// Bring the remote rules of the given directions in line
///
/// Stale rules are removed before missing ones are added.
async fn reconcile_rules(
    client: &CivoClient,
    firewall_id: &str,
    data: &ResourceData,
    directions: &[(&str, &str)],
) -> Result<()> {
    let current: Vec<FirewallRule> = client.get(&rules_path(firewall_id)).await?;

    for &(direction, key) in directions {
        if !data.is_configured(key) {
            debug!("No {} configured, leaving remote rules alone", key);
            continue;
        }

        let remote: Vec<FirewallRule> = current
            .iter()
            .filter(|r| r.direction.eq_ignore_ascii_case(direction))
            .cloned()
            .collect();
        let desired: Vec<FirewallRule> = data
            .get_blocks(key)
            .into_iter()
            .map(|block| rule_from_block(direction, block))
            .collect();

        let diff = diff_sets(remote, desired, rule_key);
        if diff.is_empty() {
            continue;
        }

        info!(
            "Firewall {}: removing {} and adding {} {} rules",
            firewall_id,
            diff.to_remove.len(),
            diff.to_add.len(),
            direction
        );

        for rule in &diff.to_remove {
            client
                .delete(&format!("{}/{}", rules_path(firewall_id), rule.id))
                .await
                .or_else(|e| if e.is_not_found() { Ok(()) } else { Err(e) })?;
        }
        for rule in &diff.to_add {
            let _: FirewallRule = client.post(&rules_path(firewall_id), rule).await?;
        }
    }

    Ok(())
}

#[async_trait]
impl Resource for FirewallResource {
    fn type_name(&self) -> &'static str {
        "civo_firewall"
    }

    fn schema(&self) -> Schema {
        firewall_schema()
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let request = CreateFirewallRequest {
            name: data.require_str("name")?.to_string(),
            network_id: data.get_str("network_id").map(str::to_string),
            create_rules: data.get_bool("create_default_rules").unwrap_or(true),
        };

        info!("Creating firewall {}", request.name);
        let created: SimpleResponse = client.post("firewalls", &request).await?;
        data.set_id(&created.id);

        reconcile_rules(&client, &created.id, data, &DIRECTIONS).await?;
        self.read(data).await
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        let Some(firewall) = fetch::<Firewall>(&client, &format!("firewalls/{}", id)).await? else {
            data.clear_id();
            return Ok(());
        };
        let rules: Vec<FirewallRule> = client.get(&rules_path(&id)).await?;

        flatten_firewall(data, &firewall, &rules, client.region());
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        if data.has_change("name") {
            let request = UpdateFirewallRequest {
                name: data.require_str("name")?.to_string(),
            };
            let _: SimpleResponse = client.put(&format!("firewalls/{}", id), &request).await?;
        }

        let changed: Vec<(&str, &str)> = DIRECTIONS
            .into_iter()
            .filter(|(_, key)| data.has_change(key))
            .collect();
        if !changed.is_empty() {
            reconcile_rules(&client, &id, data, &changed).await?;
        }

        self.read(data).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let client = scoped(&self.client, data);
        let id = data.require_id()?.to_string();

        info!("Deleting firewall {}", id);
        delete_when_free(&client, &format!("firewalls/{}", id), data.timeout(Operation::Delete))
            .await
    }
}

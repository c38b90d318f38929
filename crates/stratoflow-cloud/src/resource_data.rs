//! Attribute access for resource operations
//!
//! `ResourceData` is what a resource implementation works with during
//! create/read/update/delete. Lookups prefer values set during the current
//! operation, then the configuration, then the prior state.

use crate::error::{CloudError, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use stratoflow_core::{Attributes, Operation, Timeouts};

/// Timeout used when neither the block nor the resource declares one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    address: String,
    id: Option<String>,
    config: Attributes,
    state: Attributes,
    new: Attributes,
    changes: BTreeSet<String>,
    timeouts: Timeouts,
}

impl ResourceData {
    /// Data for a resource that does not exist yet (or a data source read)
    pub fn new(address: impl Into<String>, config: Attributes) -> Self {
        Self {
            address: address.into(),
            config,
            ..Self::default()
        }
    }

    /// Data for an existing resource known only from state
    pub fn from_state(address: impl Into<String>, id: impl Into<String>, state: Attributes) -> Self {
        Self {
            address: address.into(),
            id: Some(id.into()),
            state,
            ..Self::default()
        }
    }

    /// Desired configuration on top of an existing resource
    pub fn with_config(mut self, config: Attributes) -> Self {
        self.config = config;
        self
    }

    /// Attributes the plan found changed
    pub fn with_changes<I, S>(mut self, changes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changes = changes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// ID of an existing resource
    pub fn require_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .ok_or_else(|| CloudError::StateError(format!("{} has no ID", self.address)))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the resource as gone (read found nothing)
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        [&self.new, &self.config, &self.state]
            .into_iter()
            .find_map(|attrs| attrs.get(key).filter(|v| !v.is_null()))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| {
            CloudError::InvalidConfig(format!("{}: \"{}\" is required", self.address, key))
        })
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// String list (a single string counts as a one-element list)
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Nested blocks (`ingress_rule { ... }`)
    pub fn get_blocks(&self, key: &str) -> Vec<&Attributes> {
        match self.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            Some(Value::Object(map)) => vec![map],
            _ => Vec::new(),
        }
    }

    /// Whether the configuration sets the attribute at all
    pub fn is_configured(&self, key: &str) -> bool {
        self.config.get(key).is_some_and(|v| !v.is_null())
    }

    /// Whether the plan found this attribute changed
    pub fn has_change(&self, key: &str) -> bool {
        self.changes.contains(key)
    }

    /// (old, new) value of an attribute
    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (
            self.state.get(key).filter(|v| !v.is_null()),
            self.config.get(key).filter(|v| !v.is_null()),
        )
    }

    /// Record an attribute value (read results, computed values)
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.new.insert(key.into(), value.into());
    }

    pub fn timeout(&self, op: Operation) -> Duration {
        self.timeouts.get(op).unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Attributes to store in state after the operation
    ///
    /// Prior state, overlaid with the configuration, overlaid with the values
    /// set during the operation.
    pub fn into_attributes(self) -> Attributes {
        let mut attributes = self.state;
        attributes.extend(self.config);
        attributes.extend(self.new);
        if let Some(id) = self.id {
            attributes.insert("id".to_string(), Value::String(id));
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_lookup_precedence() {
        let mut data = ResourceData::from_state(
            "civo_volume.data",
            "vol-1",
            attrs(json!({"name": "old", "size_gb": 10, "region": "LON1"})),
        )
        .with_config(attrs(json!({"name": "new", "size_gb": 20})));

        assert_eq!(data.get_str("name"), Some("new"));
        assert_eq!(data.get_str("region"), Some("LON1"));

        data.set("size_gb", 25);
        assert_eq!(data.get_i64("size_gb"), Some(25));
    }

    #[test]
    fn test_string_list_and_blocks() {
        let data = ResourceData::new(
            "civo_firewall.web",
            attrs(json!({
                "tags": "web",
                "ingress_rule": [{"port_range": "80"}, {"port_range": "443"}]
            })),
        );

        assert_eq!(data.get_string_list("tags"), vec!["web"]);
        assert_eq!(data.get_blocks("ingress_rule").len(), 2);
        assert!(data.get_blocks("egress_rule").is_empty());
    }

    #[test]
    fn test_changes() {
        let data = ResourceData::from_state("civo_network.main", "net-1", attrs(json!({"label": "a"})))
            .with_config(attrs(json!({"label": "b"})))
            .with_changes(["label"]);

        assert!(data.has_change("label"));
        assert!(!data.has_change("region"));
        assert_eq!(data.get_change("label"), (Some(&json!("a")), Some(&json!("b"))));
    }

    #[test]
    fn test_into_attributes() {
        let mut data = ResourceData::new("civo_network.main", attrs(json!({"label": "net"})));
        data.set_id("net-1");
        data.set("cidr_v4", "192.168.1.0/24");

        let attributes = data.into_attributes();
        assert_eq!(attributes["id"], json!("net-1"));
        assert_eq!(attributes["label"], json!("net"));
        assert_eq!(attributes["cidr_v4"], json!("192.168.1.0/24"));
    }

    #[test]
    fn test_missing_id_and_timeout() {
        let mut data = ResourceData::new("civo_network.main", Attributes::new());
        assert!(data.require_id().is_err());

        data.set_id("x");
        data.clear_id();
        assert_eq!(data.id(), None);
        assert_eq!(data.timeout(Operation::Create), DEFAULT_TIMEOUT);

        let data = data.with_timeouts(Timeouts::all(Duration::from_secs(60)));
        assert_eq!(data.timeout(Operation::Delete), Duration::from_secs(60));
    }
}

//! Resource and data source schemas
//!
//! A schema declares every attribute a block accepts or exposes. It is used
//! to validate configuration, to normalize it into a canonical form and to
//! compute the attribute-level diff between configuration and state.

use crate::diagnostics::{Diagnostic, Diagnostics};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use stratoflow_core::{Attributes, contains_unknown, is_unknown};

/// Value check run after the type check passes
///
/// For list and set attributes the validator runs once per element.
pub type Validator = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// Attribute value type
#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered, deduplicated collection
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Repeated nested block (`ingress_rule { ... }`)
    Block(Box<Schema>),
}

impl AttributeType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Int => value.is_i64() || value.is_u64(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::List(elem) | AttributeType::Set(elem) => match value {
                Value::Array(items) => items.iter().all(|v| elem.matches(v)),
                scalar => elem.matches(scalar),
            },
            AttributeType::Map(elem) => match value {
                Value::Object(map) => map.values().all(|v| elem.matches(v)),
                _ => false,
            },
            AttributeType::Block(_) => match value {
                Value::Array(items) => items.iter().all(Value::is_object),
                other => other.is_object(),
            },
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Int => write!(f, "number"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::List(elem) => write!(f, "list({})", elem),
            AttributeType::Set(elem) => write!(f, "set({})", elem),
            AttributeType::Map(elem) => write!(f, "map({})", elem),
            AttributeType::Block(_) => write!(f, "block"),
        }
    }
}

/// A single attribute definition
#[derive(Clone)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    /// Set by the provider after create/read
    pub computed: bool,
    /// Changing the value requires destroying and re-creating the resource
    pub force_new: bool,
    /// Value is masked in plan output
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: String,
    validators: Vec<Validator>,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("attr_type", &self.attr_type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("force_new", &self.force_new)
            .field("sensitive", &self.sensitive)
            .field("default", &self.default)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl Attribute {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: String::new(),
            validators: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    pub fn int() -> Self {
        Self::new(AttributeType::Int)
    }

    pub fn bool() -> Self {
        Self::new(AttributeType::Bool)
    }

    pub fn list(elem: AttributeType) -> Self {
        Self::new(AttributeType::List(Box::new(elem)))
    }

    pub fn set(elem: AttributeType) -> Self {
        Self::new(AttributeType::Set(Box::new(elem)))
    }

    pub fn map(elem: AttributeType) -> Self {
        Self::new(AttributeType::Map(Box::new(elem)))
    }

    pub fn block(schema: Schema) -> Self {
        Self::new(AttributeType::Block(Box::new(schema)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Default value (implies optional)
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.optional()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Only the provider can set this attribute
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Human readable mode for schema listings
    pub fn mode(&self) -> &'static str {
        match (self.required, self.optional, self.computed) {
            (true, _, _) => "required",
            (false, true, true) => "optional, computed",
            (false, true, false) => "optional",
            _ => "computed",
        }
    }

    fn validate_value(&self, value: &Value, path: &str, diags: &mut Diagnostics) {
        if contains_unknown(value) {
            return;
        }

        if !self.attr_type.matches(value) {
            diags.push(
                Diagnostic::error("Incorrect attribute value type")
                    .with_attribute(path)
                    .with_detail(format!("expected {}", self.attr_type)),
            );
            return;
        }

        match &self.attr_type {
            AttributeType::Block(schema) => {
                for (i, item) in as_items(value).into_iter().enumerate() {
                    if let Value::Object(map) = item {
                        schema.validate_at(map, &format!("{}.{}", path, i), diags);
                    }
                }
            }
            AttributeType::List(_) | AttributeType::Set(_) => {
                for item in as_items(value) {
                    self.run_validators(item, path, diags);
                }
            }
            _ => self.run_validators(value, path, diags),
        }
    }

    fn run_validators(&self, value: &Value, path: &str, diags: &mut Diagnostics) {
        for validator in &self.validators {
            if let Err(message) = validator(value) {
                diags.push(
                    Diagnostic::error("Invalid attribute value")
                        .with_attribute(path)
                        .with_detail(message),
                );
            }
        }
    }

    fn normalize_value(&self, value: &Value) -> Value {
        if is_unknown(value) {
            return value.clone();
        }

        match &self.attr_type {
            AttributeType::List(_) => Value::Array(as_items(value).into_iter().cloned().collect()),
            AttributeType::Set(_) => Value::Array(sorted_set(value)),
            AttributeType::Block(schema) => Value::Array(
                as_items(value)
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Value::Object(schema.normalize(map)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    fn values_equal(&self, desired: &Value, current: &Value) -> bool {
        match &self.attr_type {
            AttributeType::Set(_) => sorted_set(desired) == sorted_set(current),
            AttributeType::List(_) => as_items(desired) == as_items(current),
            AttributeType::Block(schema) => blocks_equal(schema, desired, current),
            AttributeType::Int => match (desired.as_i64(), current.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => desired == current,
            },
            _ => desired == current,
        }
    }
}

/// A schema for a resource, data source or nested block
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub description: String,
    attributes: BTreeMap<String, Attribute>,
    exactly_one_of: Vec<Vec<String>>,
    conflicts: Vec<(String, String)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Exactly one of the named attributes must be set
    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// The two attributes cannot be set together
    pub fn conflicts_with(mut self, a: &str, b: &str) -> Self {
        self.conflicts.push((a.to_string(), b.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.attributes.iter()
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|a| a.sensitive)
    }

    /// Validate a (normalized) configuration
    pub fn validate(&self, config: &Attributes) -> Diagnostics {
        let mut diags = Diagnostics::new();
        self.validate_at(config, "", &mut diags);
        diags
    }

    fn validate_at(&self, config: &Attributes, prefix: &str, diags: &mut Diagnostics) {
        for key in config.keys() {
            if !self.attributes.contains_key(key) {
                diags.push(
                    Diagnostic::error("Unsupported argument")
                        .with_attribute(join_path(prefix, key))
                        .with_detail(format!("An argument named \"{}\" is not expected here", key)),
                );
            }
        }

        for (name, attribute) in &self.attributes {
            let path = join_path(prefix, name);
            match config.get(name).filter(|v| !v.is_null()) {
                None if attribute.required => diags.push(
                    Diagnostic::error("Missing required argument")
                        .with_attribute(&path)
                        .with_detail(format!("The argument \"{}\" is required", name)),
                ),
                None => {}
                Some(_) if attribute.is_computed_only() => diags.push(
                    Diagnostic::error("Value for unconfigurable attribute")
                        .with_attribute(&path)
                        .with_detail(format!(
                            "\"{}\" is computed by the provider and cannot be set",
                            name
                        )),
                ),
                Some(value) => attribute.validate_value(value, &path, diags),
            }
        }

        let is_set = |name: &String| config.get(name).is_some_and(|v| !v.is_null());

        for group in &self.exactly_one_of {
            let set: Vec<&String> = group.iter().filter(|n| is_set(*n)).collect();
            if set.len() != 1 {
                let names: Vec<String> = group.iter().map(|n| format!("\"{}\"", n)).collect();
                diags.push(
                    Diagnostic::error("Invalid combination of arguments")
                        .with_attribute(join_path(prefix, &group[0]))
                        .with_detail(format!("exactly one of {} must be specified", names.join(", "))),
                );
            }
        }

        for (a, b) in &self.conflicts {
            if is_set(a) && is_set(b) {
                diags.push(
                    Diagnostic::error("Conflicting configuration arguments")
                        .with_attribute(join_path(prefix, a))
                        .with_detail(format!("\"{}\" cannot be specified when \"{}\" is set", a, b)),
                );
            }
        }
    }

    /// Canonical form of a configuration
    ///
    /// - scalars given to list/set attributes become single-item lists
    /// - set values are sorted and deduplicated
    /// - a single nested block becomes a one-element list
    /// - defaults are filled in
    pub fn normalize(&self, config: &Attributes) -> Attributes {
        let mut normalized = Attributes::new();

        for (key, value) in config {
            let value = match self.attributes.get(key) {
                Some(attribute) if !value.is_null() => attribute.normalize_value(value),
                _ => value.clone(),
            };
            normalized.insert(key.clone(), value);
        }

        for (name, attribute) in &self.attributes {
            if let Some(default) = &attribute.default
                && normalized.get(name).is_none_or(Value::is_null)
            {
                normalized.insert(name.clone(), default.clone());
            }
        }

        normalized
    }

    /// Attribute-level diff between a normalized configuration and state
    ///
    /// Attributes absent from the configuration only count as changed when
    /// they are plain optional attributes; optional+computed attributes keep
    /// whatever the provider reported.
    pub fn diff(&self, config: &Attributes, state: &Attributes) -> Vec<AttributeChange> {
        let mut changes = Vec::new();

        for (name, attribute) in &self.attributes {
            if attribute.is_computed_only() {
                continue;
            }

            let new = config.get(name).filter(|v| !is_empty_value(v));
            let old = state.get(name).filter(|v| !is_empty_value(v));

            let changed = match (new, old) {
                (Some(n), _) if contains_unknown(n) => true,
                (Some(n), Some(o)) => !attribute.values_equal(n, o),
                (Some(_), None) => true,
                (None, Some(_)) => !attribute.computed,
                (None, None) => false,
            };

            if changed {
                changes.push(AttributeChange {
                    attribute: name.clone(),
                    old: old.cloned(),
                    new: new.cloned(),
                    force_new: attribute.force_new,
                    sensitive: attribute.sensitive,
                });
            }
        }

        changes
    }
}

/// A single attribute difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
    pub force_new: bool,
    pub sensitive: bool,
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sorted_set(value: &Value) -> Vec<Value> {
    let mut items: Vec<Value> = as_items(value).into_iter().cloned().collect();
    items.sort_by_key(sort_key);
    items.dedup();
    items
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Desired blocks match current blocks as a multiset, comparing only the
/// fields present in each desired block
fn blocks_equal(schema: &Schema, desired: &Value, current: &Value) -> bool {
    let desired = as_items(desired);
    let current = as_items(current);
    if desired.len() != current.len() {
        return false;
    }

    let mut used = vec![false; current.len()];
    for d in desired {
        let found = current
            .iter()
            .enumerate()
            .position(|(i, c)| !used[i] && block_matches(schema, d, c));
        match found {
            Some(i) => used[i] = true,
            None => return false,
        }
    }
    true
}

fn block_matches(schema: &Schema, desired: &Value, current: &Value) -> bool {
    let (Value::Object(d), Value::Object(c)) = (desired, current) else {
        return desired == current;
    };

    d.iter().filter(|(_, v)| !is_empty_value(v)).all(|(key, value)| {
        let Some(other) = c.get(key).filter(|v| !is_empty_value(v)) else {
            return false;
        };
        match schema.get(key) {
            Some(attribute) => attribute.values_equal(value, other),
            None => value == other,
        }
    })
}

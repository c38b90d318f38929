//! `${...}` 参照式
//!
//! - `${civo_network.main.id}` : リソースの属性
//! - `${data.civo_size.small.sizes.0.name}` : データソースの属性（数字はリスト添字）
//! - `${var.NAME}` / `${env.NAME}` : 変数（ロード時に展開、ここでは扱わない）
//!
//! 文字列全体が1つの参照なら参照先の値の型を保つ。
//! 文字列の一部に埋め込まれた参照は文字列として展開する。

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// apply するまで確定しない値
pub const UNKNOWN_VALUE: &str = "(known after apply)";

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*([^}\s]+)\s*\}").expect("valid reference pattern"));

/// ブロックの属性への参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// 参照先アドレス（civo_network.main / data.civo_size.small）
    pub address: String,

    /// 属性パス（["id"] / ["sizes", "0", "name"]）
    pub path: Vec<String>,
}

impl Reference {
    /// 参照式（`${}` の中身）をパースする
    ///
    /// 変数参照（var./env.）や形式不正の場合はNone
    pub fn parse(expr: &str) -> Option<Self> {
        let parts: Vec<&str> = expr.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        match parts.first().copied() {
            Some("var") | Some("env") => None,
            Some("data") if parts.len() >= 4 => Some(Self {
                address: parts[..3].join("."),
                path: parts[3..].iter().map(|s| s.to_string()).collect(),
            }),
            Some("data") => None,
            Some(_) if parts.len() >= 3 => Some(Self {
                address: parts[..2].join("."),
                path: parts[2..].iter().map(|s| s.to_string()).collect(),
            }),
            _ => None,
        }
    }

    /// 属性マップから参照先の値を取り出す
    pub fn lookup<'a>(&self, attributes: &'a Value) -> Option<&'a Value> {
        let mut current = attributes;
        for segment in &self.path {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.address, self.path.join("."))
    }
}

/// 値に含まれる全てのブロック参照を列挙する
pub fn references_in(value: &Value) -> Vec<Reference> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<Reference>) {
    match value {
        Value::String(s) => {
            for caps in REFERENCE_PATTERN.captures_iter(s) {
                if let Some(reference) = Reference::parse(&caps[1])
                    && !found.contains(&reference)
                {
                    found.push(reference);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

/// 参照を解決した値を返す
///
/// `lookup` が None を返した参照は未確定値（UNKNOWN_VALUE）になる
pub fn resolve_references<F>(value: &Value, lookup: &F) -> Value
where
    F: Fn(&Reference) -> Option<Value>,
{
    match value {
        Value::String(s) => resolve_string(s, lookup),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_references(v, lookup)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_references(v, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_string<F>(s: &str, lookup: &F) -> Value
where
    F: Fn(&Reference) -> Option<Value>,
{
    // 文字列全体が1つの参照
    if let Some(caps) = REFERENCE_PATTERN.captures(s)
        && caps.get(0).map(|m| m.as_str()) == Some(s)
    {
        return match Reference::parse(&caps[1]) {
            Some(reference) => lookup(&reference).unwrap_or_else(unknown),
            None => Value::String(s.to_string()),
        };
    }

    let mut any_unknown = false;
    let replaced = REFERENCE_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let Some(reference) = Reference::parse(&caps[1]) else {
            return caps[0].to_string();
        };
        match lookup(&reference) {
            Some(Value::String(text)) if text != UNKNOWN_VALUE => text,
            Some(Value::Null) => String::new(),
            Some(Value::String(_)) | None => {
                any_unknown = true;
                String::new()
            }
            Some(other) => other.to_string(),
        }
    });

    if any_unknown {
        unknown()
    } else {
        Value::String(replaced.into_owned())
    }
}

fn unknown() -> Value {
    Value::String(UNKNOWN_VALUE.to_string())
}

/// 未確定値を含むか
pub fn contains_unknown(value: &Value) -> bool {
    match value {
        Value::String(s) => s == UNKNOWN_VALUE,
        Value::Array(items) => items.iter().any(contains_unknown),
        Value::Object(map) => map.values().any(contains_unknown),
        _ => false,
    }
}

pub fn is_unknown(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == UNKNOWN_VALUE)
}

//! 変数展開（`${var.NAME}` / `${env.NAME}`）
//!
//! ロード時に一度だけ展開する。ブロック参照（`${civo_network.main.id}`）は
//! そのまま残し、プラン時に解決する。

use crate::error::{Result, StackError};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static VARIABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{\s*(var|env)\.(\w+)\s*\}").expect("valid variable pattern")
});

/// 環境変数による変数上書きの接頭辞（STRATO_VAR_size=g3.large）
pub const VAR_ENV_PREFIX: &str = "STRATO_VAR_";

/// 環境変数 STRATO_VAR_* で変数を上書きする
///
/// 宣言済みの変数が数値・真偽値なら、同じ型として読めるときはその型で上書きする。
pub fn apply_env_overrides(variables: &mut BTreeMap<String, Value>) {
    for (key, value) in std::env::vars() {
        if let Some(name) = key.strip_prefix(VAR_ENV_PREFIX)
            && !name.is_empty()
        {
            tracing::debug!("Variable '{}' overridden from environment", name);
            let typed = coerce_like(variables.get(name), value);
            variables.insert(name.to_string(), typed);
        }
    }
}

fn coerce_like(declared: Option<&Value>, raw: String) -> Value {
    let parsed = match declared {
        Some(Value::Number(_)) | Some(Value::Bool(_)) => serde_json::from_str::<Value>(&raw).ok(),
        _ => None,
    };
    match (declared, parsed) {
        (Some(Value::Number(_)), Some(v @ Value::Number(_))) => v,
        (Some(Value::Bool(_)), Some(v @ Value::Bool(_))) => v,
        _ => Value::String(raw),
    }
}

/// 値の中の変数を展開する
///
/// 文字列全体が `${var.NAME}` ひとつだけなら、変数の値を型ごと置き換える。
pub fn expand_variables(value: &mut Value, variables: &BTreeMap<String, Value>) -> Result<()> {
    match value {
        Value::String(s) => {
            if let Some(name) = sole_variable(s) {
                *value = variables
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| StackError::UndefinedVariable(format!("var.{}", name)))?;
            } else if VARIABLE_PATTERN.is_match(s) {
                *s = expand_string(s, variables)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                expand_variables(item, variables)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                expand_variables(item, variables)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// `${var.NAME}` だけの文字列ならその変数名
fn sole_variable(s: &str) -> Option<String> {
    let caps = VARIABLE_PATTERN.captures(s)?;
    (caps.get(0)?.as_str() == s && &caps[1] == "var").then(|| caps[2].to_string())
}

fn expand_string(s: &str, variables: &BTreeMap<String, Value>) -> Result<String> {
    let mut missing: Option<String> = None;

    let expanded = VARIABLE_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let kind = &caps[1];
        let name = &caps[2];
        let value = match kind {
            "var" => variables.get(name).map(|v| match v {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }),
            _ => std::env::var(name).ok(),
        };
        value.unwrap_or_else(|| {
            missing.get_or_insert_with(|| format!("{}.{}", kind, name));
            String::new()
        })
    });

    match missing {
        Some(name) => Err(StackError::UndefinedVariable(name)),
        None => Ok(expanded.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    fn vars() -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("region".to_string(), json!("LON1")),
            ("size".to_string(), json!("g3.small")),
            ("disk".to_string(), json!(50)),
            ("public".to_string(), json!(true)),
        ])
    }

    #[test]
    fn test_expand_nested() {
        let mut value = json!({
            "size": "${var.size}",
            "hostname": "web-${var.region}",
            "tags": ["${var.region}", "static"],
            "network_id": "${civo_network.main.id}",
        });

        expand_variables(&mut value, &vars()).unwrap();

        assert_eq!(value["size"], json!("g3.small"));
        assert_eq!(value["hostname"], json!("web-LON1"));
        assert_eq!(value["tags"], json!(["LON1", "static"]));
        // ブロック参照はそのまま
        assert_eq!(value["network_id"], json!("${civo_network.main.id}"));
    }

    #[test]
    fn test_single_variable_keeps_type() {
        let mut value = json!({
            "size_gb": "${var.disk}",
            "public_ip": "${ var.public }",
            "label": "disk-${var.disk}",
        });

        expand_variables(&mut value, &vars()).unwrap();

        assert_eq!(value["size_gb"], json!(50));
        assert_eq!(value["public_ip"], json!(true));
        assert_eq!(value["label"], json!("disk-50"));
    }

    #[test]
    fn test_undefined_variable() {
        let mut value = json!("${var.missing}");
        let result = expand_variables(&mut value, &vars());
        assert!(matches!(result, Err(StackError::UndefinedVariable(name)) if name == "var.missing"));
    }

    #[test]
    #[serial]
    fn test_expand_env() {
        temp_env::with_var("STRATO_TEST_TOKEN", Some("secret"), || {
            let mut value = json!("${env.STRATO_TEST_TOKEN}");
            expand_variables(&mut value, &vars()).unwrap();
            assert_eq!(value, json!("secret"));
        });
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        temp_env::with_var("STRATO_VAR_size", Some("g3.large"), || {
            let mut variables = vars();
            apply_env_overrides(&mut variables);
            assert_eq!(variables["size"], json!("g3.large"));
            assert_eq!(variables["region"], json!("LON1"));
        });
    }

    #[test]
    #[serial]
    fn test_env_overrides_keep_declared_type() {
        temp_env::with_vars(
            [
                ("STRATO_VAR_disk", Some("80")),
                ("STRATO_VAR_public", Some("yes")),
            ],
            || {
                let mut variables = vars();
                apply_env_overrides(&mut variables);
                assert_eq!(variables["disk"], json!(80));
                // 真偽値として読めなければ文字列のまま
                assert_eq!(variables["public"], json!("yes"));
            },
        );
    }
}

//! KDLパーサー
//!
//! strato.kdl をパースして Stack を生成します。
//! 変数展開と参照チェックは loader で行います。

mod block;

use block::{kdl_value_to_json, parse_block_body, positional_args, property, type_and_name};

use crate::error::{Result, StackError};
use crate::model::{DataBlock, OutputBlock, ProviderBlock, ResourceBlock, Stack};
use kdl::{KdlDocument, KdlNode};
use std::collections::HashSet;
use std::path::Path;

/// KDLファイルをパースしてStackを生成
pub fn parse_stack_file<P: AsRef<Path>>(path: P) -> Result<Stack> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| StackError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    parse_stack_string(&content, name)
}

/// KDL文字列をパース
pub fn parse_stack_string(content: &str, default_name: String) -> Result<Stack> {
    let doc: KdlDocument = content.parse()?;

    let mut stack = Stack::new(default_name);
    let mut seen: HashSet<String> = HashSet::new();

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                if let Some(name) = positional_args(node).first().and_then(|v| v.as_string()) {
                    stack.name = name.to_string();
                }
            }
            "provider" => {
                let provider = parse_provider(node)?;
                stack.providers.insert(provider.name.clone(), provider);
            }
            "variables" => {
                if let Some(vars) = node.children() {
                    for var in vars.nodes() {
                        let key = var.name().value().to_string();
                        let value = positional_args(var)
                            .first()
                            .map(|v| kdl_value_to_json(v))
                            .transpose()?
                            .unwrap_or_else(|| serde_json::Value::String(String::new()));
                        stack.variables.insert(key, value);
                    }
                }
            }
            "resource" => {
                let resource = parse_resource(node)?;
                if !seen.insert(resource.address()) {
                    return Err(StackError::DuplicateAddress(resource.address()));
                }
                stack.resources.push(resource);
            }
            "data" => {
                let data = parse_data(node)?;
                if !seen.insert(data.address()) {
                    return Err(StackError::DuplicateAddress(data.address()));
                }
                stack.data_sources.push(data);
            }
            "output" => {
                stack.outputs.push(parse_output(node)?);
            }
            other => {
                // 不明なノードはスキップ
                tracing::warn!("Unknown top-level node '{}' ignored", other);
            }
        }
    }

    Ok(stack)
}

/// provider ノードをパース
fn parse_provider(node: &KdlNode) -> Result<ProviderBlock> {
    let name = positional_args(node)
        .first()
        .and_then(|v| v.as_string())
        .ok_or_else(|| StackError::InvalidConfig("provider requires a name".to_string()))?
        .to_string();

    let body = parse_block_body(node.children(), false)?;

    Ok(ProviderBlock {
        name,
        config: body.attributes,
    })
}

/// resource ノードをパース
fn parse_resource(node: &KdlNode) -> Result<ResourceBlock> {
    let (resource_type, name) = type_and_name(node)?;
    let body = parse_block_body(node.children(), true)?;

    Ok(ResourceBlock {
        resource_type,
        name,
        attributes: body.attributes,
        depends_on: body.depends_on,
        timeouts: body.timeouts,
    })
}

/// data ノードをパース
fn parse_data(node: &KdlNode) -> Result<DataBlock> {
    let (data_type, name) = type_and_name(node)?;
    let body = parse_block_body(node.children(), true)?;

    Ok(DataBlock {
        data_type,
        name,
        attributes: body.attributes,
        depends_on: body.depends_on,
    })
}

/// output ノードをパース
///
/// `output "ip" value="..."` と `output "ip" { value "..." }` の両方を受け付ける
fn parse_output(node: &KdlNode) -> Result<OutputBlock> {
    let name = positional_args(node)
        .first()
        .and_then(|v| v.as_string())
        .ok_or_else(|| StackError::InvalidConfig("output requires a name".to_string()))?
        .to_string();

    let body = parse_block_body(node.children(), false)?;

    let value = match property(node, "value") {
        Some(v) => kdl_value_to_json(v)?,
        None => body.attributes.get("value").cloned().ok_or_else(|| {
            StackError::InvalidConfig(format!("output '{}' requires a value", name))
        })?,
    };

    let sensitive = property(node, "sensitive")
        .and_then(|v| v.as_bool())
        .or_else(|| body.attributes.get("sensitive").and_then(|v| v.as_bool()))
        .unwrap_or(false);

    Ok(OutputBlock {
        name,
        value,
        sensitive,
    })
}

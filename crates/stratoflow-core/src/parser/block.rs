//! ブロック本体（子ノード）のパース

use crate::error::{Result, StackError};
use crate::model::{Attributes, Operation, Timeouts, parse_duration};
use kdl::{KdlDocument, KdlNode, KdlValue};
use serde_json::Value;

/// ブロック本体のパース結果
#[derive(Debug, Default)]
pub(crate) struct BlockBody {
    pub attributes: Attributes,
    pub depends_on: Vec<String>,
    pub timeouts: Timeouts,
}

/// KDLの値をJSON値へ変換
pub(crate) fn kdl_value_to_json(value: &KdlValue) -> Result<Value> {
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s.to_string()));
    }
    if let Some(i) = value.as_integer() {
        let i = i64::try_from(i)
            .map_err(|_| StackError::InvalidConfig(format!("integer out of range: {}", i)))?;
        return Ok(Value::from(i));
    }
    if let Some(f) = value.as_float() {
        return serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| StackError::InvalidConfig(format!("invalid number: {}", f)));
    }
    if let Some(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    Ok(Value::Null)
}

/// 位置引数（プロパティ以外）を取り出す
pub(crate) fn positional_args(node: &KdlNode) -> Vec<&KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
        .collect()
}

/// 名前付きプロパティを取り出す
pub(crate) fn property<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

/// ブロックの最初の2引数（タイプ名とローカル名）
pub(crate) fn type_and_name(node: &KdlNode) -> Result<(String, String)> {
    let kind = node.name().value();
    let args = positional_args(node);
    let type_name = args.first().and_then(|v| v.as_string());
    let name = args.get(1).and_then(|v| v.as_string());

    match (type_name, name) {
        (Some(t), Some(n)) => Ok((t.to_string(), n.to_string())),
        _ => Err(StackError::InvalidConfig(format!(
            "{} requires a type and a name: {} \"<type>\" \"<name>\" {{ ... }}",
            kind, kind
        ))),
    }
}

/// resource / data ブロックの本体をパース
///
/// - `depends_on` / `timeouts` は特別扱い
/// - 子ブロックを持つノードはネストしたブロック（同名は配列に積む）
/// - 引数1つはスカラー、複数はリスト
pub(crate) fn parse_block_body(doc: Option<&KdlDocument>, allow_meta: bool) -> Result<BlockBody> {
    let mut body = BlockBody::default();
    let Some(doc) = doc else {
        return Ok(body);
    };

    for child in doc.nodes() {
        let key = child.name().value();
        match key {
            "depends_on" if allow_meta => {
                for arg in positional_args(child) {
                    let address = arg.as_string().ok_or_else(|| {
                        StackError::InvalidConfig("depends_on takes addresses as strings".into())
                    })?;
                    body.depends_on.push(address.to_string());
                }
            }
            "timeouts" if allow_meta => {
                body.timeouts = parse_timeouts(child)?;
            }
            _ => {
                insert_attribute(&mut body.attributes, child)?;
            }
        }
    }

    Ok(body)
}

/// ネストしたブロックを属性マップへ変換（メタ引数なし）
fn parse_nested(doc: &KdlDocument) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for child in doc.nodes() {
        insert_attribute(&mut attributes, child)?;
    }
    Ok(attributes)
}

fn insert_attribute(attributes: &mut Attributes, node: &KdlNode) -> Result<()> {
    let key = node.name().value().to_string();

    if let Some(children) = node.children() {
        let nested = Value::Object(parse_nested(children)?);
        match attributes.get_mut(&key) {
            Some(Value::Array(items)) => items.push(nested),
            Some(_) => {
                return Err(StackError::InvalidConfig(format!(
                    "'{}' is used both as an attribute and a block",
                    key
                )));
            }
            None => {
                attributes.insert(key, Value::Array(vec![nested]));
            }
        }
        return Ok(());
    }

    let args = positional_args(node);
    let value = match args.len() {
        0 => {
            return Err(StackError::InvalidConfig(format!(
                "attribute '{}' requires a value",
                key
            )));
        }
        1 => kdl_value_to_json(args[0])?,
        _ => Value::Array(
            args.into_iter()
                .map(kdl_value_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
    };

    if attributes.contains_key(&key) {
        return Err(StackError::InvalidConfig(format!(
            "attribute '{}' is defined more than once",
            key
        )));
    }
    attributes.insert(key, value);
    Ok(())
}

fn parse_timeouts(node: &KdlNode) -> Result<Timeouts> {
    let mut timeouts = Timeouts::default();
    let Some(children) = node.children() else {
        return Ok(timeouts);
    };

    for child in children.nodes() {
        let op = match child.name().value() {
            "create" => Operation::Create,
            "read" => Operation::Read,
            "update" => Operation::Update,
            "delete" => Operation::Delete,
            other => {
                return Err(StackError::InvalidConfig(format!(
                    "unknown timeout operation: {}",
                    other
                )));
            }
        };
        let raw = positional_args(child)
            .first()
            .and_then(|v| v.as_string())
            .ok_or_else(|| StackError::InvalidDuration(format!("timeouts.{}", op)))?;
        timeouts.set(op, parse_duration(raw)?);
    }

    Ok(timeouts)
}

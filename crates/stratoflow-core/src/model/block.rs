//! スタック内のブロック定義

use super::{Attributes, Timeouts};
use serde::{Deserialize, Serialize};

/// データソースアドレスの接頭辞
pub const DATA_PREFIX: &str = "data.";

/// プロバイダー設定（`provider "civo" { ... }`）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderBlock {
    /// プロバイダー名（civo など）
    pub name: String,

    /// プロバイダー固有の設定
    pub config: Attributes,
}

/// 管理対象リソース（`resource "civo_instance" "web" { ... }`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceBlock {
    /// リソースタイプ（civo_instance など）
    pub resource_type: String,

    /// スタック内でのローカル名
    pub name: String,

    /// 宣言された属性
    pub attributes: Attributes,

    /// 明示的な依存先アドレス
    pub depends_on: Vec<String>,

    /// 操作ごとのタイムアウト
    pub timeouts: Timeouts,
}

impl ResourceBlock {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            attributes: Attributes::new(),
            depends_on: Vec::new(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// アドレス（type.name）
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// タイプ名の接頭辞からプロバイダー名を得る（civo_instance → civo）
    pub fn provider_name(&self) -> &str {
        provider_of(&self.resource_type)
    }
}

/// 読み取り専用のデータソース（`data "civo_size" "small" { ... }`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBlock {
    pub data_type: String,
    pub name: String,
    pub attributes: Attributes,
    pub depends_on: Vec<String>,
}

impl DataBlock {
    pub fn new(data_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            name: name.into(),
            attributes: Attributes::new(),
            depends_on: Vec::new(),
        }
    }

    /// アドレス（data.type.name）
    pub fn address(&self) -> String {
        format!("{}{}.{}", DATA_PREFIX, self.data_type, self.name)
    }

    pub fn provider_name(&self) -> &str {
        provider_of(&self.data_type)
    }
}

/// 出力値（`output "ip" value="${civo_instance.web.public_ip}"`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputBlock {
    pub name: String,
    pub value: serde_json::Value,
    pub sensitive: bool,
}

/// タイプ名の最初の `_` より前をプロバイダー名とみなす
pub fn provider_of(type_name: &str) -> &str {
    type_name.split('_').next().unwrap_or(type_name)
}

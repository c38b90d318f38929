//! スタック全体

use super::{DataBlock, OutputBlock, ProviderBlock, ResourceBlock};
use crate::error::{Result, StackError};
use crate::graph::DependencyGraph;
use crate::reference::references_in;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// strato.kdl 1ファイル（+ローカルオーバーライド）分の定義
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stack {
    /// プロジェクト名
    pub name: String,

    /// プロバイダー設定（名前 → 設定）
    pub providers: BTreeMap<String, ProviderBlock>,

    /// 変数（`${var.NAME}` で参照）
    pub variables: BTreeMap<String, Value>,

    pub resources: Vec<ResourceBlock>,

    pub data_sources: Vec<DataBlock>,

    pub outputs: Vec<OutputBlock>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn find_resource(&self, address: &str) -> Option<&ResourceBlock> {
        self.resources.iter().find(|r| r.address() == address)
    }

    pub fn find_data(&self, address: &str) -> Option<&DataBlock> {
        self.data_sources.iter().find(|d| d.address() == address)
    }

    /// アドレスがスタック内に定義されているか
    pub fn contains(&self, address: &str) -> bool {
        self.find_resource(address).is_some() || self.find_data(address).is_some()
    }

    /// 利用されているプロバイダー名の一覧
    pub fn required_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .resources
            .iter()
            .map(|r| r.provider_name().to_string())
            .chain(self.data_sources.iter().map(|d| d.provider_name().to_string()))
            .chain(self.providers.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// 別のスタック（ローカルオーバーライド）をマージする
    ///
    /// - 同じアドレスのブロックは置き換え
    /// - 変数・プロバイダー設定はキー単位で上書き
    /// - スタック名は変更しない
    pub fn merge(&mut self, other: Stack) {
        for (name, provider) in other.providers {
            match self.providers.get_mut(&name) {
                Some(existing) => existing.config.extend(provider.config),
                None => {
                    self.providers.insert(name, provider);
                }
            }
        }

        self.variables.extend(other.variables);

        for resource in other.resources {
            let address = resource.address();
            match self.resources.iter_mut().find(|r| r.address() == address) {
                Some(existing) => *existing = resource,
                None => self.resources.push(resource),
            }
        }

        for data in other.data_sources {
            let address = data.address();
            match self.data_sources.iter_mut().find(|d| d.address() == address) {
                Some(existing) => *existing = data,
                None => self.data_sources.push(data),
            }
        }

        for output in other.outputs {
            match self.outputs.iter_mut().find(|o| o.name == output.name) {
                Some(existing) => *existing = output,
                None => self.outputs.push(output),
            }
        }
    }

    /// 参照と depends_on から依存グラフを構築する
    ///
    /// 未定義のアドレスへの参照はエラー
    pub fn dependency_graph(&self) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();

        for resource in &self.resources {
            graph.add_node(resource.address());
        }
        for data in &self.data_sources {
            graph.add_node(data.address());
        }

        let blocks = self
            .resources
            .iter()
            .map(|r| (r.address(), &r.attributes, &r.depends_on))
            .chain(
                self.data_sources
                    .iter()
                    .map(|d| (d.address(), &d.attributes, &d.depends_on)),
            );

        for (address, attributes, depends_on) in blocks {
            let value = serde_json::Value::Object(attributes.clone());
            let referenced = references_in(&value).into_iter().map(|r| r.address);

            for target in referenced.chain(depends_on.iter().cloned()) {
                if !self.contains(&target) {
                    return Err(StackError::UndefinedReference {
                        from: address.clone(),
                        to: target,
                    });
                }
                graph.add_dependency(&address, &target)?;
            }
        }

        Ok(graph)
    }

    /// 出力値が参照するアドレスが定義済みか確認
    pub fn check_outputs(&self) -> Result<()> {
        for output in &self.outputs {
            for reference in references_in(&output.value) {
                if !self.contains(&reference.address) {
                    return Err(StackError::UndefinedReference {
                        from: format!("output.{}", output.name),
                        to: reference.address,
                    });
                }
            }
        }
        Ok(())
    }
}

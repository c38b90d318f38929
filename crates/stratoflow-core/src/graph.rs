//! ブロック間の依存グラフ
//!
//! 作成・更新は依存先から順に、削除は依存元から順に行うための順序付け。

use crate::error::{Result, StackError};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// ノード → 依存先
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: impl Into<String>) {
        self.dependencies.entry(node.into()).or_default();
    }

    /// `from` が `to` に依存することを登録
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Err(StackError::CircularDependency(vec![from.to_string()]));
        }
        self.add_node(to);
        self.dependencies
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        Ok(())
    }

    pub fn contains(&self, node: &str) -> bool {
        self.dependencies.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.dependencies.keys()
    }

    /// 直接の依存先
    pub fn dependencies_of(&self, node: &str) -> Vec<String> {
        self.dependencies
            .get(node)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `node` に（推移的に）依存している全ノード
    pub fn dependents_of(&self, node: &str) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::from([node.to_string()]);

        while let Some(current) = queue.pop_front() {
            for (candidate, deps) in &self.dependencies {
                if deps.contains(&current) && result.insert(candidate.clone()) {
                    queue.push_back(candidate.clone());
                }
            }
        }

        result
    }

    /// 依存先が先に来る順序（同順位はアドレス順）
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(node, deps)| (node.as_str(), deps.len()))
            .collect();

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut order = Vec::with_capacity(self.dependencies.len());

        while let Some(node) = ready.pop_first() {
            remaining.remove(node);
            order.push(node.to_string());

            for (candidate, deps) in &self.dependencies {
                if deps.contains(node)
                    && let Some(count) = remaining.get_mut(candidate.as_str())
                {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(candidate.as_str());
                    }
                }
            }
        }

        if !remaining.is_empty() {
            let stuck: BTreeSet<&str> = remaining.keys().copied().collect();
            return Err(StackError::CircularDependency(self.find_cycle(&stuck)));
        }

        Ok(order)
    }

    /// 依存元が先に来る順序（削除用）
    pub fn reverse_topological_order(&self) -> Result<Vec<String>> {
        let mut order = self.topological_order()?;
        order.reverse();
        Ok(order)
    }

    /// 閉路に含まれるノード列を1つ探す
    fn find_cycle(&self, stuck: &BTreeSet<&str>) -> Vec<String> {
        let Some(start) = stuck.iter().next() else {
            return Vec::new();
        };

        // 閉路上のノードは必ず stuck 内の依存先を持つので、辿れば閉路に入る
        let mut path: Vec<&str> = vec![start];
        loop {
            let current = path[path.len() - 1];
            let next = self
                .dependencies
                .get(current)
                .and_then(|deps| deps.iter().find(|d| stuck.contains(d.as_str())));

            let Some(next) = next else {
                return path.iter().map(|s| s.to_string()).collect();
            };

            if let Some(pos) = path.iter().position(|p| *p == next.as_str()) {
                return path[pos..].iter().map(|s| s.to_string()).collect();
            }
            path.push(next.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topological_order() {
        let mut graph = DependencyGraph::new();
        graph.add_node("civo_network.main");
        graph.add_dependency("civo_firewall.web", "civo_network.main").unwrap();
        graph.add_dependency("civo_instance.web", "civo_firewall.web").unwrap();
        graph.add_dependency("civo_instance.web", "civo_network.main").unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(
            order,
            vec!["civo_network.main", "civo_firewall.web", "civo_instance.web"]
        );

        let reverse = graph.reverse_topological_order().unwrap();
        assert_eq!(reverse.first().unwrap(), "civo_instance.web");
    }

    #[test]
    fn test_independent_nodes_sorted_by_address() {
        let mut graph = DependencyGraph::new();
        graph.add_node("b");
        graph.add_node("a");
        graph.add_node("c");
        assert_eq!(graph.topological_order().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b").unwrap();
        graph.add_dependency("b", "c").unwrap();
        graph.add_dependency("c", "a").unwrap();
        graph.add_dependency("d", "a").unwrap();

        match graph.topological_order() {
            Err(StackError::CircularDependency(cycle)) => {
                assert_eq!(cycle.len(), 3);
                assert!(!cycle.contains(&"d".to_string()));
            }
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency() {
        let mut graph = DependencyGraph::new();
        assert!(graph.add_dependency("a", "a").is_err());
    }

    #[test]
    fn test_dependents_of_is_transitive() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("instance", "firewall").unwrap();
        graph.add_dependency("firewall", "network").unwrap();
        graph.add_dependency("volume", "network").unwrap();
        graph.add_node("dns");

        let dependents = graph.dependents_of("network");
        assert_eq!(dependents.len(), 3);
        assert!(dependents.contains("instance"));
        assert!(!dependents.contains("dns"));
    }
}

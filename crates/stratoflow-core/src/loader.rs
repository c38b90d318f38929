//! 統合ローダー
//!
//! パース、ローカルオーバーライドのマージ、変数展開、参照チェックを統合

use crate::error::{Result, StackError};
use crate::model::Stack;
use crate::parser::{parse_stack_file, parse_stack_string};
use crate::variables::{apply_env_overrides, expand_variables};
use std::path::Path;
use tracing::{debug, info, instrument};

/// ローカルオーバーライドファイル名（strato.kdl と同じディレクトリに置く）
pub const LOCAL_OVERRIDE_FILE: &str = "strato.local.kdl";

/// スタックファイルをロードしてStackを生成
///
/// 以下の処理を実行:
/// 1. KDLパース
/// 2. strato.local.kdl のマージ
/// 3. 変数展開（STRATO_VAR_* による上書きを含む）
/// 4. 参照先の存在確認と循環依存の検出
#[instrument(fields(path = %path.display()))]
pub fn load_stack(path: &Path) -> Result<Stack> {
    debug!("Step 1: Parsing stack file");
    let mut stack = parse_stack_file(path)?;

    if let Some(dir) = path.parent() {
        let local = dir.join(LOCAL_OVERRIDE_FILE);
        if local.exists() && local != path {
            debug!("Step 2: Merging {}", local.display());
            stack.merge(parse_stack_file(&local)?);
        }
    }

    finalize(stack)
}

/// 文字列からロード（オーバーライドなし）
pub fn load_stack_from_str(content: &str, name: &str) -> Result<Stack> {
    finalize(parse_stack_string(content, name.to_string())?)
}

fn finalize(mut stack: Stack) -> Result<Stack> {
    debug!("Step 3: Expanding variables");
    apply_env_overrides(&mut stack.variables);
    resolve_all_variables(&mut stack)?;

    debug!("Step 4: Checking references");
    let graph = stack.dependency_graph()?;
    graph.topological_order()?;
    stack.check_outputs()?;

    info!(
        resources = stack.resources.len(),
        data_sources = stack.data_sources.len(),
        "Stack loaded successfully"
    );
    Ok(stack)
}

fn resolve_all_variables(stack: &mut Stack) -> Result<()> {
    let variables = stack.variables.clone();

    for provider in stack.providers.values_mut() {
        expand_in_map(&mut provider.config, &variables)?;
    }
    for resource in &mut stack.resources {
        expand_in_map(&mut resource.attributes, &variables)?;
    }
    for data in &mut stack.data_sources {
        expand_in_map(&mut data.attributes, &variables)?;
    }
    for output in &mut stack.outputs {
        expand_variables(&mut output.value, &variables)?;
    }
    Ok(())
}

fn expand_in_map(
    map: &mut serde_json::Map<String, serde_json::Value>,
    variables: &std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in map.iter_mut() {
        expand_variables(value, variables).map_err(|e| match e {
            StackError::UndefinedVariable(name) => {
                StackError::UndefinedVariable(format!("{} (in attribute '{}')", name, key))
            }
            other => other,
        })?;
    }
    Ok(())
}

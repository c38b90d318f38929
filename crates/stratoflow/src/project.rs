//! スタックファイル・ステート・エンジンの読み込み

use anyhow::bail;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use stratoflow_cloud::{CloudProvider, Engine, StateManager};
use stratoflow_cloud_civo::{CivoClient, CivoProvider, ClientConfig};
use stratoflow_config::ConfigError;
use stratoflow_core::Stack;
use tracing::debug;

/// 対応しているプロバイダー
const SUPPORTED_PROVIDERS: [&str; 1] = ["civo"];

/// 読み込み済みのプロジェクト
pub struct Project {
    pub stack_file: PathBuf,
    pub root: PathBuf,
    pub stack: Stack,
}

impl Project {
    /// カレントディレクトリからスタックファイルを探してロード
    pub fn load() -> anyhow::Result<Self> {
        let stack_file = stratoflow_config::find_stack_file()?;
        Self::load_from(stack_file)
    }

    /// スタックファイルが無ければNone（パースエラーはエラーのまま）
    pub fn find() -> anyhow::Result<Option<Self>> {
        match stratoflow_config::find_stack_file() {
            Ok(stack_file) => Self::load_from(stack_file).map(Some),
            Err(ConfigError::StackFileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_from(stack_file: PathBuf) -> anyhow::Result<Self> {
        let root = stratoflow_config::project_root_for(&stack_file);
        debug!(
            "Stack file {} (project root {})",
            stack_file.display(),
            root.display()
        );

        let stack = stratoflow_core::load_stack(&stack_file)?;
        Ok(Self {
            stack_file,
            root,
            stack,
        })
    }

    pub fn state_manager(&self) -> StateManager {
        StateManager::new(&self.root)
    }
}

/// ステートの置き場所（スタックファイルが無ければカレントディレクトリ）
pub fn state_manager_for(project: Option<&Project>) -> anyhow::Result<StateManager> {
    match project {
        Some(project) => Ok(project.state_manager()),
        None => Ok(StateManager::new(std::env::current_dir()?)),
    }
}

/// スタックのプロバイダー設定からエンジンを組み立てる
pub fn build_engine(stack: Option<&Stack>) -> anyhow::Result<Engine> {
    if let Some(stack) = stack {
        for name in stack.providers.keys() {
            if !SUPPORTED_PROVIDERS.contains(&name.as_str()) {
                bail!(
                    "未対応のプロバイダーです: {}（対応: {}）",
                    name,
                    SUPPORTED_PROVIDERS.join(", ")
                );
            }
        }
    }

    let config = stack
        .and_then(|s| s.providers.get("civo"))
        .map(|p| p.config.clone())
        .unwrap_or_default();
    let provider = CivoProvider::configure(&config)?;

    Ok(Engine::new().with_provider(Arc::new(provider)))
}

/// スキーマ参照用のプロバイダー（認証情報を読まない）
pub fn schema_provider() -> anyhow::Result<CivoProvider> {
    Ok(CivoProvider::new(CivoClient::new(ClientConfig::default())?))
}

/// 全プロバイダーの認証を確認
pub async fn ensure_authenticated(engine: &Engine) -> anyhow::Result<()> {
    for provider in engine.providers() {
        let status = provider.check_auth().await?;
        if !status.authenticated {
            bail!(
                "{} の認証に失敗しました: {}",
                provider.display_name(),
                status.error.unwrap_or_default()
            );
        }

        println!(
            "{} {} ({})",
            "✓".green(),
            provider.display_name(),
            status.account_info.unwrap_or_default().dimmed()
        );
    }
    Ok(())
}

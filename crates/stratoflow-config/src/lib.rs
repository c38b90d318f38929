pub mod credentials;
pub mod error;

pub use credentials::{Credentials, Profile, active_profile_name, load_active_profile};
pub use error::*;

use std::path::PathBuf;

/// スタックファイルの候補（優先順）
const STACK_FILE_CANDIDATES: [&str; 2] = ["strato.kdl", ".strato.kdl"];

/// プロジェクト内の作業ディレクトリ名
pub const PROJECT_DIR: &str = ".stratoflow";

/// StratoFlowの設定ディレクトリパス（作成はしない）
pub fn config_dir_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stratoflow"))
}

/// プロジェクトのstrato.kdlファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 STRATO_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: strato.kdl, .strato.kdl
/// 3. ./.stratoflow/ ディレクトリ内: 同様の順序
pub fn find_stack_file() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    find_stack_file_from(&current_dir)
}

/// 指定ディレクトリを起点にスタックファイルを探す
pub fn find_stack_file_from(dir: &std::path::Path) -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("STRATO_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "STRATO_CONFIG_PATH is set but {} does not exist",
            path.display()
        );
    }

    // 2. 指定ディレクトリで検索
    for filename in &STACK_FILE_CANDIDATES {
        let path = dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.stratoflow/ ディレクトリで検索
    let project_dir = dir.join(PROJECT_DIR);
    if project_dir.is_dir() {
        for filename in &STACK_FILE_CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(ConfigError::StackFileNotFound)
}

/// スタックファイルからプロジェクトルートを求める
///
/// `.stratoflow/strato.kdl` の場合はその親ディレクトリがルートになる
pub fn project_root_for(stack_file: &std::path::Path) -> PathBuf {
    let parent = stack_file
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if parent.file_name().and_then(|n| n.to_str()) == Some(PROJECT_DIR) {
        parent.parent().map(|p| p.to_path_buf()).unwrap_or(parent)
    } else {
        parent
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("アドレスが重複しています: {0}")]
    DuplicateAddress(String),

    #[error("未定義の変数です: {0}")]
    UndefinedVariable(String),

    #[error("{from} が未定義のブロックを参照しています: {to}")]
    UndefinedReference { from: String, to: String },

    #[error("循環依存が検出されました: {}", format_cycle(.0))]
    CircularDependency(Vec<String>),

    #[error("不正な期間指定です: {0} (例: 30s, 5m, 1h)")]
    InvalidDuration(String),
}

fn format_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => "empty cycle".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, StackError>;

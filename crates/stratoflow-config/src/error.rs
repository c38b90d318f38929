use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "スタックファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: strato.kdl, .strato.kdl\n\
        - ./.stratoflow/ ディレクトリ\n\
        または STRATO_CONFIG_PATH 環境変数で直接指定できます"
    )]
    StackFileNotFound,

    #[error("認証情報ファイルの形式が不正です: {path}\n理由: {message}")]
    InvalidCredentials { path: PathBuf, message: String },

    #[error("プロファイルが見つかりません: {0}")]
    ProfileNotFound(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

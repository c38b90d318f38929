//! 認証情報ファイル
//!
//! `~/.config/stratoflow/credentials.json` にプロファイル単位で保存された
//! APIトークンとデフォルトリージョンを読み込む。
//!
//! ```json
//! {
//!   "profiles": {
//!     "default": { "token": "xxxx", "region": "LON1" }
//!   }
//! }
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CREDENTIALS_FILE: &str = "credentials.json";
const DEFAULT_PROFILE: &str = "default";

/// 認証情報ファイル全体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// プロファイル単位の認証情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub token: Option<String>,
    pub region: Option<String>,
    pub api_endpoint: Option<String>,
}

impl Credentials {
    /// 認証情報ファイルのパス
    ///
    /// STRATO_CREDENTIALS_PATH が設定されていればそれを優先
    pub fn path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("STRATO_CREDENTIALS_PATH") {
            return Ok(PathBuf::from(path));
        }
        Ok(crate::config_dir_path()?.join(CREDENTIALS_FILE))
    }

    /// 認証情報ファイルを読み込む（存在しなければNone）
    pub fn load() -> Result<Option<Self>> {
        let path = Self::path()?;
        if !path.exists() {
            tracing::debug!("Credentials file not found: {}", path.display());
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// 指定パスから読み込む
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidCredentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }
}

/// 使用するプロファイル名（STRATO_PROFILE、未設定なら "default"）
pub fn active_profile_name() -> String {
    std::env::var("STRATO_PROFILE").unwrap_or_else(|_| DEFAULT_PROFILE.to_string())
}

/// アクティブなプロファイルを読み込む
///
/// ファイルが無い場合はNone。STRATO_PROFILE で明示したプロファイルが
/// 存在しない場合のみエラーになる。
pub fn load_active_profile() -> Result<Option<Profile>> {
    let Some(credentials) = Credentials::load()? else {
        return Ok(None);
    };

    let name = active_profile_name();
    match credentials.profile(&name) {
        Some(profile) => Ok(Some(profile.clone())),
        None if name == DEFAULT_PROFILE => Ok(None),
        None => Err(ConfigError::ProfileNotFound(name)),
    }
}

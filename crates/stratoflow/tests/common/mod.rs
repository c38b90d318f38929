#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_stack_kdl(&self, content: &str) {
        let path = self.root.path().join("strato.kdl");
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_state(&self, state: &serde_json::Value) {
        let dir = self.root.path().join(".stratoflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("state.json"),
            serde_json::to_string_pretty(state).unwrap(),
        )
        .unwrap();
    }

    #[allow(dead_code)]
    pub fn read_state(&self) -> serde_json::Value {
        let path = self.root.path().join(".stratoflow").join("state.json");
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// 開発者の環境（トークン・認証情報ファイル）に影響されない strato コマンド
    pub fn strato(&self) -> Command {
        let mut cmd = Command::cargo_bin("strato").unwrap();
        cmd.current_dir(self.path())
            .env_remove("STRATO_CONFIG_PATH")
            .env_remove("STRATO_PROFILE")
            .env_remove("CIVO_TOKEN")
            .env_remove("CIVO_REGION")
            .env_remove("CIVO_API_URL")
            .env("STRATO_CREDENTIALS_PATH", self.path().join("no-credentials.json"))
            .env("NO_COLOR", "1");
        cmd
    }
}

//! 操作ごとのタイムアウト

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// リソース操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// `timeouts { create "10m" }` ブロック
///
/// 未指定の操作はリソース側のデフォルトが使われる
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub read: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

impl Timeouts {
    /// 全操作に同じタイムアウトを設定
    pub fn all(duration: Duration) -> Self {
        Self {
            create: Some(duration),
            read: Some(duration),
            update: Some(duration),
            delete: Some(duration),
        }
    }

    pub fn get(&self, op: Operation) -> Option<Duration> {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    pub fn set(&mut self, op: Operation, duration: Duration) {
        match op {
            Operation::Create => self.create = Some(duration),
            Operation::Read => self.read = Some(duration),
            Operation::Update => self.update = Some(duration),
            Operation::Delete => self.delete = Some(duration),
        }
    }

    /// 指定のない操作をfallbackで埋める
    pub fn or(self, fallback: Timeouts) -> Timeouts {
        Timeouts {
            create: self.create.or(fallback.create),
            read: self.read.or(fallback.read),
            update: self.update.or(fallback.update),
            delete: self.delete.or(fallback.delete),
        }
    }
}

/// "30s", "5m", "1h", "1h30m" 形式の期間をパース
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StackError::InvalidDuration(input.to_string()));
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return Err(StackError::InvalidDuration(input.to_string())),
        };
        let value: u64 = digits
            .parse()
            .map_err(|_| StackError::InvalidDuration(input.to_string()))?;
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| StackError::InvalidDuration(input.to_string()))?;
        digits.clear();
    }

    // 単位のない末尾の数字は不可
    if !digits.is_empty() {
        return Err(StackError::InvalidDuration(input.to_string()));
    }

    Ok(Duration::from_secs(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("m").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(matches!(
            parse_duration("6000000000000000h"),
            Err(StackError::InvalidDuration(_))
        ));
        assert!(parse_duration("18446744073709551615s1s").is_err());
    }

    #[test]
    fn test_timeouts_or() {
        let mut configured = Timeouts::default();
        configured.set(Operation::Create, Duration::from_secs(600));

        let merged = configured.or(Timeouts::all(Duration::from_secs(60)));
        assert_eq!(merged.create, Some(Duration::from_secs(600)));
        assert_eq!(merged.delete, Some(Duration::from_secs(60)));
    }
}

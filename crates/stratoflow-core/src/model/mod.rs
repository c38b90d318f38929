//! モデル定義
//!
//! スタック定義（strato.kdl）から読み込まれるデータモデル。

mod block;
mod stack;
mod timeouts;

pub use block::*;
pub use stack::*;
pub use timeouts::*;

/// 属性マップ（宣言された属性名 → 値）
pub type Attributes = serde_json::Map<String, serde_json::Value>;

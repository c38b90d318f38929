//! StratoFlow Core
//!
//! strato.kdl（スタック定義）のモデル、パーサー、変数展開、
//! ブロック参照と依存グラフを提供します。

pub mod error;
pub mod graph;
pub mod loader;
pub mod model;
pub mod parser;
pub mod reference;
pub mod variables;

pub use error::{Result, StackError};
pub use graph::DependencyGraph;
pub use loader::{LOCAL_OVERRIDE_FILE, load_stack, load_stack_from_str};
pub use model::*;
pub use parser::{parse_stack_file, parse_stack_string};
pub use reference::{
    Reference, UNKNOWN_VALUE, contains_unknown, is_unknown, references_in, resolve_references,
};

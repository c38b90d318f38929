pub mod apply;
pub mod destroy;
pub mod import;
pub mod output;
pub mod plan;
pub mod refresh;
pub mod schema;
pub mod state;
pub mod validate;

pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod function;
pub mod functions;
pub mod mutation;
pub mod path;
pub mod provider;
pub mod split;
pub mod template;

pub use engine::Engine;
pub use error::{Error, MultiError, Result};

/// Canonical sentinel values marking "must be set before apply".
pub mod placeholder {
    pub const STRING: &str = "replaceme";
    pub const INT: i64 = 999_999_999;
}

pub mod eval;
pub mod parser;
pub mod quantity;

pub use eval::{evaluate, matches_document, FilterOutcome};
pub use parser::{CompareOp, Literal, Relational, WhereFilter};
pub use quantity::Quantity;

pub mod ordering;
pub mod splitter;

pub use ordering::{kind_priority, order_crds, order_resources};
pub use splitter::{split_and_order, ManifestEntry, SplitOutput};

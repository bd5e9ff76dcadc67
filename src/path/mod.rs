pub mod accessor;
pub mod grammar;
pub mod registry;
pub mod resolve;
pub mod visitor;

pub use accessor::EmbeddedAccessor;
pub use grammar::{substitute_args, PathExpr, Segment, WildcardBind};
pub use registry::{
    FunctionInvocation, PathRegistry, PathRegistryBuilder, PathSpec, PathVisitorInfo,
    ATTRIBUTE_NAME_GENERAL, RESOURCE_TYPE_ANY,
};
pub use resolve::{resolve, resolve_strict, ResolvedPath};

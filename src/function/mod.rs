pub mod context;
pub mod registry;
pub mod result;
pub mod signature;

pub use context::FunctionContext;
pub use registry::{FunctionRegistry, FunctionRegistryBuilder, Handler, InvocationOutcome};
pub use result::{AttributeValue, FunctionOutput, ValidationResult};
pub use signature::{
    ArgValue, DataType, FunctionArgument, FunctionSignature, OutputSpec, ParameterSpec,
    ValueConstraints,
};

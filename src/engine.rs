//! Engine facade: one init phase, then dispatch.
//!
//! `Engine::kubernetes()` assembles both registries through their builders
//! and freezes them; after construction the engine is read-only and safe to
//! share across threads operating on distinct containers.

use std::sync::Arc;

use crate::document::DocContainer;
use crate::error::Result;
use crate::function::{
    ArgValue, FunctionContext, FunctionRegistry, FunctionRegistryBuilder, FunctionSignature,
    InvocationOutcome,
};
use crate::functions;
use crate::path::{PathRegistry, PathRegistryBuilder};
use crate::provider::paths::register_standard_paths;
use crate::provider::{KubernetesProvider, NoSchemaLookup, SchemaLookup};

pub struct Engine {
    provider: Arc<KubernetesProvider>,
    paths: Arc<PathRegistry>,
    functions: FunctionRegistry,
}

impl Engine {
    /// Standard Kubernetes engine with no schema enrichment.
    pub fn kubernetes() -> Result<Engine> {
        Self::kubernetes_with_schema(&NoSchemaLookup)
    }

    /// Standard Kubernetes engine; `schema` enriches registrations with
    /// field descriptions where it has them.
    pub fn kubernetes_with_schema(schema: &dyn SchemaLookup) -> Result<Engine> {
        let provider = Arc::new(KubernetesProvider::new());

        let mut path_builder = PathRegistryBuilder::new("kubernetes");
        register_standard_paths(&mut path_builder, &provider, schema)?;
        let paths = Arc::new(path_builder.build());

        let mut function_builder = FunctionRegistryBuilder::new();
        functions::register_standard(&mut function_builder, &paths, &provider);

        Ok(Engine {
            provider,
            paths,
            functions: function_builder.build(),
        })
    }

    /// Dispatch one invocation against a container.
    pub fn invoke(
        &self,
        name: &str,
        ctx: &FunctionContext,
        container: DocContainer,
        args: &[ArgValue],
        live_state: &[u8],
    ) -> Result<InvocationOutcome> {
        self.functions.invoke(name, ctx, container, args, live_state)
    }

    pub fn provider(&self) -> &KubernetesProvider {
        &self.provider
    }

    pub fn path_registry(&self) -> &PathRegistry {
        &self.paths
    }

    /// The self-describing signature list.
    pub fn signatures(&self) -> Vec<&FunctionSignature> {
        self.functions.signatures()
    }
}

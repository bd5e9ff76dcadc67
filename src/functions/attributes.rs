//! Registry-driven attribute reads and writes.

use std::sync::Arc;

use crate::document::{Document, Scalar};
use crate::error::{Error, MultiError, Result};
use crate::filter::{matches_document, WhereFilter};
use crate::function::{
    AttributeValue, DataType, FunctionOutput, FunctionRegistryBuilder, FunctionSignature,
    OutputSpec, ParameterSpec,
};
use crate::path::visitor::{visit_bools, visit_ints, visit_nodes, visit_strings};
use crate::path::{resolve, PathExpr, PathRegistry, PathVisitorInfo};
use crate::provider::{KubernetesProvider, ResourceProvider};

pub fn register(
    builder: &mut FunctionRegistryBuilder,
    paths: &Arc<PathRegistry>,
    provider: &Arc<KubernetesProvider>,
) {
    register_get(builder, paths, provider);
    register_set(builder, paths, provider);
}

/// `get-attributes`: collect every value registered under an attribute name,
/// optionally gated by a WHERE filter.
fn register_get(
    builder: &mut FunctionRegistryBuilder,
    paths: &Arc<PathRegistry>,
    provider: &Arc<KubernetesProvider>,
) {
    let paths = Arc::clone(paths);
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "get-attributes".to_string(),
            description: "Read values of one attribute class across resources".to_string(),
            parameters: vec![
                ParameterSpec::required(
                    "attribute-name",
                    DataType::String,
                    "attribute class to read",
                ),
                ParameterSpec::optional("where", DataType::String, "WHERE filter gating resources"),
            ],
            output: Some(OutputSpec {
                data_type: DataType::String,
                description: "attribute values".to_string(),
            }),
            mutating: false,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let attribute = super::required_str(args, "attribute-name")?;
            let filter = super::optional_str(args, "where")
                .map(WhereFilter::parse)
                .transpose()?;

            let mut out = Vec::new();
            let mut multi = MultiError::new();
            for doc in container.iter() {
                let info = match provider.resource_info(doc) {
                    Ok(info) => info,
                    Err(err) => {
                        multi.push(err);
                        continue;
                    }
                };
                if let Some(filter) = &filter {
                    if !matches_document(filter, doc)? {
                        continue;
                    }
                }
                for pinfo in paths.infos_for(attribute, &info.resource_type) {
                    let expr = PathExpr::parse(&pinfo.path)?;
                    for rp in resolve(doc, &expr)? {
                        let path = rp.dotted();
                        let Some(scalar) = doc.scalar(&path) else {
                            continue;
                        };
                        let value = match read_through_accessor(pinfo, &expr, scalar, &path) {
                            Ok(Some(value)) => value,
                            Ok(None) => continue,
                            Err(err) => {
                                multi.push(err);
                                continue;
                            }
                        };
                        out.push(AttributeValue {
                            resource_type: info.resource_type.clone(),
                            resource_name: info.resource_name.clone(),
                            attribute_name: attribute.to_string(),
                            path,
                            value,
                        });
                    }
                }
            }
            multi.into_result(FunctionOutput::AttributeValues(out))
        }),
    );
}

fn read_through_accessor(
    pinfo: &PathVisitorInfo,
    expr: &PathExpr,
    scalar: Scalar,
    path: &str,
) -> Result<Option<Scalar>> {
    let Some(accessor) = &pinfo.embedded_accessor else {
        return Ok(Some(scalar));
    };
    let Scalar::String(text) = &scalar else {
        return Err(Error::type_mismatch("string", scalar.type_name(), path));
    };
    let capture = expr.accessor.as_deref().unwrap_or(&accessor.capture);
    Ok(accessor
        .read(text, capture)?
        .map(Scalar::String))
}

/// `set-attribute`: write one value at every path registered under an
/// attribute name, coerced to the registered data type.
fn register_set(
    builder: &mut FunctionRegistryBuilder,
    paths: &Arc<PathRegistry>,
    provider: &Arc<KubernetesProvider>,
) {
    let paths = Arc::clone(paths);
    let provider = Arc::clone(provider);
    builder.register(
        FunctionSignature {
            name: "set-attribute".to_string(),
            description: "Write one attribute class across resources".to_string(),
            parameters: vec![
                ParameterSpec::required(
                    "attribute-name",
                    DataType::String,
                    "attribute class to write",
                ),
                ParameterSpec::required("value", DataType::String, "value to write"),
                ParameterSpec::optional("where", DataType::String, "WHERE filter gating resources"),
            ],
            output: None,
            mutating: true,
            validating: false,
            hermetic: true,
            idempotent: true,
            affected_resource_types: vec![],
            attribute_name: None,
            var_args: false,
        },
        Box::new(move |_ctx, container, args, _live| {
            let attribute = super::required_str(args, "attribute-name")?;
            let value = super::required_str(args, "value")?.to_string();
            let filter = super::optional_str(args, "where")
                .map(WhereFilter::parse)
                .transpose()?;

            let mut multi = MultiError::new();
            for doc in container.iter_mut() {
                let info = match provider.resource_info(doc) {
                    Ok(info) => info,
                    Err(err) => {
                        multi.push(err);
                        continue;
                    }
                };
                if let Some(filter) = &filter {
                    if !matches_document(filter, doc)? {
                        continue;
                    }
                }
                let infos: Vec<PathVisitorInfo> = paths
                    .infos_for(attribute, &info.resource_type)
                    .into_iter()
                    .cloned()
                    .collect();
                for pinfo in infos {
                    if let Err(err) = set_one(doc, &pinfo, &value) {
                        multi.push(err);
                    }
                }
            }
            multi.into_result(FunctionOutput::None)
        }),
    );
}

fn set_one(doc: &mut Document, pinfo: &PathVisitorInfo, value: &str) -> Result<()> {
    let expr = PathExpr::parse(&pinfo.path)?;
    match pinfo.data_type {
        DataType::String | DataType::Enum | DataType::Cel => {
            visit_strings(doc, &expr, pinfo.embedded_accessor.as_ref(), |_, _| {
                Ok(Some(value.to_string()))
            })?;
        }
        DataType::Int => {
            let parsed: i64 = value
                .parse()
                .map_err(|_| Error::Type(format!("'{}' is not an int", value)))?;
            visit_ints(doc, &expr, |_, _| Ok(Some(parsed)))?;
        }
        DataType::Bool => {
            let parsed: bool = value
                .parse()
                .map_err(|_| Error::Type(format!("'{}' is not a bool", value)))?;
            visit_bools(doc, &expr, |_, _| Ok(Some(parsed)))?;
        }
        DataType::Yaml => {
            let parsed: serde_yaml::Value = serde_yaml::from_str(value)
                .map_err(|e| Error::Type(format!("'{}' is not YAML: {}", value, e)))?;
            visit_nodes(doc, &expr, |doc, rp| doc.set(&rp.dotted(), parsed.clone()))?;
        }
        DataType::ResourceList | DataType::MutationList => {
            return Err(Error::Type(format!(
                "attribute {} has a list data type and cannot be set from a scalar",
                pinfo.attribute_name
            )));
        }
    }
    Ok(())
}

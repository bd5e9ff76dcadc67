//! Dependency ordering for heterogeneous resources.
//!
//! Creator-before-consumer edges for the well-known Kubernetes relationships
//! feed a directed graph; a Kahn front with a priority heap yields a
//! deterministic order where unconstrained resources fall back to the
//! category priority and ties keep input order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::graph::DiGraph;
use serde_yaml::Value;

use crate::document::{Document, Scalar};
use crate::error::{Error, Result};

use super::splitter::ManifestEntry;

/// Category priority for resources with no dependency constraint between
/// them. Lower applies first.
pub fn kind_priority(kind: &str) -> i32 {
    match kind {
        "Namespace" => 0,
        "ServiceAccount" => 1,
        "Service" => 2,
        "Secret" => 3,
        "ConfigMap" => 4,
        "ClusterRoleBinding" => 5,
        "ClusterRole" => 6,
        "RoleBinding" => 7,
        "Role" => 8,
        "PodDisruptionBudget" => 9,
        "Job" => 10,
        "StatefulSet" => 11,
        "Deployment" => 12,
        "DaemonSet" => 13,
        _ => 100,
    }
}

/// CRDs carry no per-type priority; equal priorities keep input order.
pub fn crd_priority(_resource_type: &str) -> i32 {
    0
}

/// Stable priority sort of definition resources, as input indices.
pub fn order_crds(entries: &[ManifestEntry]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| crd_priority(&entries[i].info.resource_type));
    order
}

/// Dependency order for non-definition resources, as input indices.
pub fn order_resources(entries: &[ManifestEntry]) -> Result<Vec<usize>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<_> = (0..entries.len()).map(|i| graph.add_node(i)).collect();

    for (consumer_idx, consumer) in entries.iter().enumerate() {
        for (creator_idx, creator) in entries.iter().enumerate() {
            if creator_idx != consumer_idx && depends_on(consumer, creator) {
                graph.add_edge(nodes[creator_idx], nodes[consumer_idx], ());
            }
        }
    }

    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(Error::Internal(
            "dependency cycle between rendered resources".to_string(),
        ));
    }

    // Kahn's algorithm; the ready front is drained smallest
    // (priority, input index) first, which keeps the order deterministic.
    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| {
            graph
                .neighbors_directed(n, petgraph::Direction::Incoming)
                .count()
        })
        .collect();
    let mut heap: BinaryHeap<Reverse<(i32, usize)>> = BinaryHeap::new();
    for (i, &degree) in in_degree.iter().enumerate() {
        if degree == 0 {
            heap.push(Reverse((kind_priority(&entries[i].kind), i)));
        }
    }

    let mut order = Vec::with_capacity(entries.len());
    while let Some(Reverse((_, i))) = heap.pop() {
        order.push(i);
        for succ in graph.neighbors_directed(nodes[i], petgraph::Direction::Outgoing) {
            let j = graph[succ];
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                heap.push(Reverse((kind_priority(&entries[j].kind), j)));
            }
        }
    }
    Ok(order)
}

/// Does `consumer` need `creator` applied first?
fn depends_on(consumer: &ManifestEntry, creator: &ManifestEntry) -> bool {
    match creator.kind.as_str() {
        "Namespace" => namespace_of(&consumer.doc).as_deref() == scopeless_name(creator),
        "ServiceAccount" => {
            matches!(consumer.kind.as_str(), "RoleBinding" | "ClusterRoleBinding")
                && binds_service_account(consumer, creator)
        }
        "Service" => {
            matches!(
                consumer.kind.as_str(),
                "Deployment" | "StatefulSet" | "DaemonSet"
            ) && same_namespace(consumer, creator)
                && references_service(consumer, creator)
        }
        "ConfigMap" => {
            same_namespace(consumer, creator)
                && mounts_object(consumer, creator, "configMap", "configMapRef", "configMapKeyRef")
        }
        "Secret" => {
            same_namespace(consumer, creator)
                && mounts_object(consumer, creator, "secret", "secretRef", "secretKeyRef")
        }
        "CustomResourceDefinition" => is_custom_resource_of(consumer, creator),
        _ => false,
    }
}

fn scopeless_name(entry: &ManifestEntry) -> Option<&str> {
    entry.info.resource_name.split_once('/').map(|(_, n)| n)
}

fn namespace_of(doc: &Document) -> Option<String> {
    match doc.scalar("metadata.namespace") {
        Some(Scalar::String(ns)) if !ns.is_empty() => Some(ns),
        _ => None,
    }
}

fn same_namespace(a: &ManifestEntry, b: &ManifestEntry) -> bool {
    namespace_of(&a.doc) == namespace_of(&b.doc)
}

fn binds_service_account(binding: &ManifestEntry, account: &ManifestEntry) -> bool {
    let Some(account_name) = scopeless_name(account) else {
        return false;
    };
    let Some(Value::Sequence(subjects)) = binding.doc.get("subjects") else {
        return false;
    };
    subjects.iter().any(|subject| {
        string_field(subject, "kind") == Some("ServiceAccount")
            && string_field(subject, "name") == Some(account_name)
    })
}

fn references_service(workload: &ManifestEntry, service: &ManifestEntry) -> bool {
    let Some(service_name) = scopeless_name(service) else {
        return false;
    };
    // StatefulSets name their governing service directly.
    if let Some(Scalar::String(governing)) = workload.doc.scalar("spec.serviceName") {
        if governing == service_name {
            return true;
        }
    }
    // Otherwise the service selector must select the workload's pod template.
    let Some(Value::Mapping(selector)) = service.doc.get("spec.selector") else {
        return false;
    };
    if selector.is_empty() {
        return false;
    }
    let Some(Value::Mapping(labels)) = workload.doc.get("spec.template.metadata.labels") else {
        return false;
    };
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|label| label == v))
}

fn mounts_object(
    workload: &ManifestEntry,
    object: &ManifestEntry,
    volume_field: &str,
    env_from_field: &str,
    value_from_field: &str,
) -> bool {
    let Some(object_name) = scopeless_name(object) else {
        return false;
    };
    let Some(pod_spec_path) = pod_spec_path(&workload.kind) else {
        return false;
    };
    let Some(pod_spec) = workload.doc.get(pod_spec_path) else {
        return false;
    };

    if let Some(Value::Sequence(volumes)) = pod_spec.get("volumes") {
        for volume in volumes {
            let source = volume.get(volume_field);
            let name = source.and_then(|s| {
                string_field(s, "name").or_else(|| string_field(s, "secretName"))
            });
            if name == Some(object_name) {
                return true;
            }
        }
    }

    for containers_field in ["containers", "initContainers"] {
        let Some(Value::Sequence(containers)) = pod_spec.get(containers_field) else {
            continue;
        };
        for container in containers {
            if let Some(Value::Sequence(env_from)) = container.get("envFrom") {
                for source in env_from {
                    let name = source.get(env_from_field).and_then(|r| string_field(r, "name"));
                    if name == Some(object_name) {
                        return true;
                    }
                }
            }
            if let Some(Value::Sequence(env)) = container.get("env") {
                for entry in env {
                    let name = entry
                        .get("valueFrom")
                        .and_then(|v| v.get(value_from_field))
                        .and_then(|r| string_field(r, "name"));
                    if name == Some(object_name) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn is_custom_resource_of(consumer: &ManifestEntry, crd: &ManifestEntry) -> bool {
    let Some(Scalar::String(group)) = crd.doc.scalar("spec.group") else {
        return false;
    };
    let Some(Scalar::String(kind)) = crd.doc.scalar("spec.names.kind") else {
        return false;
    };
    consumer.kind == kind
        && consumer
            .info
            .resource_type
            .starts_with(&format!("{}/", group))
}

fn pod_spec_path(kind: &str) -> Option<&'static str> {
    match kind {
        "Pod" => Some("spec"),
        "Deployment" | "StatefulSet" | "DaemonSet" | "Job" | "ReplicaSet" => {
            Some("spec.template.spec")
        }
        "CronJob" => Some("spec.jobTemplate.spec.template.spec"),
        _ => None,
    }
}

fn string_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

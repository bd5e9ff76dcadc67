use manifold::document::{DocContainer, Scalar};
use manifold::function::{ArgValue, FunctionContext, FunctionOutput};
use manifold::provider::ResourceProvider;
use manifold::{Engine, Error};

const WORKLOADS: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: my-app
  namespace: prod
spec:
  replicas: 3
  template:
    spec:
      containers:
      - name: main
        image: nginx:1.14.2
      - name: sidecar
        image: envoy:1.30
---
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: db
  namespace: prod
spec:
  template:
    spec:
      containers:
      - name: postgres
        image: postgres:16
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: cfg
  namespace: prod
data:
  key: value
"#;

fn engine() -> Engine {
    Engine::kubernetes().unwrap()
}

fn container() -> DocContainer {
    DocContainer::parse_all(WORKLOADS).unwrap()
}

fn ctx() -> FunctionContext {
    FunctionContext::new("billing", "prod")
}

#[test]
fn test_get_resources() {
    let outcome = engine()
        .invoke("get-resources", &ctx(), container(), &[], b"")
        .unwrap();
    assert!(outcome.error.is_none());
    let FunctionOutput::ResourceList(resources) = outcome.result else {
        panic!("expected resource list");
    };
    assert_eq!(resources.len(), 3);
    assert_eq!(resources[0].resource_type, "apps/v1/Deployment");
    assert_eq!(resources[0].resource_name, "prod/my-app");
    assert_eq!(resources[0].category, "workload");
}

#[test]
fn test_get_attributes_container_image() {
    let outcome = engine()
        .invoke(
            "get-attributes",
            &ctx(),
            container(),
            &[ArgValue::String("container-image".into())],
            b"",
        )
        .unwrap();
    let FunctionOutput::AttributeValues(values) = outcome.result else {
        panic!("expected attribute values");
    };
    let images: Vec<&str> = values
        .iter()
        .filter_map(|v| v.value.as_str())
        .collect();
    assert_eq!(images, vec!["nginx:1.14.2", "envoy:1.30", "postgres:16"]);
}

#[test]
fn test_get_attributes_with_where_filter() {
    let outcome = engine()
        .invoke(
            "get-attributes",
            &ctx(),
            container(),
            &[
                ArgValue::String("container-image".into()),
                ArgValue::String("metadata.name = 'db'".into()),
            ],
            b"",
        )
        .unwrap();
    let FunctionOutput::AttributeValues(values) = outcome.result else {
        panic!("expected attribute values");
    };
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].resource_name, "prod/db");
    assert_eq!(values[0].value.as_str(), Some("postgres:16"));
}

#[test]
fn test_image_tag_accessor_reads_slices() {
    let outcome = engine()
        .invoke(
            "get-attributes",
            &ctx(),
            container(),
            &[ArgValue::String("container-image-tag".into())],
            b"",
        )
        .unwrap();
    let FunctionOutput::AttributeValues(values) = outcome.result else {
        panic!("expected attribute values");
    };
    let tags: Vec<&str> = values.iter().filter_map(|v| v.value.as_str()).collect();
    assert_eq!(tags, vec!["1.14.2", "1.30", "16"]);
}

#[test]
fn test_set_attribute_with_where_filter() {
    let outcome = engine()
        .invoke(
            "set-attribute",
            &ctx(),
            container(),
            &[
                ArgValue::String("container-image-tag".into()),
                ArgValue::String("1.25.0".into()),
                ArgValue::String("metadata.name = 'my-app'".into()),
            ],
            b"",
        )
        .unwrap();
    assert!(outcome.error.is_none());
    let doc = outcome.container.get(0).unwrap();
    assert_eq!(
        doc.scalar("spec.template.spec.containers.0.image"),
        Some(Scalar::String("nginx:1.25.0".to_string()))
    );
    assert_eq!(
        doc.scalar("spec.template.spec.containers.1.image"),
        Some(Scalar::String("envoy:1.25.0".to_string()))
    );
    // The StatefulSet was filtered out.
    let db = outcome.container.get(1).unwrap();
    assert_eq!(
        db.scalar("spec.template.spec.containers.0.image"),
        Some(Scalar::String("postgres:16".to_string()))
    );
}

#[test]
fn test_set_attribute_is_idempotent() {
    let engine = engine();
    let args = [
        ArgValue::String("container-image".into()),
        ArgValue::String("mirror.local/app:1".into()),
    ];
    let once = engine
        .invoke("set-attribute", &ctx(), container(), &args, b"")
        .unwrap();
    let twice = engine
        .invoke("set-attribute", &ctx(), once.container.clone(), &args, b"")
        .unwrap();
    assert_eq!(once.container, twice.container);
}

#[test]
fn test_where_filter_function() {
    let outcome = engine()
        .invoke(
            "where-filter",
            &ctx(),
            container(),
            &[ArgValue::String(
                "spec.template.spec.containers.*.image='nginx:1.14.2'".into(),
            )],
            b"",
        )
        .unwrap();
    let validation = outcome.result.as_validation().unwrap();
    assert!(validation.passed);
    assert_eq!(validation.details, vec!["prod/my-app"]);

    // A broken expression still yields a validation result, with the error
    // alongside it.
    let outcome = engine()
        .invoke(
            "where-filter",
            &ctx(),
            container(),
            &[ArgValue::String("spec.replicas >< 3".into())],
            b"",
        )
        .unwrap();
    assert!(outcome.error.is_some());
    let validation = outcome.result.as_validation().unwrap();
    assert!(!validation.passed);
}

#[test]
fn test_replicate_inserts_suffixed_copies() {
    let engine = engine();
    let args = [
        ArgValue::String("workload".into()),
        ArgValue::String("apps/v1/Deployment".into()),
        ArgValue::String("my-app".into()),
        ArgValue::Int(3),
    ];
    let outcome = engine
        .invoke("replicate", &ctx(), container(), &args, b"")
        .unwrap();
    assert!(outcome.error.is_none());
    assert_eq!(outcome.container.len(), 5);

    let provider = engine.provider();
    let names: Vec<String> = outcome
        .container
        .iter()
        .map(|doc| provider.resource_name(doc).unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "prod/my-app",
            "prod/my-app1",
            "prod/my-app2",
            "prod/db",
            "prod/cfg"
        ]
    );

    // Same replica count again is a no-op.
    let again = engine
        .invoke("replicate", &ctx(), outcome.container.clone(), &args, b"")
        .unwrap();
    assert_eq!(again.container, outcome.container);
}

#[test]
fn test_replicate_requires_at_least_one_replica() {
    let err = engine()
        .invoke(
            "replicate",
            &ctx(),
            container(),
            &[
                ArgValue::String("workload".into()),
                ArgValue::String("apps/v1/Deployment".into()),
                ArgValue::String("my-app".into()),
                ArgValue::Int(0),
            ],
            b"",
        )
        .unwrap_err();
    assert!(matches!(err, Error::Type(_)));
}

#[test]
fn test_upsert_replaces_in_place_or_appends() {
    let engine = engine();

    let replacement = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: cfg
  namespace: prod
data:
  key: updated
"#;
    let outcome = engine
        .invoke(
            "upsert-resource",
            &ctx(),
            container(),
            &[ArgValue::String(replacement.into())],
            b"",
        )
        .unwrap();
    assert_eq!(outcome.container.len(), 3);
    assert_eq!(
        outcome.container.get(2).unwrap().scalar("data.key"),
        Some(Scalar::String("updated".to_string()))
    );

    let fresh = r#"
apiVersion: v1
kind: Secret
metadata:
  name: token
  namespace: prod
"#;
    let outcome = engine
        .invoke(
            "upsert-resource",
            &ctx(),
            outcome.container,
            &[ArgValue::String(fresh.into())],
            b"",
        )
        .unwrap();
    assert_eq!(outcome.container.len(), 4);
    assert_eq!(
        engine
            .provider()
            .resource_name(outcome.container.get(3).unwrap())
            .unwrap(),
        "prod/token"
    );
}

#[test]
fn test_delete_resource_and_not_found() {
    let engine = engine();
    let outcome = engine
        .invoke(
            "delete-resource",
            &ctx(),
            container(),
            &[
                ArgValue::String("v1/ConfigMap".into()),
                ArgValue::String("cfg".into()),
            ],
            b"",
        )
        .unwrap();
    assert!(outcome.error.is_none());
    assert_eq!(outcome.container.len(), 2);

    let outcome = engine
        .invoke(
            "delete-resource",
            &ctx(),
            outcome.container,
            &[
                ArgValue::String("v1/ConfigMap".into()),
                ArgValue::String("cfg".into()),
            ],
            b"",
        )
        .unwrap();
    assert!(matches!(outcome.error, Some(Error::NotFound(_))));
    // The failed transformation handed back the unchanged container.
    assert_eq!(outcome.container.len(), 2);
}

#[test]
fn test_default_names_from_template() {
    let input = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: replaceme
  namespace: prod
"#;
    let outcome = engine()
        .invoke(
            "set-default-names",
            &ctx(),
            DocContainer::parse_all(input).unwrap(),
            &[],
            b"",
        )
        .unwrap();
    assert!(outcome.error.is_none());
    assert_eq!(
        outcome.container.get(0).unwrap().scalar("metadata.name"),
        Some(Scalar::String("billing-prod".to_string()))
    );

    // Names without the placeholder are left alone.
    let untouched = engine()
        .invoke("set-default-names", &ctx(), container(), &[], b"")
        .unwrap();
    assert_eq!(untouched.container, container());
}

#[test]
fn test_ensure_context_stamps_annotations() {
    let mut ctx = ctx();
    ctx.revision = 12;
    let outcome = engine()
        .invoke("ensure-context", &ctx, container(), &[], b"")
        .unwrap();
    assert!(outcome.error.is_none());
    let doc = outcome.container.get(0).unwrap();
    assert_eq!(
        doc.scalar("metadata.annotations.config~0manifold~0dev/unit"),
        Some(Scalar::String("billing".to_string()))
    );
    assert_eq!(
        doc.scalar("metadata.annotations.config~0manifold~0dev/space"),
        Some(Scalar::String("prod".to_string()))
    );
    // Revision bumping stays behind the bump-revision feature.
    assert_eq!(
        doc.scalar("metadata.annotations.config~0manifold~0dev/revision"),
        Some(Scalar::String("12".to_string()))
    );
}

#[test]
fn test_compute_patch_reset_through_dispatch() {
    let engine = engine();
    let previous = container();

    let mut modified = previous.clone();
    modified
        .get_mut(0)
        .unwrap()
        .set_scalar("spec.replicas", &Scalar::Int(5))
        .unwrap();

    let outcome = engine
        .invoke(
            "compute-mutations",
            &ctx(),
            modified.clone(),
            &[
                ArgValue::String(previous.to_yaml().unwrap()),
                ArgValue::Int(2),
            ],
            b"",
        )
        .unwrap();
    let mutations = outcome.result.as_mutations().unwrap().to_vec();
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].function_index, 2);

    let patched = engine
        .invoke(
            "patch-mutations",
            &ctx(),
            previous.clone(),
            &[
                ArgValue::Mutations(mutations.clone()),
                ArgValue::Mutations(mutations.clone()),
            ],
            b"",
        )
        .unwrap();
    assert_eq!(
        patched.container.get(0).unwrap().scalar("spec.replicas"),
        Some(Scalar::Int(5))
    );

    let reset = engine
        .invoke(
            "reset-mutations",
            &ctx(),
            patched.container,
            &[ArgValue::Mutations(mutations)],
            b"",
        )
        .unwrap();
    assert_eq!(
        reset.container.get(0).unwrap().scalar("spec.replicas"),
        Some(Scalar::Int(manifold::placeholder::INT))
    );
}

#[test]
fn test_namespace_reference_excluded_for_cluster_scoped() {
    let input = r#"
apiVersion: v1
kind: Namespace
metadata:
  name: prod
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: cfg
  namespace: prod
"#;
    let outcome = engine()
        .invoke(
            "get-attributes",
            &ctx(),
            DocContainer::parse_all(input).unwrap(),
            &[ArgValue::String("namespace-name-reference".into())],
            b"",
        )
        .unwrap();
    let FunctionOutput::AttributeValues(values) = outcome.result else {
        panic!("expected attribute values");
    };
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].resource_name, "prod/cfg");
    assert_eq!(values[0].value.as_str(), Some("prod"));
}

#[test]
fn test_path_registry_listing_is_exposed() {
    let engine = engine();
    let registry = engine.path_registry();
    assert!(registry.attribute_names().contains(&"container-image"));
    let listing = serde_json::to_string(registry.listing()).unwrap();
    assert!(listing.contains("container-image"));
    assert!(listing.contains("metadata.name"));

    let signatures = engine.signatures();
    assert!(signatures.iter().any(|s| s.name == "replicate"));
    assert!(signatures.iter().any(|s| s.name == "where-filter"));
}

use manifold::document::DocContainer;
use manifold::filter::{evaluate, WhereFilter};
use manifold::provider::KubernetesProvider;
use manifold::Error;

const TWO_CONTAINERS: &str = r#"
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
      - name: otel-sidecar
        image: otel/collector:0.96
        securityContext:
          runAsNonRoot: true
        resources:
          requests:
            cpu: 250m
            memory: 128Mi
      - name: main
        image: nginx:1.14.2
        resources:
          requests:
            cpu: 500m
            memory: 1Gi
"#;

const OTHER_APP: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: other
  namespace: prod
spec:
  replicas: 1
  template:
    spec:
      containers:
      - name: main
        image: redis:7
"#;

fn fixture() -> DocContainer {
    DocContainer::parse_all(&format!("{}\n---\n{}", TWO_CONTAINERS, OTHER_APP)).unwrap()
}

fn passes(expression: &str) -> bool {
    let filter = WhereFilter::parse(expression).unwrap();
    evaluate(&filter, &fixture(), &KubernetesProvider::new())
        .unwrap()
        .passed
}

#[test]
fn test_wildcard_any_match() {
    assert!(passes(
        "spec.template.spec.containers.*.image='nginx:1.14.2'"
    ));
    assert!(!passes(
        "spec.template.spec.containers.*.image='nginx:9.9.9'"
    ));
}

#[test]
fn test_integer_comparison() {
    assert!(passes("spec.replicas > 1"));
    assert!(passes("spec.replicas >= 3"));
    assert!(!passes("spec.replicas > 3"));
}

#[test]
fn test_split_path_missing_property() {
    // One container lacks securityContext.runAsNonRoot entirely: only
    // inequality sees the gap.
    assert!(passes(
        "spec.template.spec.containers.*.|securityContext.runAsNonRoot != true"
    ));
    assert!(!passes(
        "spec.template.spec.containers.*.|securityContext.runAsNonRoot = false"
    ));
    assert!(passes(
        "spec.template.spec.containers.*.|securityContext.runAsNonRoot = true"
    ));
}

#[test]
fn test_conjunction_intersects_by_resource() {
    // Both relationals hold, but on different resources only.
    let expression = "spec.replicas = 1 AND spec.template.spec.containers.*.image='nginx:1.14.2'";
    assert!(!passes(expression));

    let expression = "spec.replicas = 3 AND spec.template.spec.containers.*.image='nginx:1.14.2'";
    assert!(passes(expression));
}

#[test]
fn test_conjunction_is_commutative() {
    let provider = KubernetesProvider::new();
    let container = fixture();
    let forward = WhereFilter::parse("spec.replicas > 1 AND metadata.namespace = 'prod'").unwrap();
    let backward = WhereFilter::parse("metadata.namespace = 'prod' AND spec.replicas > 1").unwrap();
    let a = evaluate(&forward, &container, &provider).unwrap();
    let b = evaluate(&backward, &container, &provider).unwrap();
    assert_eq!(a.matched, b.matched);
    assert!(a.passed);
}

#[test]
fn test_matched_resources_are_reported() {
    let filter = WhereFilter::parse("metadata.namespace = 'prod'").unwrap();
    let outcome = evaluate(&filter, &fixture(), &KubernetesProvider::new()).unwrap();
    assert_eq!(outcome.matched, vec!["prod/my-app", "prod/other"]);
}

#[test]
fn test_quantity_comparisons() {
    assert!(passes(
        "spec.template.spec.containers.*.resources.requests.cpu < '1'"
    ));
    assert!(passes(
        "spec.template.spec.containers.*.resources.requests.cpu >= '500m'"
    ));
    assert!(passes(
        "spec.template.spec.containers.*.resources.requests.memory = '1024Mi'"
    ));
    assert!(!passes(
        "spec.template.spec.containers.*.resources.requests.memory > '1Gi'"
    ));
}

#[test]
fn test_boolean_rejects_ordered_operators() {
    let err = WhereFilter::parse("spec.paused > true").unwrap_err();
    assert!(matches!(err, Error::Type(_)));
}

#[test]
fn test_syntax_error_reports_offending_substring() {
    let err = WhereFilter::parse("spec.replicas >< 3").unwrap_err();
    match err {
        Error::Syntax { offending, .. } => assert!(offending.starts_with('<')),
        other => panic!("expected syntax error, got {}", other),
    }

    let err = WhereFilter::parse("spec.replicas = 3 AND").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
}

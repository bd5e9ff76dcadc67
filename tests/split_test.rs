use manifold::provider::KubernetesProvider;
use manifold::split::split_and_order;
use manifold::Error;

fn file(name: &str, content: &str) -> (String, String) {
    (name.to_string(), content.to_string())
}

/// A trimmed-down Loki chart render: one resource per kind, deliberately fed
/// in scrambled order.
fn loki_files() -> Vec<(String, String)> {
    vec![
        file(
            "templates/daemonset.yaml",
            r#"
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: loki-canary
  namespace: loki
spec:
  template:
    metadata:
      labels:
        app: loki-canary
    spec:
      containers:
      - name: canary
        image: grafana/loki-canary:3.0.0
"#,
        ),
        file(
            "templates/clusterrole.yaml",
            r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: loki-clusterrole
rules: []
"#,
        ),
        file(
            "templates/clusterrolebinding.yaml",
            r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRoleBinding
metadata:
  name: loki-clusterrolebinding
roleRef:
  kind: ClusterRole
  name: loki-clusterrole
subjects:
- kind: ServiceAccount
  name: loki
  namespace: loki
"#,
        ),
        file(
            "templates/configmap.yaml",
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: loki-config
  namespace: loki
data:
  config.yaml: "{}"
"#,
        ),
        file(
            "templates/deployment-gateway.yaml",
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: loki-gateway
  namespace: loki
spec:
  template:
    metadata:
      labels:
        app: loki-gateway
    spec:
      containers:
      - name: gateway
        image: nginx:1.27
"#,
        ),
        file(
            "templates/job.yaml",
            r#"
apiVersion: batch/v1
kind: Job
metadata:
  name: loki-minio-post-job
  namespace: loki
spec:
  template:
    spec:
      containers:
      - name: post
        image: minio/mc:latest
"#,
        ),
        file(
            "templates/pdb.yaml",
            r#"
apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: loki-pdb
  namespace: loki
spec:
  minAvailable: 1
"#,
        ),
        file(
            "templates/service.yaml",
            r#"
apiVersion: v1
kind: Service
metadata:
  name: loki
  namespace: loki
spec:
  selector:
    app: loki
  ports:
  - port: 3100
"#,
        ),
        file(
            "templates/serviceaccount.yaml",
            r#"
apiVersion: v1
kind: ServiceAccount
metadata:
  name: loki
  namespace: loki
"#,
        ),
        file(
            "templates/statefulset.yaml",
            r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: loki
  namespace: loki
spec:
  serviceName: loki
  template:
    metadata:
      labels:
        app: loki
    spec:
      containers:
      - name: loki
        image: grafana/loki:3.0.0
      volumes:
      - name: config
        configMap:
          name: loki-config
"#,
        ),
        file("templates/NOTES.txt", "Thanks for installing loki."),
        file("templates/_helpers.tpl", "{{- define \"loki.name\" -}}"),
        file("templates/empty.yaml", "\n"),
    ]
}

#[test]
fn test_loki_dependency_order() {
    let provider = KubernetesProvider::new();
    let output = split_and_order(&provider, "loki", &loki_files()).unwrap();

    assert!(output.crds.is_empty());

    let expected = [
        "templates/serviceaccount.yaml",
        "templates/service.yaml",
        "templates/configmap.yaml",
        "templates/clusterrolebinding.yaml",
        "templates/clusterrole.yaml",
        "templates/pdb.yaml",
        "templates/job.yaml",
        "templates/statefulset.yaml",
        "templates/deployment-gateway.yaml",
        "templates/daemonset.yaml",
    ];
    let positions: Vec<usize> = expected
        .iter()
        .map(|f| {
            output
                .resources
                .find(&format!("# Source: loki/{}\n", f))
                .unwrap_or_else(|| panic!("missing header for {}", f))
        })
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted, "resources out of expected order");

    // Skipped entries leave no trace.
    assert!(!output.resources.contains("NOTES.txt"));
    assert!(!output.resources.contains("_helpers.tpl"));
    assert!(!output.resources.contains("empty.yaml"));
}

#[test]
fn test_crds_separated_from_resources() {
    let provider = KubernetesProvider::new();
    let files = vec![
        file(
            "crds/crd.yaml",
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: customs.example.com
spec:
  group: example.com
  names:
    kind: Custom
"#,
        ),
        file(
            "templates/deployment.yaml",
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: my-app
  namespace: default
spec:
  template:
    spec:
      containers:
      - name: main
        image: nginx:1.14.2
"#,
        ),
    ];
    let output = split_and_order(&provider, "mychart", &files).unwrap();

    assert!(output.crds.contains("# Source: mychart/crds/crd.yaml"));
    assert!(output.crds.contains("customs.example.com"));
    assert!(!output.crds.contains("my-app"));

    assert!(output
        .resources
        .contains("# Source: mychart/templates/deployment.yaml"));
    assert!(output.resources.contains("my-app"));
    assert!(!output.resources.contains("CustomResourceDefinition"));
}

#[test]
fn test_namespace_precedes_its_resources() {
    let provider = KubernetesProvider::new();
    // The ConfigMap arrives first but lives in the Namespace created later.
    let files = vec![
        file(
            "cm.yaml",
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: apps\n",
        ),
        file(
            "ns.yaml",
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: apps\n",
        ),
    ];
    let output = split_and_order(&provider, "src", &files).unwrap();
    let ns = output.resources.find("kind: Namespace").unwrap();
    let cm = output.resources.find("kind: ConfigMap").unwrap();
    assert!(ns < cm);
}

#[test]
fn test_multi_document_files_and_determinism() {
    let provider = KubernetesProvider::new();
    let files = vec![file(
        "all.yaml",
        r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: default
spec:
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
      - name: main
        image: nginx:1.27
---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: default
spec:
  selector:
    app: web
"#,
    )];
    let first = split_and_order(&provider, "src", &files).unwrap();
    let second = split_and_order(&provider, "src", &files).unwrap();
    assert_eq!(first, second, "identical inputs must render identically");

    // Service selects the Deployment's pods, so it applies first.
    let service = first.resources.find("kind: Service").unwrap();
    let deployment = first.resources.find("kind: Deployment").unwrap();
    assert!(service < deployment);
}

#[test]
fn test_schema_error_names_the_file() {
    let provider = KubernetesProvider::new();
    let files = vec![file(
        "templates/broken.yaml",
        "apiVersion: v1\nmetadata:\n  name: nameless\n",
    )];
    match split_and_order(&provider, "src", &files) {
        Err(Error::Schema { file, detail }) => {
            assert_eq!(file, "templates/broken.yaml");
            assert!(detail.contains("kind"));
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}

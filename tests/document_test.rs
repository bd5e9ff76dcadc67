use manifold::document::{escape_key, unescape_key, DocContainer, Document, Scalar};
use serde_yaml::Value;

const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
spec:
  replicas: 3
  template:
    spec:
      containers:
      - name: main
        image: nginx:1.14.2
      - name: sidecar
        image: envoy:1.30
"#;

#[test]
fn test_get_set_delete_exists() {
    let mut doc = Document::parse(DEPLOYMENT).unwrap();
    assert!(doc.exists("spec.replicas"));
    assert_eq!(doc.scalar("spec.replicas"), Some(Scalar::Int(3)));
    assert_eq!(
        doc.scalar("spec.template.spec.containers.0.image"),
        Some(Scalar::String("nginx:1.14.2".to_string()))
    );

    doc.set_scalar("spec.replicas", &Scalar::Int(5)).unwrap();
    assert_eq!(doc.scalar("spec.replicas"), Some(Scalar::Int(5)));

    // Intermediate mappings are created on demand.
    doc.set_scalar("metadata.annotations.team", &Scalar::String("core".to_string()))
        .unwrap();
    assert_eq!(
        doc.scalar("metadata.annotations.team"),
        Some(Scalar::String("core".to_string()))
    );

    doc.delete("metadata.labels.app").unwrap();
    assert!(!doc.exists("metadata.labels.app"));
    assert!(doc.delete("metadata.labels.app").is_err());
}

#[test]
fn test_escaped_dotted_keys() {
    let mut doc = Document::parse(DEPLOYMENT).unwrap();
    let key = escape_key("app.kubernetes.io/name");
    assert_eq!(key, "app~0kubernetes~0io/name");
    assert_eq!(unescape_key(&key), "app.kubernetes.io/name");

    let path = format!("metadata.annotations.{}", key);
    doc.set_scalar(&path, &Scalar::String("web".to_string())).unwrap();
    assert_eq!(
        doc.scalar(&path),
        Some(Scalar::String("web".to_string()))
    );
    let raw = doc
        .get("metadata.annotations")
        .and_then(|v| v.get("app.kubernetes.io/name"))
        .and_then(Value::as_str);
    assert_eq!(raw, Some("web"));
}

#[test]
fn test_ordered_children() {
    let doc = Document::parse(DEPLOYMENT).unwrap();
    let top: Vec<String> = doc.children("").into_iter().map(|(k, _)| k).collect();
    assert_eq!(top, vec!["apiVersion", "kind", "metadata", "spec"]);
    let containers: Vec<String> = doc
        .children("spec.template.spec.containers")
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(containers, vec!["0", "1"]);
}

#[test]
fn test_sequence_append_and_replace() {
    let mut doc = Document::parse(DEPLOYMENT).unwrap();
    doc.set(
        "spec.template.spec.containers.2",
        serde_yaml::from_str("{name: extra, image: busybox}").unwrap(),
    )
    .unwrap();
    assert_eq!(
        doc.scalar("spec.template.spec.containers.2.name"),
        Some(Scalar::String("extra".to_string()))
    );
    // Beyond one past the end is out of range.
    assert!(doc
        .set("spec.template.spec.containers.9", Value::Null)
        .is_err());
}

#[test]
fn test_round_trip_preserves_structure() {
    let doc = Document::parse(DEPLOYMENT).unwrap();
    let rendered = doc.to_yaml().unwrap();
    let reparsed = Document::parse(&rendered).unwrap();
    assert_eq!(doc, reparsed);
}

#[test]
fn test_multi_document_container() {
    let input = "---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: b\n";
    let container = DocContainer::parse_all(input).unwrap();
    assert_eq!(container.len(), 2);

    let rendered = container.to_yaml().unwrap();
    let reparsed = DocContainer::parse_all(&rendered).unwrap();
    assert_eq!(container, reparsed);
}

#[test]
fn test_content_hash_tracks_content() {
    let container = DocContainer::parse_all(DEPLOYMENT).unwrap();
    let first = container.content_hash().unwrap();
    assert_eq!(first, container.content_hash().unwrap());

    let mut changed = container.clone();
    changed
        .get_mut(0)
        .unwrap()
        .set_scalar("spec.replicas", &Scalar::Int(4))
        .unwrap();
    assert_ne!(first, changed.content_hash().unwrap());
}

#[test]
fn test_comment_injection() {
    let mut doc = Document::parse(DEPLOYMENT).unwrap();
    doc.set_comment("metadata.name", "managed name");
    doc.set_comment("", "rendered by manifold");
    let rendered = doc.to_yaml().unwrap();
    assert!(rendered.starts_with("# rendered by manifold\n"));
    let comment_line = rendered
        .lines()
        .position(|l| l.trim_start() == "# managed name")
        .expect("comment rendered");
    let name_line = rendered
        .lines()
        .position(|l| l.trim_start().starts_with("name: web"))
        .expect("name present");
    assert_eq!(comment_line + 1, name_line);
}

#[test]
fn test_int_coercion_accepts_integral_floats() {
    assert_eq!(Scalar::Float(3.0).as_int(), Some(3));
    assert_eq!(Scalar::Float(3.5).as_int(), None);
    assert_eq!(Scalar::String("3".to_string()).as_int(), None);
}

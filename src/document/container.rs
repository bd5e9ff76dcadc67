use serde::Deserialize;
use serde_yaml::Value;
use sha2::{Digest, Sha256};

use super::Document;
use crate::error::{Error, Result};

/// An ordered sequence of YAML documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocContainer {
    docs: Vec<Document>,
}

impl DocContainer {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// Parse a multi-document stream. Empty documents are dropped.
    pub fn parse_all(input: &str) -> Result<DocContainer> {
        let mut docs = Vec::new();
        for de in serde_yaml::Deserializer::from_str(input) {
            let value = Value::deserialize(de).map_err(|e| Error::Schema {
                file: "<inline>".to_string(),
                detail: e.to_string(),
            })?;
            if value.is_null() {
                continue;
            }
            docs.push(Document::new(value));
        }
        Ok(DocContainer { docs })
    }

    /// Round-trippable bytes: each document preceded by a `---` marker.
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for doc in &self.docs {
            out.push_str("---\n");
            out.push_str(&doc.to_yaml()?);
        }
        Ok(out)
    }

    /// Hex-encoded sha256 of the serialized container.
    pub fn content_hash(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.to_yaml()?.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.docs.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.docs.get_mut(index)
    }

    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.docs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Document> {
        self.docs.iter_mut()
    }

    pub fn push(&mut self, doc: Document) {
        self.docs.push(doc);
    }

    pub fn insert(&mut self, index: usize, doc: Document) {
        self.docs.insert(index, doc);
    }

    pub fn remove(&mut self, index: usize) -> Document {
        self.docs.remove(index)
    }
}

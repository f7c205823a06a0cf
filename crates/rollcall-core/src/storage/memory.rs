use std::collections::{BTreeMap, HashMap};

use tokio::sync::Mutex;

use super::{Document, DocumentStore};
use crate::Result;

/// In-process document store. Useful for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, serde_json::Value>>>,
    commits: Mutex<Vec<(String, usize)>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every commit seen so far as `(collection, size)`, in order.
    pub async fn commit_log(&self) -> Vec<(String, usize)> {
        self.commits.lock().await.clone()
    }

    pub async fn keys(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .await
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.lock().await;
        Ok(collections.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn find_page(&self, collection: &str, page: usize, limit: usize) -> Result<Vec<Document>> {
        let collections = self.collections.lock().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .skip(page.saturating_mul(limit))
            .take(limit)
            .map(|(key, data)| Document::new(key.clone(), data.clone()))
            .collect())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<Vec<Document>> {
        let collections = self.collections.lock().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(_, data)| field_matches(data, field, values))
            .map(|(key, data)| Document::new(key.clone(), data.clone()))
            .collect())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|data| Document::new(key, data.clone())))
    }

    async fn delete_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<usize> {
        let mut collections = self.collections.lock().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|_, data| !field_matches(data, field, values));
        Ok(before - docs.len())
    }

    async fn commit(&self, collection: &str, documents: Vec<Document>) -> Result<usize> {
        let written = documents.len();
        {
            let mut collections = self.collections.lock().await;
            let docs = collections.entry(collection.to_string()).or_default();
            for doc in documents {
                docs.insert(doc.key, doc.data);
            }
        }
        self.commits
            .lock()
            .await
            .push((collection.to_string(), written));

        Ok(written)
    }
}

fn field_matches(data: &serde_json::Value, field: &str, values: &[String]) -> bool {
    data.get(field)
        .and_then(serde_json::Value::as_str)
        .is_some_and(|v| values.iter().any(|wanted| wanted == v))
}

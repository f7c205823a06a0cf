mod memory;
mod sqlite;

use serde::de::DeserializeOwned;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::Result;

pub const REPS: &str = "reps";
pub const EDUCATION: &str = "edu";
pub const VOTES: &str = "votes";
pub const STATE_EDUCATION: &str = "state_edu";
pub const STATE_PARTY: &str = "state_party";
pub const STATE_GENDER: &str = "state_gender";

/// A keyed JSON document within a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub data: serde_json::Value,
}

impl Document {
    #[must_use]
    pub fn new(key: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            data,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Document storage used for both the primary and the derived store.
///
/// `find_page` orders by key so pages partition a static collection. `commit`
/// writes the whole set atomically, overwriting by key, and reports how many
/// writes the store acknowledged.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn count(&self, collection: &str) -> Result<u64>;

    async fn find_page(&self, collection: &str, page: usize, limit: usize) -> Result<Vec<Document>>;

    /// Documents whose top-level `field` equals one of `values`, ordered by key.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<Vec<Document>>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Remove documents whose top-level `field` equals one of `values`; returns how many.
    async fn delete_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<usize>;

    async fn commit(&self, collection: &str, documents: Vec<Document>) -> Result<usize>;
}

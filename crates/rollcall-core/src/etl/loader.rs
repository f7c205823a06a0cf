use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::{Document, DocumentStore};
use crate::{Error, Result};

/// Per-batch and cumulative write counts for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub batches: Vec<usize>,
    pub total: usize,
}

/// Accumulates documents and commits them in bounded batches.
///
/// A batch commits once it reaches `threshold`; [`BatchWriter::finish`] commits
/// whatever is left, even when nothing is. Every commit must report exactly as
/// many writes as it was given.
pub struct BatchWriter<'a> {
    store: &'a dyn DocumentStore,
    collection: String,
    id_field: Option<String>,
    threshold: usize,
    pending: Vec<Document>,
    report: LoadReport,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn DocumentStore, collection: impl Into<String>, threshold: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            id_field: None,
            threshold: threshold.max(1),
            pending: Vec::new(),
            report: LoadReport::default(),
        }
    }

    /// Key documents by this top-level field instead of a generated id.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    fn key_for(&self, data: &Value) -> Result<String> {
        let Some(field) = &self.id_field else {
            return Ok(Uuid::now_v7().to_string());
        };

        match data.get(field) {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            Some(Value::Number(key)) => Ok(key.to_string()),
            _ => Err(Error::MissingDocumentId {
                collection: self.collection.clone(),
                field: field.clone(),
            }),
        }
    }

    pub async fn push<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        let data = serde_json::to_value(record)?;
        let key = self.key_for(&data)?;
        self.pending.push(Document::new(key, data));

        if self.pending.len() >= self.threshold {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        let batch = std::mem::take(&mut self.pending);
        let attempted = batch.len();
        let number = self.report.batches.len() + 1;

        let committed = self.store.commit(&self.collection, batch).await?;
        if committed != attempted {
            return Err(Error::CountMismatch {
                collection: self.collection.clone(),
                batch: number,
                attempted,
                committed,
            });
        }

        self.report.batches.push(committed);
        self.report.total += committed;
        debug!(
            "{}: batch {} committed {} (total {})",
            self.collection, number, committed, self.report.total
        );
        Ok(())
    }

    /// Commit the remainder and return the report.
    pub async fn finish(mut self) -> Result<LoadReport> {
        self.flush().await?;
        info!(
            "{}: wrote {} documents in {} batches",
            self.collection,
            self.report.total,
            self.report.batches.len()
        );
        Ok(self.report)
    }
}

/// Drain `records` into `collection` through a [`BatchWriter`].
pub async fn load<I, T>(
    store: &dyn DocumentStore,
    collection: &str,
    records: I,
    id_field: Option<&str>,
    threshold: usize,
) -> Result<LoadReport>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut writer = BatchWriter::new(store, collection, threshold);
    if let Some(field) = id_field {
        writer = writer.with_id_field(field);
    }

    for record in records {
        writer.push(&record).await?;
    }
    writer.finish().await
}

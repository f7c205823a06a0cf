use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Document in {collection} has no usable id field '{field}'")]
    MissingDocumentId { collection: String, field: String },

    #[error(
        "Write count mismatch in {collection} batch {batch}: attempted {attempted}, committed {committed}"
    )]
    CountMismatch {
        collection: String,
        batch: usize,
        attempted: usize,
        committed: usize,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

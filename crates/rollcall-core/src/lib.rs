#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::option_if_let_else)]

pub mod config;
pub mod education;
pub mod error;
pub mod etl;
pub mod ingest;
pub mod outcome;
pub mod representative;
pub mod source;
pub mod storage;
pub mod vote;

pub use config::{Config, ConfigError, PipelineConfig, SourceConfig, StoreConfig, VoteSession};
pub use education::{normalize_degree, DegreeCategory, EducationEntry, EducationPair};
pub use error::{Error, Result};
pub use etl::{load, Aggregator, BatchWriter, LoadReport, RepresentativeSummary, StateAggregate};
pub use ingest::{IdentityResolver, Resolution, ResolvedBy, StageReport};
pub use outcome::{FailureKind, Outcome};
pub use representative::Representative;
pub use storage::{Document, DocumentStore, MemoryStore, SqliteStore};
pub use vote::{RollCallVote, VotePosition};

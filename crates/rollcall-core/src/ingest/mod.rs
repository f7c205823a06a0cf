//! Upstream ingest: normalization, identity resolution, education extraction and
//! the stage functions that drive them.

mod education;
mod normalizer;
mod pipeline;
mod resolver;

pub use education::{
    EducationExtractor, ExtractionError, ExtractionResult, VoteSmartBiography,
    DEFAULT_MAX_DEGREE_LEN,
};
pub use normalizer::{
    api_call_id, normalize_member, normalize_roll_call, NormalizationError,
    NormalizationResult,
};
pub use pipeline::{
    extract_education, ingest_members, ingest_votes, resolve_identities, EducationSources,
    StageReport,
};
pub use resolver::{IdentityResolver, Resolution, ResolutionStep, ResolvedBy};

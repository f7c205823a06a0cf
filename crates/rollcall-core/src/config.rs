use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PROPUBLICA_API_KEY: &str = "ROLLCALL_PROPUBLICA_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "ROLLCALL_GOOGLE_API_KEY";
pub const ENV_PRIMARY_DB: &str = "ROLLCALL_PRIMARY_DB";
pub const ENV_SECONDARY_DB: &str = "ROLLCALL_SECONDARY_DB";

/// Endpoints and credentials for the upstream data sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// ProPublica Congress API root, with trailing slash
    pub propublica_root: String,
    pub propublica_api_key: Option<String>,
    /// Google Knowledge Graph search endpoint
    pub knowledge_graph_endpoint: String,
    pub google_api_key: Option<String>,
    /// MediaWiki action API endpoint
    pub mediawiki_endpoint: String,
    /// Prefix that turns an article title into a page URL
    pub wiki_page_root: String,
    /// Vote Smart biography page prefix
    pub votesmart_biography_root: String,
    /// Maximum results requested from search endpoints
    pub result_limit: u32,
    pub connect_timeout_seconds: u32,
    pub request_timeout_seconds: u32,
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            propublica_root: "https://api.propublica.org/congress/v1/".to_string(),
            propublica_api_key: None,
            knowledge_graph_endpoint: "https://kgsearch.googleapis.com/v1/entities:search"
                .to_string(),
            google_api_key: None,
            mediawiki_endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            wiki_page_root: "https://en.wikipedia.org/wiki/".to_string(),
            votesmart_biography_root: "https://justfacts.votesmart.org/candidate/biography/"
                .to_string(),
            result_limit: 10,
            connect_timeout_seconds: 30,
            request_timeout_seconds: 60,
            user_agent: None,
        }
    }
}

/// Roll calls to pull for one congressional session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSession {
    pub congress: u32,
    pub session: u32,
    /// Highest roll-call number; calls are numbered from 1
    pub roll_calls: u32,
}

impl VoteSession {
    #[must_use]
    pub const fn new(congress: u32, session: u32, roll_calls: u32) -> Self {
        Self {
            congress,
            session,
            roll_calls,
        }
    }
}

/// Knobs for the ingest, aggregation and load stages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Congresses whose House members are ingested
    pub congresses: Vec<u32>,
    pub vote_sessions: Vec<VoteSession>,
    /// Congress used to derive the in-office flag; the stored flag is used when unset
    pub current_congress: Option<u32>,
    /// Documents read per aggregation page
    pub page_size: usize,
    /// Documents per committed batch
    pub batch_size: usize,
    /// Batch size for education entries
    pub education_batch_size: usize,
    /// Tokens shorter than this many characters are read as degrees
    pub max_degree_len: usize,
    /// Restrict state aggregates to members currently in office
    pub in_office_only: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            congresses: vec![116, 117],
            vote_sessions: vec![
                VoteSession::new(116, 1, 701),
                VoteSession::new(116, 2, 253),
                VoteSession::new(117, 1, 18),
            ],
            current_congress: Some(117),
            page_size: 500,
            batch_size: 500,
            education_batch_size: 400,
            max_degree_len: 10,
            in_office_only: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Primary store holding canonical records
    pub primary: PathBuf,
    /// Secondary store holding derived documents
    pub secondary: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rollcall");
        Self {
            primary: root.join("primary.db"),
            secondary: root.join("secondary.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub stores: StoreConfig,
}

impl Config {
    /// Load from an optional JSON file, then apply environment overrides.
    ///
    /// A `.env` file in the working directory is honored.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        dotenvy::dotenv().ok();
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_PROPUBLICA_API_KEY) {
            self.source.propublica_api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_GOOGLE_API_KEY) {
            self.source.google_api_key = Some(key);
        }
        if let Some(path) = lookup(ENV_PRIMARY_DB) {
            self.stores.primary = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_SECONDARY_DB) {
            self.stores.secondary = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;
        if pipeline.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        if pipeline.batch_size == 0 || pipeline.education_batch_size == 0 {
            return Err(ConfigError::Invalid("batch sizes must be positive".into()));
        }
        if pipeline.max_degree_len < 2 {
            return Err(ConfigError::Invalid("max_degree_len must be at least 2".into()));
        }
        if !self.source.propublica_root.ends_with('/') {
            return Err(ConfigError::Invalid(
                "propublica_root must end with '/'".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

//! Upstream data sources.
//!
//! Every call returns an [`Outcome`] instead of an error so callers can branch on
//! the failure kind and keep going with the next strategy.

mod client;
mod knowledge_graph;
mod mediawiki;
mod propublica;

use serde::{Deserialize, Serialize};

pub use client::{classify_status, ClientError, ClientResult, HttpClient};
pub use knowledge_graph::{parse_entity_search, GoogleKnowledgeGraph};
pub use mediawiki::{parse_search_results, MediaWiki};
pub use propublica::{
    parse_member, parse_member_ids, parse_roll_call, ProPublica, RawBill, RawMember,
    RawPosition, RawRole, RawRollCall,
};

use crate::outcome::Outcome;

/// A knowledge graph match for a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraphEntity {
    /// Entity id without the `kg:` prefix, e.g. `/m/012v1t`
    pub id: String,
    pub name: Option<String>,
    /// Encyclopedia article URL, absent when the graph has no description
    pub reference_url: Option<String>,
}

#[async_trait::async_trait]
pub trait KnowledgeGraph: Send + Sync {
    async fn lookup_by_id(&self, id: &str) -> Outcome<KnowledgeGraphEntity>;

    async fn search_by_name(&self, query: &str) -> Outcome<KnowledgeGraphEntity>;
}

#[async_trait::async_trait]
pub trait Encyclopedia: Send + Sync {
    /// URL of the top full-text match for `query`.
    async fn search(&self, query: &str) -> Outcome<String>;
}

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Outcome<String>;
}

#[async_trait::async_trait]
pub trait CongressApi: Send + Sync {
    async fn member_ids(&self, congress: u32) -> Outcome<Vec<String>>;

    async fn member(&self, id: &str) -> Outcome<RawMember>;

    async fn roll_call(&self, congress: u32, session: u32, number: u32) -> Outcome<RawRollCall>;
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::outcome::{FailureKind, Outcome};
use crate::representative::Representative;
use crate::source::{Encyclopedia, KnowledgeGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Direct,
    NameSearch,
    Encyclopedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStep {
    DirectLookup,
    NameSearch,
    EncyclopediaSearch,
}

/// Best-effort identifiers for one representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub google_id: Option<String>,
    pub wiki_url: Option<String>,
    pub resolved_by: Option<ResolvedBy>,
    pub failures: Vec<(ResolutionStep, FailureKind)>,
}

impl Resolution {
    pub const fn is_resolved(&self) -> bool {
        self.resolved_by.is_some()
    }

    /// Kind of the last failed step, used to bucket unresolved records.
    pub fn last_failure(&self) -> Option<FailureKind> {
        self.failures.last().map(|(_, kind)| *kind)
    }

    /// Write the resolved ids onto `rep`. An unresolved URL never clears a stored one.
    pub fn apply(&self, rep: &mut Representative) {
        rep.google_id.clone_from(&self.google_id);
        if let Some(url) = &self.wiki_url {
            rep.wiki_url = Some(url.clone());
        }
    }
}

/// Cascade over the knowledge graph and the encyclopedia to find a reference URL.
pub struct IdentityResolver<'a> {
    graph: &'a dyn KnowledgeGraph,
    encyclopedia: &'a dyn Encyclopedia,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(graph: &'a dyn KnowledgeGraph, encyclopedia: &'a dyn Encyclopedia) -> Self {
        Self {
            graph,
            encyclopedia,
        }
    }

    pub async fn resolve(&self, rep: &Representative) -> Resolution {
        let mut resolution = Resolution {
            google_id: rep.google_id.clone(),
            wiki_url: None,
            resolved_by: None,
            failures: Vec::new(),
        };
        let query = rep.search_query();

        let direct = match rep.google_id.as_deref() {
            Some(id) => self.graph.lookup_by_id(id).await,
            None => Outcome::Failure(FailureKind::NotFound),
        };

        let run_name_search = match direct {
            Outcome::Success(entity) => match entity.reference_url {
                Some(url) => {
                    resolution.wiki_url = Some(url);
                    resolution.resolved_by = Some(ResolvedBy::Direct);
                    return resolution;
                }
                None => {
                    resolution
                        .failures
                        .push((ResolutionStep::DirectLookup, FailureKind::FieldMissing));
                    false
                }
            },
            Outcome::Failure(kind) => {
                resolution.failures.push((ResolutionStep::DirectLookup, kind));
                true
            }
        };

        if run_name_search {
            match self.graph.search_by_name(&query).await {
                Outcome::Success(entity) => {
                    if resolution.google_id.as_deref() != Some(entity.id.as_str()) {
                        debug!(
                            "{}: google id {:?} replaced by {}",
                            rep.id, resolution.google_id, entity.id
                        );
                    }
                    resolution.google_id = Some(entity.id);
                    match entity.reference_url {
                        Some(url) => {
                            resolution.wiki_url = Some(url);
                            resolution.resolved_by = Some(ResolvedBy::NameSearch);
                            return resolution;
                        }
                        None => resolution
                            .failures
                            .push((ResolutionStep::NameSearch, FailureKind::FieldMissing)),
                    }
                }
                Outcome::Failure(kind) => {
                    resolution.failures.push((ResolutionStep::NameSearch, kind));
                }
            }
        }

        match self.encyclopedia.search(&query).await {
            Outcome::Success(url) => {
                resolution.wiki_url = Some(url);
                resolution.resolved_by = Some(ResolvedBy::Encyclopedia);
            }
            Outcome::Failure(kind) => {
                resolution
                    .failures
                    .push((ResolutionStep::EncyclopediaSearch, kind));
            }
        }

        resolution
    }
}

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical House member record as kept in the primary store.
///
/// `id` is assigned by the legislative data source and never changes. External ids
/// may be missing at ingest time; the identity resolver fills in `google_id` and
/// `wiki_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representative {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub current_party: Option<String>,
    pub state: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub votesmart_id: Option<String>,
    #[serde(default)]
    pub govtrack_id: Option<String>,
    #[serde(default)]
    pub cspan_id: Option<String>,
    #[serde(default)]
    pub crp_id: Option<String>,
    #[serde(default)]
    pub fec_id: Option<String>,
    #[serde(default)]
    pub congresses: BTreeSet<u32>,
    #[serde(default)]
    pub in_office: bool,
    #[serde(default)]
    pub wiki_url: Option<String>,
}

impl Representative {
    #[must_use]
    pub fn new(id: String, first_name: String, last_name: String, state: String) -> Self {
        Self {
            id,
            first_name,
            middle_name: None,
            last_name,
            dob: None,
            gender: None,
            current_party: None,
            state,
            district: None,
            google_id: None,
            votesmart_id: None,
            govtrack_id: None,
            cspan_id: None,
            crp_id: None,
            fec_id: None,
            congresses: BTreeSet::new(),
            in_office: false,
            wiki_url: None,
        }
    }

    #[must_use]
    pub fn with_google_id(mut self, google_id: impl Into<String>) -> Self {
        self.google_id = Some(google_id.into());
        self
    }

    #[must_use]
    pub fn with_wiki_url(mut self, wiki_url: impl Into<String>) -> Self {
        self.wiki_url = Some(wiki_url.into());
        self
    }

    #[must_use]
    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        self.current_party = Some(party.into());
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn with_congresses(mut self, congresses: impl IntoIterator<Item = u32>) -> Self {
        self.congresses = congresses.into_iter().collect();
        self
    }

    #[must_use]
    pub fn in_office(mut self, in_office: bool) -> Self {
        self.in_office = in_office;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Query string used for knowledge graph and encyclopedia name searches.
    pub fn search_query(&self) -> String {
        format!("{} politician", self.full_name())
    }

    pub fn needs_resolution(&self) -> bool {
        self.wiki_url.is_none()
    }
}

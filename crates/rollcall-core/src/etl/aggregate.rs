use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::loader::{load, BatchWriter, LoadReport};
use crate::config::PipelineConfig;
use crate::education::{DegreeCategory, EducationEntry, EducationPair};
use crate::representative::Representative;
use crate::storage::{
    DocumentStore, EDUCATION, REPS, STATE_EDUCATION, STATE_GENDER, STATE_PARTY,
};
use crate::Result;

/// The 50 states plus DC. Territories are left out of state aggregates.
pub const VALID_STATES: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL",
    "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE",
    "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VA", "VT", "WA", "WI", "WV", "WY",
];

pub const PARTIES: [&str; 3] = ["D", "R", "ID"];
pub const GENDERS: [&str; 2] = ["M", "F"];

pub fn is_valid_state(state: &str) -> bool {
    VALID_STATES.contains(&state)
}

/// District number, or a label such as `At-Large`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum District {
    Number(u32),
    Label(String),
}

impl District {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse()
            .map_or_else(|_| Self::Label(raw.to_string()), Self::Number)
    }
}

/// Flattened representative row written to the secondary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub party: Option<String>,
    pub state: String,
    pub district: Option<District>,
    pub in_office: bool,
    pub wikipedia: Option<String>,
    pub degrees: Vec<String>,
    pub education: Vec<String>,
}

impl RepresentativeSummary {
    fn new(rep: &Representative, in_office: bool, pairs: &[EducationPair]) -> Self {
        Self {
            id: rep.id.clone(),
            name: rep.full_name(),
            dob: rep.dob,
            gender: rep.gender.clone(),
            party: rep.current_party.clone(),
            state: rep.state.clone(),
            district: rep.district.as_deref().map(District::parse),
            in_office,
            wikipedia: rep.wiki_url.clone(),
            degrees: pairs.iter().map(|p| p.degree.clone()).collect(),
            education: pairs.iter().map(|p| p.institution.clone()).collect(),
        }
    }

    pub fn categories(&self) -> BTreeSet<DegreeCategory> {
        self.degrees
            .iter()
            .filter_map(|d| DegreeCategory::classify(d))
            .collect()
    }
}

/// Per-state counts and ratios for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAggregate {
    #[serde(rename = "_id")]
    pub state: String,
    pub total: u32,
    pub counts: BTreeMap<String, u32>,
    pub ratios: BTreeMap<String, f64>,
}

impl StateAggregate {
    fn new(state: &str, total: u32, counts: BTreeMap<String, u32>) -> Self {
        let ratios = counts
            .iter()
            .map(|(label, count)| (label.clone(), ratio(*count, total)))
            .collect();
        Self {
            state: state.to_string(),
            total,
            counts,
            ratios,
        }
    }
}

/// `count / total` rounded to 4 decimal places, 0 for an empty state.
pub fn ratio(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(count) / f64::from(total) * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone)]
struct StateCounts {
    total: u32,
    education: BTreeMap<String, u32>,
    party: BTreeMap<String, u32>,
    gender: BTreeMap<String, u32>,
}

impl StateCounts {
    fn new() -> Self {
        let zeroed = |labels: &[&str]| -> BTreeMap<String, u32> {
            labels.iter().map(|l| ((*l).to_string(), 0)).collect()
        };
        let categories: Vec<&str> = DegreeCategory::ALL.iter().map(DegreeCategory::label).collect();
        Self {
            total: 0,
            education: zeroed(&categories),
            party: zeroed(&PARTIES),
            gender: zeroed(&GENDERS),
        }
    }

    fn bump(map: &mut BTreeMap<String, u32>, label: &str) {
        if let Some(count) = map.get_mut(label) {
            *count += 1;
        }
    }
}

/// Running per-state tallies. Feeds from every page so totals cover the whole collection.
#[derive(Debug, Clone, Default)]
pub struct StateTally {
    in_office_only: bool,
    states: BTreeMap<String, StateCounts>,
}

impl StateTally {
    #[must_use]
    pub fn new(in_office_only: bool) -> Self {
        Self {
            in_office_only,
            states: BTreeMap::new(),
        }
    }

    /// Count a summary; returns whether it was counted.
    pub fn add(&mut self, summary: &RepresentativeSummary) -> bool {
        if !is_valid_state(&summary.state) || (self.in_office_only && !summary.in_office) {
            return false;
        }

        let counts = self
            .states
            .entry(summary.state.clone())
            .or_insert_with(StateCounts::new);
        counts.total += 1;
        for category in summary.categories() {
            StateCounts::bump(&mut counts.education, category.label());
        }
        if let Some(party) = &summary.party {
            StateCounts::bump(&mut counts.party, party);
        }
        if let Some(gender) = &summary.gender {
            StateCounts::bump(&mut counts.gender, gender);
        }
        true
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn education(&self) -> Vec<StateAggregate> {
        self.build(|c| &c.education)
    }

    pub fn party(&self) -> Vec<StateAggregate> {
        self.build(|c| &c.party)
    }

    pub fn gender(&self) -> Vec<StateAggregate> {
        self.build(|c| &c.gender)
    }

    fn build<F>(&self, pick: F) -> Vec<StateAggregate>
    where
        F: Fn(&StateCounts) -> &BTreeMap<String, u32>,
    {
        self.states
            .iter()
            .map(|(state, counts)| StateAggregate::new(state, counts.total, pick(counts).clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub pages: usize,
    pub representatives: usize,
    pub counted: usize,
    pub summaries: LoadReport,
    pub state_education: LoadReport,
    pub state_party: LoadReport,
    pub state_gender: LoadReport,
}

/// Pages the primary store, joins education and loads the secondary store.
pub struct Aggregator<'a> {
    primary: &'a dyn DocumentStore,
    page_size: usize,
    current_congress: Option<u32>,
    in_office_only: bool,
}

impl<'a> Aggregator<'a> {
    pub fn new(primary: &'a dyn DocumentStore, settings: &PipelineConfig) -> Self {
        Self {
            primary,
            page_size: settings.page_size.max(1),
            current_congress: settings.current_congress,
            in_office_only: settings.in_office_only,
        }
    }

    fn in_office(&self, rep: &Representative) -> bool {
        self.current_congress
            .map_or(rep.in_office, |congress| rep.congresses.contains(&congress))
    }

    /// Summaries for one page of representatives, sorted by state, district and id.
    pub async fn summarize(&self, reps: &[Representative]) -> Result<Vec<RepresentativeSummary>> {
        let ids: Vec<String> = reps.iter().map(|r| r.id.clone()).collect();
        let docs = self.primary.find_by_field(EDUCATION, "_id", &ids).await?;

        let mut education: HashMap<String, Vec<EducationPair>> = HashMap::new();
        for doc in docs {
            let entry: EducationEntry = doc.decode()?;
            education
                .entry(entry.rep_id.clone())
                .or_default()
                .push(entry.pair());
        }

        let sentinel = [EducationPair::high_school()];
        let mut summaries: Vec<RepresentativeSummary> = reps
            .iter()
            .map(|rep| {
                let pairs = education
                    .get(&rep.id)
                    .filter(|p| !p.is_empty())
                    .map_or(&sentinel[..], Vec::as_slice);
                RepresentativeSummary::new(rep, self.in_office(rep), pairs)
            })
            .collect();

        summaries.sort_by(|a, b| {
            (&a.state, &a.district, &a.id).cmp(&(&b.state, &b.district, &b.id))
        });
        Ok(summaries)
    }

    /// Aggregate every page and write summaries and state aggregates to `secondary`.
    pub async fn run(&self, secondary: &dyn DocumentStore, batch_size: usize) -> Result<AggregateReport> {
        let mut report = AggregateReport::default();
        let mut tally = StateTally::new(self.in_office_only);
        let mut writer = BatchWriter::new(secondary, REPS, batch_size).with_id_field("_id");
        let mut page = 0;

        loop {
            let docs = self.primary.find_page(REPS, page, self.page_size).await?;
            if docs.is_empty() {
                break;
            }
            let short = docs.len() < self.page_size;

            let reps = docs
                .iter()
                .map(|doc| doc.decode::<Representative>())
                .collect::<Result<Vec<_>>>()?;
            let summaries = self.summarize(&reps).await?;

            for summary in &summaries {
                if tally.add(summary) {
                    report.counted += 1;
                }
                writer.push(summary).await?;
            }

            report.pages += 1;
            report.representatives += reps.len();
            debug!("Aggregated page {} ({} representatives)", page, reps.len());

            if short {
                break;
            }
            page += 1;
        }

        report.summaries = writer.finish().await?;
        report.state_education =
            load(secondary, STATE_EDUCATION, tally.education(), Some("_id"), batch_size).await?;
        report.state_party =
            load(secondary, STATE_PARTY, tally.party(), Some("_id"), batch_size).await?;
        report.state_gender =
            load(secondary, STATE_GENDER, tally.gender(), Some("_id"), batch_size).await?;

        info!(
            "Aggregated {} representatives over {} pages, {} counted in state totals",
            report.representatives, report.pages, report.counted
        );
        Ok(report)
    }
}

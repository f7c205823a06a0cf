use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use super::education::{EducationExtractor, VoteSmartBiography};
use super::normalizer::{normalize_member, normalize_roll_call};
use super::resolver::IdentityResolver;
use crate::config::PipelineConfig;
use crate::education::{EducationEntry, EducationPair};
use crate::etl::{load, BatchWriter, LoadReport};
use crate::outcome::{FailureKind, Outcome};
use crate::representative::Representative;
use crate::source::{CongressApi, PageFetcher};
use crate::storage::{DocumentStore, EDUCATION, REPS, VOTES};
use crate::vote::RollCallVote;
use crate::Result;

/// What a stage saw, fixed and left behind, with failed keys bucketed by kind.
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    pub stage: &'static str,
    pub found: usize,
    pub fixed: usize,
    /// Records dropped on purpose or rejected by normalization
    pub skipped: usize,
    pub buckets: BTreeMap<FailureKind, Vec<String>>,
    pub load: LoadReport,
}

impl StageReport {
    #[must_use]
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub fn record_failure(&mut self, kind: FailureKind, key: impl Into<String>) {
        self.buckets.entry(kind).or_default().push(key.into());
    }

    pub fn remaining(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn bucket(&self, kind: FailureKind) -> &[String] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    fn log(&self) {
        for (kind, keys) in &self.buckets {
            debug!("{}: {} {}: {:?}", self.stage, keys.len(), kind, keys);
        }
        info!(
            "{}: found {}, fixed {}, remaining {}, skipped {}, total written {}",
            self.stage,
            self.found,
            self.fixed,
            self.remaining(),
            self.skipped,
            self.load.total
        );
    }
}

/// Keep identifiers already stored; only a resolution pass may replace them.
fn preserve_resolution(rep: &mut Representative, existing: &Representative) {
    if existing.wiki_url.is_some() {
        rep.wiki_url.clone_from(&existing.wiki_url);
    }
    if existing.google_id.is_some() {
        rep.google_id.clone_from(&existing.google_id);
    }
}

/// Pull every House member of the configured congresses into `reps`.
pub async fn ingest_members(
    api: &dyn CongressApi,
    primary: &dyn DocumentStore,
    settings: &PipelineConfig,
) -> Result<StageReport> {
    let mut report = StageReport::new("members");
    let mut ids = BTreeSet::new();

    for congress in &settings.congresses {
        match api.member_ids(*congress).await {
            Outcome::Success(found) => {
                info!("Congress {}: {} members", congress, found.len());
                ids.extend(found);
            }
            Outcome::Failure(kind) => report.record_failure(kind, format!("congress:{congress}")),
        }
    }
    report.found = ids.len();

    let mut writer = BatchWriter::new(primary, REPS, settings.batch_size).with_id_field("_id");
    for id in ids {
        let raw = match api.member(&id).await {
            Outcome::Success(raw) => raw,
            Outcome::Failure(kind) => {
                report.record_failure(kind, id);
                continue;
            }
        };

        let mut rep = match normalize_member(raw) {
            Ok(rep) => rep,
            Err(e) => {
                warn!("Skipping member {}: {}", id, e);
                report.skipped += 1;
                continue;
            }
        };

        if let Some(doc) = primary.get(REPS, &rep.id).await? {
            preserve_resolution(&mut rep, &doc.decode()?);
        }

        writer.push(&rep).await?;
        report.fixed += 1;
    }

    report.load = writer.finish().await?;
    report.log();
    Ok(report)
}

/// Pull the configured roll calls into `votes`, skipping nominations and quorum calls.
pub async fn ingest_votes(
    api: &dyn CongressApi,
    primary: &dyn DocumentStore,
    settings: &PipelineConfig,
) -> Result<StageReport> {
    let mut report = StageReport::new("votes");
    let mut writer = BatchWriter::new(primary, VOTES, settings.batch_size).with_id_field("_id");

    for session in &settings.vote_sessions {
        info!(
            "Congress {} session {}: {} roll calls",
            session.congress, session.session, session.roll_calls
        );
        for number in 1..=session.roll_calls {
            report.found += 1;
            let key = RollCallVote::key(session.congress, session.session, number);

            let raw = match api.roll_call(session.congress, session.session, number).await {
                Outcome::Success(raw) => raw,
                Outcome::Failure(kind) => {
                    report.record_failure(kind, key);
                    continue;
                }
            };

            match normalize_roll_call(raw) {
                Ok(Some(vote)) => {
                    debug!("{}: {} positions", vote.id, vote.total_positions());
                    writer.push(&vote).await?;
                    report.fixed += 1;
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!("Skipping roll call {}: {}", key, e);
                    report.skipped += 1;
                }
            }
        }
    }

    report.load = writer.finish().await?;
    report.log();
    Ok(report)
}

/// Fill `google_id` and `wiki_url` for representatives without a reference URL,
/// or for all of them when `all` is set.
///
/// Updates are written once paging is done so `reps` is never written while read.
pub async fn resolve_identities(
    resolver: &IdentityResolver<'_>,
    primary: &dyn DocumentStore,
    settings: &PipelineConfig,
    all: bool,
) -> Result<StageReport> {
    let mut report = StageReport::new("resolve");
    let mut updates = Vec::new();
    let mut page = 0;

    loop {
        let docs = primary.find_page(REPS, page, settings.page_size).await?;
        if docs.is_empty() {
            break;
        }
        let short = docs.len() < settings.page_size;

        for doc in &docs {
            let mut rep: Representative = doc.decode()?;
            if !all && !rep.needs_resolution() {
                continue;
            }
            report.found += 1;

            let resolution = resolver.resolve(&rep).await;
            resolution.apply(&mut rep);
            if resolution.is_resolved() {
                debug!("{} resolved by {:?}", rep.id, resolution.resolved_by);
                report.fixed += 1;
            } else {
                let kind = resolution.last_failure().unwrap_or(FailureKind::NotFound);
                report.record_failure(kind, rep.id.clone());
            }
            updates.push(rep);
        }

        if short {
            break;
        }
        page += 1;
    }

    report.load = load(primary, REPS, updates, Some("_id"), settings.batch_size).await?;
    report.log();
    Ok(report)
}

/// Sources the education stage reads from.
pub struct EducationSources<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub extractor: &'a EducationExtractor,
    pub votesmart: Option<&'a VoteSmartBiography>,
}

impl EducationSources<'_> {
    /// Reference page first; Vote Smart when the page has no usable panel.
    async fn education_for(&self, rep: &Representative) -> Outcome<Vec<EducationPair>> {
        let primary = match rep.wiki_url.as_deref() {
            Some(url) => self
                .fetcher
                .fetch_page(url)
                .await
                .and_then(|html| self.extractor.extract(&html)),
            None => Outcome::Failure(FailureKind::NotFound),
        };

        let fallback_applies = matches!(
            primary.failure(),
            Some(FailureKind::StructureMissing | FailureKind::NotFound)
        );
        if !fallback_applies {
            return primary;
        }

        match (self.votesmart, rep.votesmart_id.as_deref()) {
            (Some(votesmart), Some(id)) => self
                .fetcher
                .fetch_page(&votesmart.url(id))
                .await
                .and_then(|html| votesmart.parse(&html)),
            _ => primary,
        }
    }
}

/// Scrape education for every representative into `edu`.
///
/// A representative's previous rows are removed before the new ones are written.
/// Failures still write the sentinel entry so every representative has at least one row.
pub async fn extract_education(
    sources: &EducationSources<'_>,
    primary: &dyn DocumentStore,
    settings: &PipelineConfig,
) -> Result<StageReport> {
    let mut report = StageReport::new("education");
    let mut writer = BatchWriter::new(primary, EDUCATION, settings.education_batch_size)
        .with_id_field("entry_id");
    let mut page = 0;

    loop {
        let docs = primary.find_page(REPS, page, settings.page_size).await?;
        if docs.is_empty() {
            break;
        }
        let short = docs.len() < settings.page_size;

        let reps = docs
            .iter()
            .map(|doc| doc.decode::<Representative>())
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<String> = reps.iter().map(|r| r.id.clone()).collect();
        let removed = primary.delete_by_field(EDUCATION, "_id", &ids).await?;
        debug!("Cleared {} education rows for page {}", removed, page);

        for rep in &reps {
            report.found += 1;

            let pairs = match sources.education_for(rep).await {
                Outcome::Success(pairs) => {
                    report.fixed += 1;
                    pairs
                }
                Outcome::Failure(kind) => {
                    report.record_failure(kind, rep.id.clone());
                    vec![EducationPair::high_school()]
                }
            };

            for entry in EducationEntry::for_representative(&rep.id, pairs) {
                writer.push(&entry).await?;
            }
        }

        if short {
            break;
        }
        page += 1;
    }

    report.load = writer.finish().await?;
    report.log();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::load;
    use crate::source::{RawMember, RawRole, RawRollCall};
    use crate::storage::MemoryStore;
    use std::collections::HashMap;

    struct FakeCongress {
        members: HashMap<String, RawMember>,
    }

    #[async_trait::async_trait]
    impl CongressApi for FakeCongress {
        async fn member_ids(&self, congress: u32) -> Outcome<Vec<String>> {
            if congress == 117 {
                Outcome::Success(self.members.keys().cloned().collect())
            } else {
                Outcome::Failure(FailureKind::Rejected)
            }
        }

        async fn member(&self, id: &str) -> Outcome<RawMember> {
            self.members.get(id).cloned().into()
        }

        async fn roll_call(&self, _congress: u32, _session: u32, _number: u32) -> Outcome<RawRollCall> {
            Outcome::Failure(FailureKind::NotFound)
        }
    }

    struct FakePages(HashMap<String, String>);

    #[async_trait::async_trait]
    impl PageFetcher for FakePages {
        async fn fetch_page(&self, url: &str) -> Outcome<String> {
            self.0.get(url).cloned().into()
        }
    }

    fn raw_member(id: &str) -> RawMember {
        RawMember {
            id: Some(id.into()),
            first_name: Some("Test".into()),
            last_name: Some(id.into()),
            roles: vec![RawRole {
                congress: Some(117),
                state: Some("OH".into()),
                district: Some("1".into()),
                ..RawRole::default()
            }],
            ..RawMember::default()
        }
    }

    fn settings() -> PipelineConfig {
        PipelineConfig {
            congresses: vec![116, 117],
            page_size: 2,
            batch_size: 2,
            education_batch_size: 2,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_ingest_members_preserves_resolved_url() {
        let primary = MemoryStore::new();
        let resolved = Representative::new("A000001".into(), "Test".into(), "A000001".into(), "OH".into())
            .with_wiki_url("https://en.wikipedia.org/wiki/Test");
        load(&primary, REPS, [resolved], Some("_id"), 10).await.unwrap();

        let mut broken = raw_member("C000003");
        broken.roles.clear();
        let api = FakeCongress {
            members: [
                ("A000001".to_string(), raw_member("A000001")),
                ("B000002".to_string(), raw_member("B000002")),
                ("C000003".to_string(), broken),
            ]
            .into_iter()
            .collect(),
        };

        let report = ingest_members(&api, &primary, &settings()).await.unwrap();

        assert_eq!(report.found, 3);
        assert_eq!(report.fixed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.bucket(FailureKind::Rejected), ["congress:116".to_string()]);

        let stored: Representative = primary.get(REPS, "A000001").await.unwrap().unwrap().decode().unwrap();
        assert_eq!(stored.wiki_url.as_deref(), Some("https://en.wikipedia.org/wiki/Test"));
        assert_eq!(stored.district.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_education_writes_sentinel_on_failure() {
        let primary = MemoryStore::new();
        let reps = vec![
            Representative::new("A000001".into(), "Ann".into(), "Able".into(), "OH".into())
                .with_wiki_url("https://wiki/Ann_Able"),
            Representative::new("B000002".into(), "Bo".into(), "Baker".into(), "OH".into())
                .with_wiki_url("https://wiki/Bo_Baker"),
            Representative::new("C000003".into(), "Cy".into(), "Cole".into(), "OH".into()),
        ];
        load(&primary, REPS, reps, Some("_id"), 10).await.unwrap();

        let pages = FakePages(
            [
                (
                    "https://wiki/Ann_Able".to_string(),
                    r#"<table class="infobox"><tr><th>Education</th><td>
                        <a>Ohio State University</a> <a>BA</a></td></tr></table>"#
                        .to_string(),
                ),
                ("https://wiki/Bo_Baker".to_string(), "<p>No panel</p>".to_string()),
            ]
            .into_iter()
            .collect(),
        );
        let extractor = EducationExtractor::default();
        let sources = EducationSources {
            fetcher: &pages,
            extractor: &extractor,
            votesmart: None,
        };

        let report = extract_education(&sources, &primary, &settings()).await.unwrap();

        assert_eq!(report.found, 3);
        assert_eq!(report.fixed, 1);
        assert_eq!(report.bucket(FailureKind::StructureMissing), ["B000002".to_string()]);
        assert_eq!(report.bucket(FailureKind::NotFound), ["C000003".to_string()]);

        let ann: EducationEntry = primary.get(EDUCATION, "A000001_0").await.unwrap().unwrap().decode().unwrap();
        assert_eq!(ann.pair(), EducationPair::new("BA", "Ohio State University"));
        let bo: EducationEntry = primary.get(EDUCATION, "B000002_0").await.unwrap().unwrap().decode().unwrap();
        assert_eq!(bo.pair(), EducationPair::high_school());
        assert_eq!(primary.count(EDUCATION).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ingest_members_keeps_stored_google_id() {
        let primary = MemoryStore::new();
        let corrected = Representative::new("A000001".into(), "Test".into(), "A000001".into(), "OH".into())
            .with_google_id("/m/corrected");
        load(&primary, REPS, [corrected], Some("_id"), 10).await.unwrap();

        let mut raw = raw_member("A000001");
        raw.google_entity_id = Some("kg:/m/stale".into());
        let api = FakeCongress {
            members: [("A000001".to_string(), raw)].into_iter().collect(),
        };

        ingest_members(&api, &primary, &settings()).await.unwrap();

        let stored: Representative = primary.get(REPS, "A000001").await.unwrap().unwrap().decode().unwrap();
        assert_eq!(stored.google_id.as_deref(), Some("/m/corrected"));
        assert!(stored.wiki_url.is_none());
    }

    #[tokio::test]
    async fn test_resolve_writes_updates_after_paging() {
        use crate::source::{Encyclopedia, KnowledgeGraph, KnowledgeGraphEntity};

        struct NoGraph;

        #[async_trait::async_trait]
        impl KnowledgeGraph for NoGraph {
            async fn lookup_by_id(&self, _id: &str) -> Outcome<KnowledgeGraphEntity> {
                Outcome::Failure(FailureKind::NotFound)
            }

            async fn search_by_name(&self, _query: &str) -> Outcome<KnowledgeGraphEntity> {
                Outcome::Failure(FailureKind::NotFound)
            }
        }

        struct Wiki;

        #[async_trait::async_trait]
        impl Encyclopedia for Wiki {
            async fn search(&self, query: &str) -> Outcome<String> {
                Outcome::Success(format!("https://wiki/{}", query.replace(' ', "_")))
            }
        }

        let primary = MemoryStore::new();
        let reps: Vec<Representative> = (0..5)
            .map(|i| {
                let id = format!("R00000{i}");
                Representative::new(id.clone(), "Test".into(), id, "OH".into())
            })
            .collect();
        load(&primary, REPS, reps, Some("_id"), 10).await.unwrap();

        let resolver = IdentityResolver::new(&NoGraph, &Wiki);
        let report = resolve_identities(&resolver, &primary, &settings(), false)
            .await
            .unwrap();

        assert_eq!(report.found, 5);
        assert_eq!(report.fixed, 5);
        assert_eq!(report.load.batches, vec![2, 2, 1]);
        let log = primary.commit_log().await;
        assert_eq!(log.len(), 4);
        assert!(log[1..].iter().all(|(collection, _)| collection == REPS));
    }

    #[tokio::test]
    async fn test_education_rerun_replaces_previous_rows() {
        let primary = MemoryStore::new();
        let rep = Representative::new("A000001".into(), "Ann".into(), "Able".into(), "OH".into())
            .with_wiki_url("https://wiki/Ann_Able");
        load(&primary, REPS, [rep.clone()], Some("_id"), 10).await.unwrap();
        let extractor = EducationExtractor::default();

        let reachable = FakePages(
            [(
                "https://wiki/Ann_Able".to_string(),
                r#"<table class="infobox"><tr><th>Education</th><td>
                    <a>Ohio State University</a> <a>BA</a>
                    <a>Harvard University</a> <a>JD</a></td></tr></table>"#
                    .to_string(),
            )]
            .into_iter()
            .collect(),
        );
        let first = EducationSources {
            fetcher: &reachable,
            extractor: &extractor,
            votesmart: None,
        };
        extract_education(&first, &primary, &settings()).await.unwrap();
        assert_eq!(primary.count(EDUCATION).await.unwrap(), 2);

        let unreachable = FakePages(HashMap::new());
        let second = EducationSources {
            fetcher: &unreachable,
            extractor: &extractor,
            votesmart: None,
        };
        extract_education(&second, &primary, &settings()).await.unwrap();

        assert_eq!(primary.keys(EDUCATION).await, vec!["A000001_0"]);
        let summaries = crate::etl::Aggregator::new(&primary, &settings())
            .summarize(&[rep])
            .await
            .unwrap();
        assert_eq!(summaries[0].degrees, vec!["HS"]);
        assert_eq!(summaries[0].education, vec!["HS"]);
    }

    const VOTESMART_ROOT: &str = "https://votesmart/bio/";

    async fn votesmart_fixture() -> (MemoryStore, FakePages) {
        let primary = MemoryStore::new();
        let mut with_id = Representative::new("A000001".into(), "Ann".into(), "Able".into(), "OH".into())
            .with_wiki_url("https://wiki/Ann_Able");
        with_id.votesmart_id = Some("26976".into());
        let without_id = Representative::new("B000002".into(), "Bo".into(), "Baker".into(), "OH".into())
            .with_wiki_url("https://wiki/Bo_Baker");
        load(&primary, REPS, [with_id, without_id], Some("_id"), 10).await.unwrap();

        let pages = FakePages(
            [
                ("https://wiki/Ann_Able".to_string(), "<p>stub</p>".to_string()),
                ("https://wiki/Bo_Baker".to_string(), "<p>stub</p>".to_string()),
                (
                    format!("{VOTESMART_ROOT}26976"),
                    r#"<div><div><h5><b>Education</b></h5></div><div>
                        <p>BA, History, Yale University, 1977</p></div></div>"#
                        .to_string(),
                ),
            ]
            .into_iter()
            .collect(),
        );
        (primary, pages)
    }

    #[tokio::test]
    async fn test_votesmart_fallback_when_panel_missing() {
        let (primary, pages) = votesmart_fixture().await;
        let extractor = EducationExtractor::default();
        let votesmart = VoteSmartBiography::new(VOTESMART_ROOT).unwrap();
        let sources = EducationSources {
            fetcher: &pages,
            extractor: &extractor,
            votesmart: Some(&votesmart),
        };

        let report = extract_education(&sources, &primary, &settings()).await.unwrap();

        assert_eq!(report.fixed, 1);
        assert_eq!(report.bucket(FailureKind::StructureMissing), ["B000002".to_string()]);
        let ann: EducationEntry = primary.get(EDUCATION, "A000001_0").await.unwrap().unwrap().decode().unwrap();
        assert_eq!(ann.pair(), EducationPair::new("BA", "Yale University"));
        let bo: EducationEntry = primary.get(EDUCATION, "B000002_0").await.unwrap().unwrap().decode().unwrap();
        assert_eq!(bo.pair(), EducationPair::high_school());
    }

    #[tokio::test]
    async fn test_votesmart_fallback_disabled() {
        let (primary, pages) = votesmart_fixture().await;
        let extractor = EducationExtractor::default();
        let sources = EducationSources {
            fetcher: &pages,
            extractor: &extractor,
            votesmart: None,
        };

        let report = extract_education(&sources, &primary, &settings()).await.unwrap();

        assert_eq!(report.fixed, 0);
        assert_eq!(
            report.bucket(FailureKind::StructureMissing),
            ["A000001".to_string(), "B000002".to_string()]
        );
    }
}

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::education::{normalize_degree, EducationPair};
use crate::outcome::{FailureKind, Outcome};

pub const DEFAULT_MAX_DEGREE_LEN: usize = 10;

/// Degree fields on a Vote Smart card are short abbreviations.
const VOTESMART_MAX_DEGREE_LEN: usize = 5;
const INSTITUTION_PATTERN: &str = r"College|University|School|Institute";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

fn anchor_texts(cell: ElementRef<'_>, anchors: &Selector) -> Vec<String> {
    cell.select(anchors)
        .map(text_of)
        .filter(|t| !t.is_empty() && !t.starts_with('['))
        .collect()
}

/// Turns a reference page's info panel into (degree, institution) pairs.
#[derive(Debug, Clone)]
pub struct EducationExtractor {
    max_degree_len: usize,
}

impl Default for EducationExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEGREE_LEN)
    }
}

impl EducationExtractor {
    #[must_use]
    pub const fn new(max_degree_len: usize) -> Self {
        Self { max_degree_len }
    }

    fn is_degree(&self, token: &str) -> bool {
        token.chars().count() < self.max_degree_len
    }

    /// Anchor texts from the "Education" row of the info panel, falling back to
    /// the row whose header links to "Alma mater".
    ///
    /// A page with no panel or neither row is `StructureMissing`; a row with no
    /// links is a success with no tokens.
    pub fn scrape_tokens(&self, html: &str) -> Outcome<Vec<String>> {
        let document = Html::parse_document(html);
        let (Some(panel), Some(header), Some(anchor), Some(alma_mater)) = (
            selector("table.infobox"),
            selector("th"),
            selector("a"),
            selector(r#"a[title="Alma mater"]"#),
        ) else {
            return Outcome::Failure(FailureKind::StructureMissing);
        };

        let Some(panel) = document.select(&panel).next() else {
            return Outcome::Failure(FailureKind::StructureMissing);
        };

        if let Some(cell) = panel
            .select(&header)
            .find(|th| text_of(*th) == "Education")
            .and_then(next_element)
        {
            return Outcome::Success(anchor_texts(cell, &anchor));
        }

        panel
            .select(&alma_mater)
            .next()
            .and_then(|a| a.parent())
            .and_then(ElementRef::wrap)
            .and_then(next_element)
            .map(|cell| anchor_texts(cell, &anchor))
            .map_or(Outcome::Failure(FailureKind::StructureMissing), Outcome::Success)
    }

    /// Pair degrees with the nearest institution listed before them.
    ///
    /// Tokens are scanned last to first. Degrees with no preceding institution are
    /// dropped. Returns the sentinel when nothing pairs.
    pub fn pair(&self, tokens: &[String]) -> Vec<EducationPair> {
        if tokens.len() < 2 {
            return vec![EducationPair::high_school()];
        }

        let mut pairs = Vec::new();
        for (i, token) in tokens.iter().enumerate().rev() {
            if !self.is_degree(token) {
                continue;
            }
            let degree = normalize_degree(token);
            if degree.is_empty() {
                continue;
            }
            if let Some(institution) = tokens[..i].iter().rev().find(|t| !self.is_degree(t)) {
                pairs.push(EducationPair::new(degree, institution.clone()));
            }
        }

        if pairs.is_empty() {
            pairs.push(EducationPair::high_school());
        }
        pairs
    }

    pub fn extract(&self, html: &str) -> Outcome<Vec<EducationPair>> {
        self.scrape_tokens(html).map(|tokens| self.pair(&tokens))
    }
}

/// Education card on a Vote Smart biography page.
#[derive(Debug, Clone)]
pub struct VoteSmartBiography {
    root: String,
    institution: Regex,
}

impl VoteSmartBiography {
    pub fn new(root: impl Into<String>) -> ExtractionResult<Self> {
        Ok(Self {
            root: root.into(),
            institution: Regex::new(INSTITUTION_PATTERN)?,
        })
    }

    pub fn url(&self, votesmart_id: &str) -> String {
        format!("{}{}", self.root, votesmart_id)
    }

    /// Each paragraph of the card reads like `BA, Political Science, Yale University, 1980`.
    pub fn parse(&self, html: &str) -> Outcome<Vec<EducationPair>> {
        let document = Html::parse_document(html);
        let (Some(bold), Some(paragraph)) = (selector("b"), selector("p")) else {
            return Outcome::Failure(FailureKind::StructureMissing);
        };

        let Some(card) = document
            .select(&bold)
            .find(|b| text_of(*b) == "Education")
            .and_then(|b| b.ancestors().nth(2))
            .and_then(ElementRef::wrap)
        else {
            return Outcome::Failure(FailureKind::StructureMissing);
        };

        let mut pairs = Vec::new();
        for p in card.select(&paragraph) {
            let text = text_of(p);
            let mut fields = text.split(',').map(str::trim);
            let Some(first) = fields.next() else {
                continue;
            };
            if first.is_empty() || first.chars().count() >= VOTESMART_MAX_DEGREE_LEN {
                continue;
            }
            let degree = normalize_degree(first);
            for field in fields.filter(|f| self.institution.is_match(f)) {
                pairs.push(EducationPair::new(degree.clone(), field));
            }
        }

        if pairs.is_empty() {
            Outcome::Failure(FailureKind::FieldMissing)
        } else {
            Outcome::Success(pairs)
        }
    }
}

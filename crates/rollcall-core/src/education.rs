use serde::{Deserialize, Serialize};

pub const SENTINEL_DEGREE: &str = "HS";
pub const SENTINEL_INSTITUTION: &str = "HS";

/// A degree paired with the institution that granted it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EducationPair {
    pub degree: String,
    pub institution: String,
}

impl EducationPair {
    #[must_use]
    pub fn new(degree: impl Into<String>, institution: impl Into<String>) -> Self {
        Self {
            degree: degree.into(),
            institution: institution.into(),
        }
    }

    /// Placeholder used when no degree data can be resolved.
    #[must_use]
    pub fn high_school() -> Self {
        Self::new(SENTINEL_DEGREE, SENTINEL_INSTITUTION)
    }
}

/// Stored education row, always tied to exactly one representative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub entry_id: String,
    #[serde(rename = "_id")]
    pub rep_id: String,
    pub degree: String,
    pub institution: String,
}

impl EducationEntry {
    #[must_use]
    pub fn new(rep_id: &str, index: usize, pair: EducationPair) -> Self {
        Self {
            entry_id: format!("{rep_id}_{index}"),
            rep_id: rep_id.to_string(),
            degree: pair.degree,
            institution: pair.institution,
        }
    }

    /// Entries for one representative, keyed so reruns overwrite instead of duplicating.
    pub fn for_representative(rep_id: &str, pairs: Vec<EducationPair>) -> Vec<Self> {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, pair)| Self::new(rep_id, i, pair))
            .collect()
    }

    pub fn pair(&self) -> EducationPair {
        EducationPair::new(self.degree.clone(), self.institution.clone())
    }
}

/// Strip punctuation and spacing from a raw degree token and upper-case it.
///
/// `"J.D."` becomes `"JD"`, `"Ph.D."` becomes `"PHD"`.
pub fn normalize_degree(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DegreeCategory {
    Associates,
    Bachelors,
    HighSchool,
    Jd,
    MastersGeneral,
    MastersPublic,
    MastersEducation,
    MastersLaw,
    MastersTheology,
    Mba,
    Phd,
    Veterinary,
    Dental,
    Md,
    PhdEducation,
    PhdTheology,
    PhdPublic,
    Nursing,
}

impl DegreeCategory {
    pub const ALL: [Self; 18] = [
        Self::Associates,
        Self::Bachelors,
        Self::HighSchool,
        Self::Jd,
        Self::MastersGeneral,
        Self::MastersPublic,
        Self::MastersEducation,
        Self::MastersLaw,
        Self::MastersTheology,
        Self::Mba,
        Self::Phd,
        Self::Veterinary,
        Self::Dental,
        Self::Md,
        Self::PhdEducation,
        Self::PhdTheology,
        Self::PhdPublic,
        Self::Nursing,
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Associates => "Associates",
            Self::Bachelors => "Bachelors",
            Self::HighSchool => "High School",
            Self::Jd => "JD",
            Self::MastersGeneral => "Masters - General",
            Self::MastersPublic => "Masters - Public",
            Self::MastersEducation => "Masters - Education",
            Self::MastersLaw => "Masters - Law",
            Self::MastersTheology => "Masters - Theology",
            Self::Mba => "MBA",
            Self::Phd => "PHD",
            Self::Veterinary => "Veterinary",
            Self::Dental => "Dental",
            Self::Md => "MD",
            Self::PhdEducation => "PHD - Education",
            Self::PhdTheology => "PHD - Theology",
            Self::PhdPublic => "PHD - Public",
            Self::Nursing => "Nursing",
        }
    }

    /// Recognized normalized codes for this category.
    #[must_use]
    pub fn codes(&self) -> &'static [&'static str] {
        match self {
            Self::Associates => &["AAS", "AS", "AA"],
            Self::Bachelors => &[
                "BS", "BA", "SB", "AB", "BDIV", "BBA", "BENG", "BM", "ALB", "BSN", "BGS", "BPA",
                "BSBA", "LLB",
            ],
            Self::HighSchool => &["HS"],
            Self::Jd => &["JD"],
            Self::MastersGeneral => &["MA", "MS", "SM", "MSC", "MFA", "MACC"],
            Self::MastersPublic => &["MIA", "MPA", "MUP", "MPP", "MSW", "MSS", "MPH", "MHS"],
            Self::MastersEducation => &["MED", "SYC"],
            Self::MastersLaw => &["LLM"],
            Self::MastersTheology => &["MDIV", "THM"],
            Self::Mba => &["MBA", "MSEM"],
            Self::Phd => &["PHD"],
            Self::Veterinary => &["DVM"],
            Self::Dental => &["DDS", "DMD"],
            Self::Md => &["MD", "DPM"],
            Self::PhdEducation => &["EDD"],
            Self::PhdTheology => &["DMIN"],
            Self::PhdPublic => &["DPA"],
            Self::Nursing => &["MSN", "GRDIP"],
        }
    }

    /// Map a raw or normalized degree code into its category, if any.
    pub fn classify(code: &str) -> Option<Self> {
        let code = normalize_degree(code);
        Self::ALL
            .into_iter()
            .find(|category| category.codes().contains(&code.as_str()))
    }
}

impl std::fmt::Display for DegreeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

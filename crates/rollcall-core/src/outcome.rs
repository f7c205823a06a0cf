use serde::{Deserialize, Serialize};

/// Why a single upstream lookup or scrape produced nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The upstream query returned zero results.
    NotFound,
    /// The call failed at the transport or quota level.
    Rejected,
    /// The response succeeded but lacked an expected field.
    FieldMissing,
    /// The fetched page did not contain the expected scrape target.
    StructureMissing,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::FieldMissing => "field_missing",
            Self::StructureMissing => "structure_missing",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a best-effort step: either a value or the kind of failure.
///
/// Steps never raise; callers branch on the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(FailureKind),
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn failure(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(kind) => Some(*kind),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(kind) => Outcome::Failure(kind),
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Outcome<U>>(self, f: F) -> Outcome<U> {
        match self {
            Self::Success(value) => f(value),
            Self::Failure(kind) => Outcome::Failure(kind),
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Failure(FailureKind::NotFound), Self::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_labels_match_serde() {
        for kind in [
            FailureKind::NotFound,
            FailureKind::Rejected,
            FailureKind::FieldMissing,
            FailureKind::StructureMissing,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.to_string());
        }
    }

    #[test]
    fn test_outcome_combinators() {
        let found: Outcome<u32> = Outcome::Success(2);
        assert_eq!(found.clone().map(|v| v * 2), Outcome::Success(4));
        assert_eq!(found.failure(), None);

        let missing: Outcome<u32> = Outcome::Failure(FailureKind::FieldMissing);
        assert_eq!(
            missing.clone().and_then(|v| Outcome::Success(v + 1)),
            Outcome::Failure(FailureKind::FieldMissing)
        );
    }

    #[test]
    fn test_empty_option_is_not_found() {
        let outcome: Outcome<&str> = None.into();
        assert_eq!(outcome.failure(), Some(FailureKind::NotFound));
    }
}

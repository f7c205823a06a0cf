use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePosition {
    Yes,
    No,
    NotVoting,
    Present,
    Speaker,
}

impl VotePosition {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::NotVoting => "not voting",
            Self::Present => "present",
            Self::Speaker => "speaker",
        }
    }

    /// Parse the position label used by the roll-call feed, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "yes" | "yea" | "aye" => Some(Self::Yes),
            "no" | "nay" => Some(Self::No),
            "not voting" => Some(Self::NotVoting),
            "present" => Some(Self::Present),
            "speaker" => Some(Self::Speaker),
            _ => None,
        }
    }
}

impl std::fmt::Display for VotePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single House roll-call vote on a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollCallVote {
    #[serde(rename = "_id")]
    pub id: String,
    pub congress: u32,
    pub session: u32,
    pub roll_call: u32,
    pub bill_id: String,
    pub api_call_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub result: Option<String>,
    #[serde(default)]
    pub yes: Vec<String>,
    #[serde(default)]
    pub no: Vec<String>,
    #[serde(default)]
    pub not_voting: Vec<String>,
    #[serde(default)]
    pub present: Vec<String>,
    #[serde(default)]
    pub speaker: Vec<String>,
}

impl RollCallVote {
    #[must_use]
    pub fn key(congress: u32, session: u32, roll_call: u32) -> String {
        format!("{congress}_{session}_{roll_call}")
    }

    pub fn members_mut(&mut self, position: VotePosition) -> &mut Vec<String> {
        match position {
            VotePosition::Yes => &mut self.yes,
            VotePosition::No => &mut self.no,
            VotePosition::NotVoting => &mut self.not_voting,
            VotePosition::Present => &mut self.present,
            VotePosition::Speaker => &mut self.speaker,
        }
    }

    pub fn total_positions(&self) -> usize {
        self.yes.len() + self.no.len() + self.not_voting.len() + self.present.len() + self.speaker.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key() {
        assert_eq!(RollCallVote::key(116, 2, 87), "116_2_87");
    }

    #[test]
    fn test_position_labels() {
        assert_eq!(VotePosition::parse("Yes"), Some(VotePosition::Yes));
        assert_eq!(VotePosition::parse("Not Voting"), Some(VotePosition::NotVoting));
        assert_eq!(VotePosition::parse("Speaker"), Some(VotePosition::Speaker));
        assert_eq!(VotePosition::parse("abstain"), None);
    }
}

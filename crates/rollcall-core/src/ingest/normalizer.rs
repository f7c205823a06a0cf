use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;

use crate::representative::Representative;
use crate::source::{RawMember, RawRollCall};
use crate::vote::{RollCallVote, VotePosition};

const QUORUM: &str = "QUORUM";

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Member {0} has no roles")]
    NoRoles(String),
}

pub type NormalizationResult<T> = Result<T, NormalizationError>;

fn required(value: Option<String>, field: &'static str) -> NormalizationResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(NormalizationError::MissingField(field))
}

fn parse_date(raw: &str) -> NormalizationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| NormalizationError::InvalidDate(raw.to_string()))
}

/// Map a member payload into a canonical representative.
///
/// State, district and FEC id come from the most recent role; every role's
/// congress lands in `congresses`.
pub fn normalize_member(raw: RawMember) -> NormalizationResult<Representative> {
    let id = required(raw.id, "id")?;
    let first_name = required(raw.first_name, "first_name")?;
    let last_name = required(raw.last_name, "last_name")?;

    let mut roles = raw.roles;
    if roles.is_empty() {
        return Err(NormalizationError::NoRoles(id));
    }
    roles.sort_by(|a, b| b.congress.cmp(&a.congress));

    let latest = &roles[0];
    let state = required(latest.state.clone(), "roles.state")?;

    let dob = match raw.date_of_birth.as_deref() {
        Some(raw_dob) if !raw_dob.trim().is_empty() => Some(parse_date(raw_dob)?),
        _ => None,
    };

    let mut rep = Representative::new(id, first_name, last_name, state);
    rep.middle_name = raw.middle_name.filter(|m| !m.is_empty());
    rep.dob = dob;
    rep.gender = raw.gender;
    rep.current_party = raw.current_party.or_else(|| latest.party.clone());
    rep.district = latest.district.clone();
    rep.fec_id = latest.fec_candidate_id.clone();
    rep.google_id = raw
        .google_entity_id
        .map(|id| id.strip_prefix("kg:").map(String::from).unwrap_or(id));
    rep.votesmart_id = raw.votesmart_id;
    rep.govtrack_id = raw.govtrack_id;
    rep.cspan_id = raw.cspan_id;
    rep.crp_id = raw.crp_id;
    rep.congresses = roles.iter().filter_map(|r| r.congress).collect();
    rep.in_office = raw.in_office.unwrap_or(false);

    Ok(rep)
}

/// Bill number with the dots removed, lower-cased: `H.R.1` becomes `hr1`.
pub fn api_call_id(bill_number: &str) -> String {
    bill_number.replace('.', "").to_lowercase()
}

/// Map a roll-call payload into a vote record.
///
/// Nominations (no bill) and quorum calls yield `Ok(None)`.
pub fn normalize_roll_call(raw: RawRollCall) -> NormalizationResult<Option<RollCallVote>> {
    let Some(bill) = raw.bill else {
        return Ok(None);
    };
    let (Some(bill_id), Some(number)) = (bill.bill_id, bill.number) else {
        return Ok(None);
    };
    if number.eq_ignore_ascii_case(QUORUM) {
        return Ok(None);
    }

    let congress = raw.congress.ok_or(NormalizationError::MissingField("congress"))?;
    let session = raw.session.ok_or(NormalizationError::MissingField("session"))?;
    let roll_call = raw.roll_call.ok_or(NormalizationError::MissingField("roll_call"))?;
    let date = parse_date(raw.date.as_deref().ok_or(NormalizationError::MissingField("date"))?)?;

    let mut vote = RollCallVote {
        id: RollCallVote::key(congress, session, roll_call),
        congress,
        session,
        roll_call,
        bill_id,
        api_call_id: api_call_id(&number),
        title: bill.title,
        description: raw.description.or(raw.question),
        date,
        result: raw.result,
        yes: Vec::new(),
        no: Vec::new(),
        not_voting: Vec::new(),
        present: Vec::new(),
        speaker: Vec::new(),
    };

    for position in raw.positions {
        let (Some(member_id), Some(label)) = (position.member_id, position.vote_position) else {
            continue;
        };
        match VotePosition::parse(&label) {
            Some(kind) => vote.members_mut(kind).push(member_id),
            None => warn!("Unknown vote position '{}' in roll call {}", label, vote.id),
        }
    }

    Ok(Some(vote))
}

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{CongressApi, HttpClient};
use crate::config::{ConfigError, SourceConfig};
use crate::outcome::{FailureKind, Outcome};

/// Member payload as returned by `members/{id}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMember {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub current_party: Option<String>,
    pub google_entity_id: Option<String>,
    pub votesmart_id: Option<String>,
    pub govtrack_id: Option<String>,
    pub cspan_id: Option<String>,
    pub crp_id: Option<String>,
    pub in_office: Option<bool>,
    pub roles: Vec<RawRole>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRole {
    #[serde(deserialize_with = "flexible_u32")]
    pub congress: Option<u32>,
    pub chamber: Option<String>,
    pub state: Option<String>,
    pub party: Option<String>,
    pub district: Option<String>,
    pub fec_candidate_id: Option<String>,
}

/// Roll-call payload as returned by `{congress}/house/sessions/{s}/votes/{n}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRollCall {
    #[serde(deserialize_with = "flexible_u32")]
    pub congress: Option<u32>,
    #[serde(deserialize_with = "flexible_u32")]
    pub session: Option<u32>,
    #[serde(deserialize_with = "flexible_u32")]
    pub roll_call: Option<u32>,
    pub bill: Option<RawBill>,
    pub question: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub result: Option<String>,
    pub positions: Vec<RawPosition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBill {
    pub bill_id: Option<String>,
    pub number: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPosition {
    pub member_id: Option<String>,
    pub vote_position: Option<String>,
}

/// Accept numbers, numeric strings, and null.
fn flexible_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// ProPublica Congress API client.
pub struct ProPublica {
    http: HttpClient,
    root: String,
    api_key: String,
}

impl ProPublica {
    pub fn new(http: HttpClient, root: String, api_key: String) -> Self {
        Self { http, root, api_key }
    }

    pub fn from_config(http: HttpClient, config: &SourceConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .propublica_api_key
            .clone()
            .ok_or(ConfigError::MissingCredential("propublica_api_key"))?;

        Ok(Self::new(http, config.propublica_root.clone(), api_key))
    }

    async fn get(&self, path: &str) -> Outcome<Value> {
        let url = format!("{}{}", self.root, path);
        let request = self.http.get(&url).header("X-API-Key", &self.api_key);
        self.http.send_json(request).await
    }
}

#[async_trait::async_trait]
impl CongressApi for ProPublica {
    async fn member_ids(&self, congress: u32) -> Outcome<Vec<String>> {
        self.get(&format!("{congress}/house/members.json"))
            .await
            .and_then(|body| parse_member_ids(&body))
    }

    async fn member(&self, id: &str) -> Outcome<RawMember> {
        self.get(&format!("members/{id}.json"))
            .await
            .and_then(|body| parse_member(&body))
    }

    async fn roll_call(&self, congress: u32, session: u32, number: u32) -> Outcome<RawRollCall> {
        self.get(&format!(
            "{congress}/house/sessions/{session}/votes/{number}.json"
        ))
        .await
        .and_then(|body| parse_roll_call(&body))
    }
}

pub fn parse_member_ids(body: &Value) -> Outcome<Vec<String>> {
    let Some(members) = body.pointer("/results/0/members").and_then(Value::as_array) else {
        return Outcome::Failure(FailureKind::NotFound);
    };

    Outcome::Success(
        members
            .iter()
            .filter_map(|m| m.get("id").and_then(Value::as_str))
            .map(String::from)
            .collect(),
    )
}

pub fn parse_member(body: &Value) -> Outcome<RawMember> {
    let Some(member) = body.pointer("/results/0") else {
        return Outcome::Failure(FailureKind::NotFound);
    };

    match RawMember::deserialize(member) {
        Ok(member) => Outcome::Success(member),
        Err(_) => Outcome::Failure(FailureKind::FieldMissing),
    }
}

pub fn parse_roll_call(body: &Value) -> Outcome<RawRollCall> {
    let Some(vote) = body.pointer("/results/votes/vote") else {
        return Outcome::Failure(FailureKind::NotFound);
    };

    match RawRollCall::deserialize(vote) {
        Ok(vote) => Outcome::Success(vote),
        Err(_) => Outcome::Failure(FailureKind::FieldMissing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_member_ids() {
        let body = json!({
            "status": "OK",
            "results": [{"congress": "117", "members": [{"id": "A000370"}, {"id": "B001230"}]}]
        });

        let Outcome::Success(ids) = parse_member_ids(&body) else {
            panic!("expected a successful parse");
        };

        assert_eq!(ids, vec!["A000370", "B001230"]);
    }

    #[test]
    fn test_parse_member_accepts_string_congress() {
        let body = json!({
            "results": [{
                "id": "A000370",
                "first_name": "Alma",
                "middle_name": null,
                "last_name": "Adams",
                "date_of_birth": "1946-05-27",
                "in_office": true,
                "roles": [
                    {"congress": "117", "state": "NC", "district": "12", "fec_candidate_id": "H4NC12100"},
                    {"congress": 116, "state": "NC", "district": "12"}
                ]
            }]
        });

        let Outcome::Success(member) = parse_member(&body) else {
            panic!("expected a successful parse");
        };

        assert_eq!(member.id.as_deref(), Some("A000370"));
        assert_eq!(member.roles[0].congress, Some(117));
        assert_eq!(member.roles[1].congress, Some(116));
        assert_eq!(member.middle_name, None);
    }

    #[test]
    fn test_parse_roll_call_with_empty_bill() {
        let body = json!({
            "results": {"votes": {"vote": {
                "congress": 116, "session": 1, "roll_call": 2,
                "bill": {}, "date": "2019-01-03", "positions": []
            }}}
        });

        let Outcome::Success(vote) = parse_roll_call(&body) else {
            panic!("expected a successful parse");
        };

        assert_eq!(vote.roll_call, Some(2));
        assert!(vote.bill.unwrap().bill_id.is_none());
    }

    #[test]
    fn test_missing_results_is_not_found() {
        let body = json!({"status": "ERROR", "errors": []});
        assert_eq!(parse_member(&body).failure(), Some(FailureKind::NotFound));
        assert_eq!(parse_roll_call(&body).failure(), Some(FailureKind::NotFound));
        assert_eq!(parse_member_ids(&body).failure(), Some(FailureKind::NotFound));
    }
}

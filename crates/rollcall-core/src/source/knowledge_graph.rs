use serde_json::Value;
use tracing::debug;

use super::{HttpClient, KnowledgeGraph, KnowledgeGraphEntity};
use crate::config::{ConfigError, SourceConfig};
use crate::outcome::{FailureKind, Outcome};

/// Google Knowledge Graph entity search.
pub struct GoogleKnowledgeGraph {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    limit: u32,
}

impl GoogleKnowledgeGraph {
    pub fn new(http: HttpClient, endpoint: String, api_key: String, limit: u32) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            limit,
        }
    }

    pub fn from_config(http: HttpClient, config: &SourceConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .google_api_key
            .clone()
            .ok_or(ConfigError::MissingCredential("google_api_key"))?;

        Ok(Self::new(
            http,
            config.knowledge_graph_endpoint.clone(),
            api_key,
            config.result_limit,
        ))
    }

    async fn search(&self, param: &str, value: &str) -> Outcome<KnowledgeGraphEntity> {
        let limit = self.limit.to_string();
        let request = self.http.get(&self.endpoint).query(&[
            (param, value),
            ("limit", limit.as_str()),
            ("key", self.api_key.as_str()),
        ]);

        let outcome = self
            .http
            .send_json(request)
            .await
            .and_then(|body| parse_entity_search(&body));

        if let Some(kind) = outcome.failure() {
            debug!("Knowledge graph {}={} failed: {}", param, value, kind);
        }
        outcome
    }
}

#[async_trait::async_trait]
impl KnowledgeGraph for GoogleKnowledgeGraph {
    async fn lookup_by_id(&self, id: &str) -> Outcome<KnowledgeGraphEntity> {
        self.search("ids", id).await
    }

    async fn search_by_name(&self, query: &str) -> Outcome<KnowledgeGraphEntity> {
        self.search("query", query).await
    }
}

/// Read the top match out of an entity search response.
pub fn parse_entity_search(body: &Value) -> Outcome<KnowledgeGraphEntity> {
    let top: Outcome<&Value> = body
        .get("itemListElement")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .into();

    top.and_then(|top| {
        let Some(raw_id) = top.pointer("/result/@id").and_then(Value::as_str) else {
            return Outcome::Failure(FailureKind::FieldMissing);
        };

        let id = raw_id
            .split_once(':')
            .map_or(raw_id, |(_, rest)| rest)
            .to_string();

        Outcome::Success(KnowledgeGraphEntity {
            id,
            name: top
                .pointer("/result/name")
                .and_then(Value::as_str)
                .map(String::from),
            reference_url: top
                .pointer("/result/detailedDescription/url")
                .and_then(Value::as_str)
                .map(String::from),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entity_with_url() {
        let body = json!({
            "itemListElement": [{
                "result": {
                    "@id": "kg:/m/012v1t",
                    "name": "Nancy Pelosi",
                    "detailedDescription": {
                        "url": "https://en.wikipedia.org/wiki/Nancy_Pelosi"
                    }
                }
            }]
        });

        let Outcome::Success(entity) = parse_entity_search(&body) else {
            panic!("expected a successful parse");
        };

        assert_eq!(entity.id, "/m/012v1t");
        assert_eq!(entity.name.as_deref(), Some("Nancy Pelosi"));
        assert_eq!(
            entity.reference_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Nancy_Pelosi")
        );
    }

    #[test]
    fn test_parse_entity_without_description() {
        let body = json!({
            "itemListElement": [{"result": {"@id": "kg:/g/11fz1b", "name": "Jane Doe"}}]
        });

        let Outcome::Success(entity) = parse_entity_search(&body) else {
            panic!("expected a successful parse");
        };

        assert_eq!(entity.id, "/g/11fz1b");
        assert_eq!(entity.reference_url, None);
    }

    #[test]
    fn test_empty_result_is_not_found() {
        let body = json!({"itemListElement": []});
        assert_eq!(parse_entity_search(&body).failure(), Some(FailureKind::NotFound));

        let body = json!({"error": "quota"});
        assert_eq!(parse_entity_search(&body).failure(), Some(FailureKind::NotFound));
    }

    #[test]
    fn test_result_without_id_is_field_missing() {
        let body = json!({"itemListElement": [{"result": {"name": "No Id"}}]});
        assert_eq!(parse_entity_search(&body).failure(), Some(FailureKind::FieldMissing));
    }

    #[test]
    fn test_from_config_requires_key() {
        let http = HttpClient::new(&SourceConfig::default()).unwrap();
        let result = GoogleKnowledgeGraph::from_config(http, &SourceConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingCredential(_))));
    }
}

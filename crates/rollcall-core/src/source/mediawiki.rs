use serde_json::Value;
use url::Url;

use super::{ClientResult, Encyclopedia, HttpClient};
use crate::config::SourceConfig;
use crate::outcome::{FailureKind, Outcome};

/// Full-text article search through the MediaWiki action API.
pub struct MediaWiki {
    http: HttpClient,
    endpoint: Url,
    page_root: Url,
}

impl MediaWiki {
    pub fn new(http: HttpClient, endpoint: &str, page_root: &str) -> ClientResult<Self> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            page_root: Url::parse(page_root)?,
        })
    }

    pub fn from_config(http: HttpClient, config: &SourceConfig) -> ClientResult<Self> {
        Self::new(http, &config.mediawiki_endpoint, &config.wiki_page_root)
    }
}

#[async_trait::async_trait]
impl Encyclopedia for MediaWiki {
    async fn search(&self, query: &str) -> Outcome<String> {
        let request = self.http.get(self.endpoint.as_str()).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", "1"),
            ("format", "json"),
        ]);

        self.http
            .send_json(request)
            .await
            .and_then(|body| parse_search_results(&body, &self.page_root))
    }
}

/// Turn the top search hit into an article URL under `page_root`.
pub fn parse_search_results(body: &Value, page_root: &Url) -> Outcome<String> {
    let Some(top) = body
        .pointer("/query/search")
        .and_then(Value::as_array)
        .and_then(|hits| hits.first())
    else {
        return Outcome::Failure(FailureKind::NotFound);
    };

    let Some(title) = top.get("title").and_then(Value::as_str) else {
        return Outcome::Failure(FailureKind::FieldMissing);
    };

    let mut url = page_root.clone();
    {
        let Ok(mut segments) = url.path_segments_mut() else {
            return Outcome::Failure(FailureKind::FieldMissing);
        };
        segments.pop_if_empty().push(&title.replace(' ', "_"));
    }

    Outcome::Success(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/").unwrap()
    }

    #[test]
    fn test_top_hit_becomes_page_url() {
        let body = json!({
            "query": {"search": [
                {"title": "Jim Cooper", "pageid": 1},
                {"title": "Jim Cooper (disambiguation)", "pageid": 2}
            ]}
        });

        let Outcome::Success(url) = parse_search_results(&body, &root()) else {
            panic!("expected a successful parse");
        };

        assert_eq!(url, "https://en.wikipedia.org/wiki/Jim_Cooper");
    }

    #[test]
    fn test_title_is_escaped_as_one_segment() {
        let body = json!({"query": {"search": [{"title": "Who? Me #2"}]}});

        let Outcome::Success(url) = parse_search_results(&body, &root()) else {
            panic!("expected a successful parse");
        };

        assert_eq!(url, "https://en.wikipedia.org/wiki/Who%3F_Me_%232");
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.fragment(), None);
    }

    #[test]
    fn test_no_hits_is_not_found() {
        let body = json!({"query": {"search": []}});
        assert_eq!(parse_search_results(&body, &root()).failure(), Some(FailureKind::NotFound));
    }

    #[test]
    fn test_hit_without_title_is_field_missing() {
        let body = json!({"query": {"search": [{"pageid": 3}]}});
        assert_eq!(
            parse_search_results(&body, &root()).failure(),
            Some(FailureKind::FieldMissing)
        );
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let http = HttpClient::new(&SourceConfig::default()).unwrap();
        assert!(MediaWiki::new(http, "not a url", "https://en.wikipedia.org/wiki/").is_err());
    }
}

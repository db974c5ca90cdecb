//! Google Programmable Search (Custom Search JSON API) backend.
//!
//! The API returns at most 10 results per request.
//!
//! See <https://developers.google.com/custom-search/v1/overview>

use async_trait::async_trait;
use flood_risk_assessment_models::EvidenceItem;

use super::text_field;
use crate::{EvidenceSource, SourceError, http};

/// Largest page size the API accepts.
const MAX_PAGE_SIZE: usize = 10;

/// Google Custom Search client.
pub struct GoogleSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
}

impl GoogleSearchClient {
    /// Creates a client for the Custom Search endpoint at `base_url`.
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        engine_id: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            engine_id,
        }
    }
}

#[async_trait]
impl EvidenceSource for GoogleSearchClient {
    fn id(&self) -> &str {
        "google_search"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidenceItem>, SourceError> {
        let num = limit.clamp(1, MAX_PAGE_SIZE).to_string();

        let body = http::send_json(self.client.get(&self.base_url).query(&[
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ]))
        .await?;

        let mut items = parse_response(&body);
        items.truncate(limit);
        Ok(items)
    }
}

fn parse_response(body: &serde_json::Value) -> Vec<EvidenceItem> {
    // `items` is omitted entirely when there are no results
    body["items"].as_array().map_or_else(Vec::new, |items| {
        items
            .iter()
            .filter_map(|r| {
                Some(EvidenceItem {
                    title: text_field(&r["title"])?,
                    snippet: text_field(&r["snippet"]),
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items() {
        let body = serde_json::json!({
            "items": [
                { "title": "Hurricane Harvey flooding in Houston", "snippet": "Record rainfall..." },
                { "snippet": "no title" }
            ]
        });
        let items = parse_response(&body);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].snippet.as_deref(), Some("Record rainfall..."));
    }

    #[test]
    fn missing_items_is_empty() {
        let body = serde_json::json!({ "searchInformation": { "totalResults": "0" } });
        assert!(parse_response(&body).is_empty());
    }
}

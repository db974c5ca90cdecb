//! `SerpApi` search backend.
//!
//! See <https://serpapi.com/search-api>

use async_trait::async_trait;
use flood_risk_assessment_models::EvidenceItem;

use super::text_field;
use crate::{EvidenceSource, SourceError, http};

/// `SerpApi` client.
pub struct SerpApiClient {
    client: reqwest::Client,
    base_url: String,
    engine: String,
    api_key: String,
}

impl SerpApiClient {
    /// Creates a client for the `SerpApi` endpoint at `base_url` using the
    /// given search `engine` (e.g. `"google"`).
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        base_url: String,
        engine: String,
        api_key: String,
    ) -> Self {
        Self {
            client,
            base_url,
            engine,
            api_key,
        }
    }
}

#[async_trait]
impl EvidenceSource for SerpApiClient {
    fn id(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidenceItem>, SourceError> {
        let num = limit.to_string();

        let body = http::send_json(self.client.get(&self.base_url).query(&[
            ("q", query),
            ("engine", self.engine.as_str()),
            ("num", num.as_str()),
            ("api_key", self.api_key.as_str()),
        ]))
        .await?;

        let mut items = parse_response(&body)?;
        items.truncate(limit);
        Ok(items)
    }
}

fn parse_response(body: &serde_json::Value) -> Result<Vec<EvidenceItem>, SourceError> {
    if let Some(error) = body["error"].as_str() {
        // SerpApi reports an empty result page as an error
        if error.contains("hasn't returned any results") {
            return Ok(Vec::new());
        }
        return Err(SourceError::Response {
            message: format!("SerpApi error: {error}"),
        });
    }

    let Some(results) = body["organic_results"].as_array() else {
        return Ok(Vec::new());
    };

    Ok(results
        .iter()
        .filter_map(|r| {
            Some(EvidenceItem {
                title: text_field(&r["title"])?,
                snippet: text_field(&r["snippet"]),
            })
        })
        .collect())
}

//! Historical flood evidence gathering.
//!
//! Builds the search query for a location and turns raw search results
//! into a deduplicated, bounded [`EvidenceSet`].

use flood_risk_assessment_models::{EvidenceSet, Location, MAX_EVIDENCE_ITEMS};

use crate::{EvidenceSource, SourceError};

/// Returns the text the evidence search is run "near".
///
/// A resolved place name beats raw coordinates, which produce poor search
/// results. ZIP code locations are searched by ZIP.
#[must_use]
pub fn place_hint(location: &Location, place_name: Option<&str>) -> String {
    match location {
        Location::ZipCode { zip } => format!("ZIP code {zip}"),
        Location::Coordinates(coords) => place_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| coords.to_string(), String::from),
    }
}

/// Builds the search query for `place`.
#[must_use]
pub fn search_query(place: &str) -> String {
    format!("historical flood events near {place}")
}

/// Searches `source` for past flooding near `place`.
///
/// # Errors
///
/// Returns [`SourceError`] if the search backend fails.
pub async fn fetch_evidence(
    source: &dyn EvidenceSource,
    place: &str,
) -> Result<EvidenceSet, SourceError> {
    let query = search_query(place);
    log::debug!("Searching {} for {query:?}", source.id());

    let items = source.search(&query, MAX_EVIDENCE_ITEMS).await?;
    let set = EvidenceSet::from_items(items);

    log::debug!("{} evidence item(s) from {}", set.len(), source.id());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use flood_risk_assessment_models::{Coordinates, EvidenceItem, ZipCode};

    use super::*;

    struct RecordingSource {
        queries: Mutex<Vec<String>>,
        items: Vec<EvidenceItem>,
    }

    #[async_trait]
    impl EvidenceSource for RecordingSource {
        fn id(&self) -> &str {
            "recording"
        }

        async fn search(
            &self,
            query: &str,
            _limit: usize,
        ) -> Result<Vec<EvidenceItem>, SourceError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.items.clone())
        }
    }

    fn item(title: &str) -> EvidenceItem {
        EvidenceItem {
            title: title.to_string(),
            snippet: None,
        }
    }

    #[test]
    fn place_hint_prefers_place_name() {
        let location = Location::Coordinates(Coordinates::new(38.90719, -77.03687).unwrap());
        assert_eq!(
            place_hint(&location, Some("Washington, District of Columbia")),
            "Washington, District of Columbia"
        );
        assert_eq!(place_hint(&location, Some("  ")), "38.9072, -77.0369");
        assert_eq!(place_hint(&location, None), "38.9072, -77.0369");

        let zip = Location::ZipCode {
            zip: ZipCode::parse("70112").unwrap(),
        };
        assert_eq!(place_hint(&zip, Some("New Orleans")), "ZIP code 70112");
    }

    #[tokio::test]
    async fn fetch_evidence_builds_query_and_dedupes() {
        let source = RecordingSource {
            queries: Mutex::new(Vec::new()),
            items: vec![item("Flood of 2019"), item("flood of 2019"), item("")],
        };

        let set = fetch_evidence(&source, "Davenport, Iowa").await.unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(
            source.queries.lock().unwrap().as_slice(),
            ["historical flood events near Davenport, Iowa"]
        );
    }
}

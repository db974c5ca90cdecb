//! Shared HTTP plumbing for the source clients.
//!
//! Every client sends its requests through [`send_json`] so that status
//! handling and failure logging are uniform. Requests are attempted
//! exactly once: the surrounding assessment is short-lived and
//! user-facing, so a failed source is reported and skipped instead of
//! retried. The per-request timeout comes from the [`reqwest::Client`]
//! built by [`build_client`].

use std::time::Duration;

use crate::SourceError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Builds the HTTP client shared by all sources.
///
/// Every request made through the client is bounded by `timeout`.
/// `user_agent` is sent with every request; some public services (NWS,
/// Nominatim) reject anonymous clients.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the TLS backend cannot be
/// initialized.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

/// Sends a request and parses the response body as JSON.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the server answers with
/// a non-2xx status, or the body is not valid JSON.
pub async fn send_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value, SourceError> {
    let response = request.send().await?;

    let url = redact(response.url());
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        log::warn!(
            "Request failed\n  \
             url: {url}\n  \
             status: {status}\n  \
             body preview: {}",
            preview(&text),
        );
        return Err(SourceError::Status { status, url });
    }

    serde_json::from_str(&text).map_err(|e| {
        log::warn!(
            "JSON parse failed\n  \
             url: {url}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {}",
            text.len(),
            preview(&text),
        );
        SourceError::Json(e)
    })
}

/// Strips the query string so API keys never reach the logs.
fn redact(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_drops_query_string() {
        let url =
            reqwest::Url::parse("https://serpapi.com/search.json?q=flood&api_key=secret").unwrap();
        assert_eq!(redact(&url), "https://serpapi.com/search.json");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = "é".repeat(BODY_PREVIEW_LEN);
        let cut = preview(&text);
        assert!(cut.len() <= BODY_PREVIEW_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
        assert_eq!(preview("short"), "short");
    }
}

// reqwest client for the auction backend's JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use gavel_core::config::Config;
use gavel_core::model::{AuctionEvent, AuctionState, Category, Player, Team, TeamSafeBid};

use crate::{Ack, ApiError, AuctionApi, DirectSaleRequest, SaleRequest};

// ---------------------------------------------------------------------------
// HttpAuctionApi
// ---------------------------------------------------------------------------

/// Talks to `{base_url}/api/...` with an optional bearer token.
pub struct HttpAuctionApi {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpAuctionApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.backend.base_url,
            config.credentials.bearer_token.clone(),
            Duration::from_secs(config.backend.request_timeout_secs),
        )
    }

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let request = self.authorize(self.http.get(url).query(query));
        decode(send(request).await?).await
    }

    async fn post_query(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Ack, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let request = self.authorize(self.http.post(url).query(query));
        decode_ack(send(request).await?).await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Ack, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST json");
        let request = self.authorize(self.http.post(url).json(body));
        decode_ack(send(request).await?).await
    }
}

#[async_trait]
impl AuctionApi for HttpAuctionApi {
    async fn auction_state(&self, event_id: &str) -> Result<AuctionState, ApiError> {
        self.get_json(&["auction", "state", event_id], &[]).await
    }

    async fn event(&self, event_id: &str) -> Result<AuctionEvent, ApiError> {
        self.get_json(&["events", event_id], &[]).await
    }

    async fn players(&self, event_id: &str) -> Result<Vec<Player>, ApiError> {
        self.get_json(&["players", "event", event_id], &[]).await
    }

    async fn teams(&self, event_id: &str) -> Result<Vec<Team>, ApiError> {
        self.get_json(&["teams", "event", event_id], &[]).await
    }

    async fn categories(&self, event_id: &str) -> Result<Vec<Category>, ApiError> {
        self.get_json(&["categories", "event", event_id], &[]).await
    }

    async fn safe_bid_summary(
        &self,
        event_id: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<TeamSafeBid>, ApiError> {
        let segments = ["teams", "safe-bid-summary", event_id];
        match category_id {
            Some(category) => self.get_json(&segments, &[("category_id", category)]).await,
            None => self.get_json(&segments, &[]).await,
        }
    }

    async fn start_auction(&self, event_id: &str) -> Result<Ack, ApiError> {
        self.post_query(&["auction", "start", event_id], &[]).await
    }

    async fn pause_auction(&self, event_id: &str) -> Result<Ack, ApiError> {
        self.post_query(&["auction", "pause", event_id], &[]).await
    }

    async fn next_player(&self, event_id: &str, player_id: &str) -> Result<Ack, ApiError> {
        self.post_query(&["auction", "next-player", event_id], &[("player_id", player_id)])
            .await
    }

    async fn complete_transaction(&self, sale: &SaleRequest) -> Result<Ack, ApiError> {
        self.post_json(&["bids", "complete-transaction"], sale).await
    }

    async fn finalize(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError> {
        self.post_query(&["bids", "finalize", player_id], &[("event_id", event_id)])
            .await
    }

    async fn sell_player(
        &self,
        player_id: &str,
        sale: &DirectSaleRequest,
    ) -> Result<Ack, ApiError> {
        self.post_json(&["players", player_id, "sell"], sale).await
    }

    async fn mark_unsold(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError> {
        self.post_query(&["players", player_id, "mark-unsold"], &[("event_id", event_id)])
            .await
    }

    async fn make_available(&self, player_id: &str, event_id: &str) -> Result<Ack, ApiError> {
        self.post_query(
            &["players", player_id, "make-available"],
            &[("event_id", event_id)],
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Send the request and turn non-2xx answers into `ApiError::Status`.
async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Mutations answer with `{"message": ...}`, but an empty body is fine too.
async fn decode_ack(response: Response) -> Result<Ack, ApiError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Ack::default());
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull a human-readable reason out of an error body.
///
/// FastAPI answers `{"detail": "..."}` for raised errors and
/// `{"detail": [{"msg": ...}, ...]}` for validation failures.
pub(crate) fn extract_detail(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value.get("detail") {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !msgs.is_empty() {
                    return msgs.join("; ");
                }
            }
            _ => {}
        }
    }
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpAuctionApi {
        HttpAuctionApi::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_appends_api_prefix() {
        let url = api("http://localhost:8000")
            .endpoint(&["auction", "state", "e1"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/auction/state/e1");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = api("https://host.example/backend/")
            .endpoint(&["teams", "event", "e1"])
            .unwrap();
        assert_eq!(url.as_str(), "https://host.example/backend/api/teams/event/e1");
    }

    #[test]
    fn endpoint_encodes_segments() {
        let url = api("http://h").endpoint(&["players", "a b/c", "sell"]).unwrap();
        assert_eq!(url.as_str(), "http://h/api/players/a%20b%2Fc/sell");
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = HttpAuctionApi::new("not a url", None, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let err = HttpAuctionApi::new("mailto:ops@example.com", None, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn empty_token_is_dropped() {
        let api = HttpAuctionApi::new("http://h", Some(String::new()), Duration::from_secs(1))
            .unwrap();
        assert!(api.token.is_none());
    }

    #[test]
    fn detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "Insufficient budget"}"#),
            "Insufficient budget"
        );
    }

    #[test]
    fn detail_validation_list() {
        let body = r#"{"detail": [{"loc": ["query", "event_id"], "msg": "field required"},
                                  {"loc": ["query", "x"], "msg": "bad x"}]}"#;
        assert_eq!(extract_detail(body), "field required; bad x");
    }

    #[test]
    fn detail_falls_back_to_body() {
        assert_eq!(extract_detail("Bad Gateway"), "Bad Gateway");
        assert_eq!(extract_detail("   "), "no details");
        assert_eq!(extract_detail(r#"{"error": "x"}"#), r#"{"error": "x"}"#);
    }
}

//! REST client for the platform backend, used by the API smoke run.
//!
//! One method per endpoint; each performs a single request under the
//! client's timeout and never retries.

pub mod types;

use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::BackendError;
use crate::error::body_snippet;

pub use types::{CreatedToken, Discussion, NewToken, RewardPool, TokenList, TokenSummary};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9000";

pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        if timeout.is_zero() {
            return Err(BackendError::Precondition(
                "request timeout must be greater than zero".to_owned(),
            ));
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("`{base_url}`: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl(format!(
                "`{base_url}`: expected http or https"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Value, BackendError> {
        let body = self.call(Method::GET, &["api", "health"], None::<&()>).await?;
        decode(&body)
    }

    pub async fn list_tokens(&self) -> Result<TokenList, BackendError> {
        let body = self.call(Method::GET, &["api", "tokens"], None::<&()>).await?;
        decode(&body)
    }

    pub async fn create_token(&self, token: &NewToken) -> Result<CreatedToken, BackendError> {
        let body = self.call(Method::POST, &["api", "tokens"], Some(token)).await?;
        decode(&body)
    }

    pub async fn get_token(&self, pub_address: &str) -> Result<TokenSummary, BackendError> {
        let body = self
            .call(Method::GET, &["api", "tokens", pub_address], None::<&()>)
            .await?;
        decode(&body)
    }

    pub async fn add_discussion(
        &self,
        token_id: &str,
        discussion: &Discussion,
    ) -> Result<(), BackendError> {
        self.call(
            Method::POST,
            &["api", "tokens", token_id, "discussions"],
            Some(discussion),
        )
        .await?;
        Ok(())
    }

    /// Stake `amount` from `wallet`; the body is the bare JSON number.
    pub async fn stake(
        &self,
        token_id: &str,
        wallet: &str,
        amount: f64,
    ) -> Result<(), BackendError> {
        self.call(
            Method::POST,
            &["api", "tokens", token_id, "stake", wallet],
            Some(&amount),
        )
        .await?;
        Ok(())
    }

    /// `Ok(None)` when the token has no reward pool (HTTP 404).
    pub async fn reward_pool(&self, token_id: &str) -> Result<Option<RewardPool>, BackendError> {
        match self
            .call(Method::GET, &["api", "tokens", token_id, "reward-pool"], None::<&()>)
            .await
        {
            Ok(body) => decode(&body).map(Some),
            Err(BackendError::HttpStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// WebSocket URL on the same host: `http` becomes `ws`, `https` becomes `wss`.
    pub fn websocket_url(&self, path: &str) -> Result<Url, BackendError> {
        let mut url = self.base_url.join(path).map_err(|e| {
            BackendError::InvalidUrl(format!("cannot join `{path}` onto {}: {e}", self.base_url))
        })?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| BackendError::InvalidUrl(format!("cannot switch {url} to {scheme}")))?;
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::InvalidUrl(format!("`{}` cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(segments)?;
        debug!(backend.method = %method, backend.url = %url, "backend call");

        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, body_len = text.len(), "backend response");
        trace!(body = %text, "backend response body");

        if !status.is_success() {
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                body: body_snippet(&text),
            });
        }
        Ok(text)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body)
        .map_err(|e| BackendError::Malformed(format!("{e}; body={}", body_snippet(body))))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&server.base_url(), Duration::from_secs(5)).expect("client must build")
    }

    #[tokio::test]
    async fn create_token_posts_sample_and_reads_address() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/tokens")
                    .json_body_partial(r#"{"name": "Test Token", "tier": "Tier1"}"#);
                then.status(200).json_body(json!({
                    "token": {"name": "Test Token", "pub_address": "So1Test"},
                    "transaction_hash": "5xyz"
                }));
            })
            .await;

        let created = client_for(&server)
            .create_token(&NewToken::smoke_sample())
            .await
            .expect("create must succeed");

        mock.assert_async().await;
        assert_eq!(created.token.pub_address.as_deref(), Some("So1Test"));
        assert_eq!(created.transaction_hash.as_deref(), Some("5xyz"));
    }

    #[tokio::test]
    async fn stake_sends_bare_number_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/tokens/So1Test/stake/test_wallet_123")
                    .json_body(json!(50.0));
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        client_for(&server)
            .stake("So1Test", "test_wallet_123", 50.0)
            .await
            .expect("stake must succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reward_pool_404_is_absent_not_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens/So1Test/reward-pool");
                then.status(404).body("not found");
            })
            .await;

        let pool = client_for(&server)
            .reward_pool("So1Test")
            .await
            .expect("404 is not an error");
        assert_eq!(pool, None);
    }

    #[tokio::test]
    async fn server_error_surfaces_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(500).body("database unavailable");
            })
            .await;

        let err = client_for(&server)
            .list_tokens()
            .await
            .expect_err("500 must fail");
        assert!(matches!(
            err,
            BackendError::HttpStatus { status: 500, ref body } if body == "database unavailable"
        ));
    }

    #[tokio::test]
    async fn token_list_tolerates_missing_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200)
                    .json_body(json!({"tokens": [{"name": "Alpha"}, {"category": "Wild"}]}));
            })
            .await;

        let list = client_for(&server).list_tokens()
            .await
            .expect("list must decode");
        assert_eq!(list.tokens.len(), 2);
        assert_eq!(list.tokens[0].name.as_deref(), Some("Alpha"));
        assert_eq!(list.tokens[1].name, None);
    }

    #[test]
    fn websocket_url_follows_http_scheme() {
        let http =
            BackendClient::new("http://localhost:9000", Duration::from_secs(1)).expect("valid");
        assert_eq!(
            http.websocket_url("/ws").expect("joins").as_str(),
            "ws://localhost:9000/ws"
        );

        let https =
            BackendClient::new("https://api.example.com", Duration::from_secs(1)).expect("valid");
        assert_eq!(
            https.websocket_url("/api/ws").expect("joins").as_str(),
            "wss://api.example.com/api/ws"
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(matches!(
            BackendClient::new("http://localhost:9000", Duration::ZERO),
            Err(BackendError::Precondition(_))
        ));
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            BackendClient::new("ws://localhost:9000", Duration::from_secs(1)),
            Err(BackendError::InvalidUrl(_))
        ));
    }
}

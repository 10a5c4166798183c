use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{body_snippet, ProviderError};

use super::endpoint::{require_identifier, ApiKey, Endpoint, ProviderUrls, Resource};
use super::protocol::{first_of_sequence, non_empty_document, unwrap_envelope, JsonRpcRequest};
use super::types::PerformanceSample;
use super::ChainData;

/// Timeout applied to every provider call, REST and JSON-RPC alike.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stateless client for the Helius REST and JSON-RPC surfaces.
///
/// Every call is a single request: no retries, no backoff, no caching.
#[derive(Debug)]
pub struct HeliusClient {
    client: reqwest::Client,
    urls: ProviderUrls,
    api_key: ApiKey,
    next_id: AtomicU64,
}

impl HeliusClient {
    pub fn new(
        urls: ProviderUrls,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if timeout.is_zero() {
            return Err(ProviderError::Precondition(
                "request timeout must be greater than zero".to_owned(),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(ProviderError::transport)?;

        Ok(Self {
            client,
            urls,
            api_key,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn urls(&self) -> &ProviderUrls {
        &self.urls
    }

    /// Issue one call against `endpoint` and decode the answer according to
    /// the endpoint's resource kind.
    ///
    /// Transport and HTTP status are checked before the body is decoded;
    /// JSON-RPC level errors are only looked at after both succeed.
    pub async fn fetch(
        &self,
        endpoint: &Endpoint,
        payload: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        let url = endpoint.url()?;
        let method = endpoint.http_method();
        debug!(
            provider.method = %method,
            provider.url = %endpoint.redacted_url(),
            provider.payload = payload.is_some(),
            "provider call"
        );

        let mut builder = self.client.request(method, url);
        if let Some(payload) = payload {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .json(payload);
        }

        let response = builder.send().await.map_err(ProviderError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(ProviderError::transport)?;
        debug!(%status, body_len = body.len(), "provider response");
        trace!(body = %body, "provider response body");

        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body: body_snippet(&body),
            });
        }

        let decoded: Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::MalformedResponse(format!("{e}; body={}", body_snippet(&body)))
        })?;

        match endpoint.resource() {
            Resource::AddressInfo { address } => non_empty_document(decoded, address),
            Resource::Transactions => {
                let signature = payload
                    .and_then(|p| p.pointer("/transactions/0"))
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown>");
                first_of_sequence(decoded, signature)
            }
            Resource::JsonRpc { .. } => unwrap_envelope(decoded),
        }
    }

    /// Call a JSON-RPC method and return its `result` member.
    pub async fn rpc_call(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        let endpoint = Endpoint::json_rpc(&self.urls.rpc, &self.api_key, method)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        let payload = serde_json::to_value(&request)
            .map_err(|e| ProviderError::Precondition(format!("encode JSON-RPC request: {e}")))?;
        debug!(rpc.id = id, rpc.method = method, "rpc call");
        self.fetch(&endpoint, Some(&payload)).await
    }
}

#[async_trait]
impl ChainData for HeliusClient {
    async fn address_info(&self, address: &str) -> Result<Value, ProviderError> {
        let endpoint = Endpoint::address_info(&self.urls.api, &self.api_key, address)?;
        self.fetch(&endpoint, None).await
    }

    async fn transaction(&self, signature: &str) -> Result<Value, ProviderError> {
        let signature = require_identifier("transaction signature", signature)?;
        let endpoint = Endpoint::transactions(&self.urls.api, &self.api_key);
        let payload = json!({ "transactions": [signature] });
        self.fetch(&endpoint, Some(&payload)).await
    }

    async fn slot(&self) -> Result<u64, ProviderError> {
        let result = self.rpc_call("getSlot", Vec::new()).await?;
        result.as_u64().ok_or_else(|| {
            ProviderError::MalformedResponse(format!(
                "getSlot result is not a slot number: {result}"
            ))
        })
    }

    async fn recent_performance_samples(
        &self,
        limit: usize,
    ) -> Result<Vec<PerformanceSample>, ProviderError> {
        let result = self
            .rpc_call("getRecentPerformanceSamples", vec![json!(limit)])
            .await?;
        serde_json::from_value(result).map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "invalid getRecentPerformanceSamples result: {e}"
            ))
        })
    }
}

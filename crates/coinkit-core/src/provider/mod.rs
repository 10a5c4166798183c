//! Blockchain data provider access.
//!
//! Defines the [`ChainData`] trait and its HTTP implementation
//! ([`HeliusClient`]) covering the address-info and parsed-transaction REST
//! endpoints plus the JSON-RPC methods used by setup.

mod client;
mod endpoint;
mod protocol;
pub mod types;

pub use client::{HeliusClient, DEFAULT_TIMEOUT};
pub use endpoint::{
    is_placeholder, parse_base_url, rpc_url, ApiKey, Endpoint, ProviderUrls, Resource,
    DEFAULT_API_BASE_URL, DEFAULT_RPC_BASE_URL,
};
pub use types::PerformanceSample;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

/// The provider calls the command-line tools need.
///
/// Each method performs exactly one request and holds no state between calls.
#[async_trait]
pub trait ChainData: Send + Sync {
    /// Account information for a base58 address.
    async fn address_info(&self, address: &str) -> Result<Value, ProviderError>;

    /// Parsed details of one transaction, by signature.
    async fn transaction(&self, signature: &str) -> Result<Value, ProviderError>;

    /// Current slot via `getSlot`; doubles as a connectivity check.
    async fn slot(&self) -> Result<u64, ProviderError>;

    async fn recent_performance_samples(
        &self,
        limit: usize,
    ) -> Result<Vec<PerformanceSample>, ProviderError>;
}

use reqwest::{Method, Url};

use crate::error::ProviderError;

/// REST API host for address and parsed-transaction lookups.
pub const DEFAULT_API_BASE_URL: &str = "https://api.helius.xyz";

/// JSON-RPC host; the API key is carried in the path.
pub const DEFAULT_RPC_BASE_URL: &str = "https://mainnet.helius-rpc.com";

/// Stand-in for the API key in logged URLs.
const REDACTED: &str = "***";

// ==============================================================================
// Credentials and Identifiers
// ==============================================================================

/// A provider API key that has passed precondition checks.
///
/// The raw value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, ProviderError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::Precondition(
                "API key is missing; set HELIUS_API_KEY or pass --api-key".to_owned(),
            ));
        }
        if is_placeholder(trimmed) {
            return Err(ProviderError::Precondition(format!(
                "API key is still the placeholder `{trimmed}`; replace it with a real key"
            )));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Template values such as `YOUR_HELIUS_API_KEY_HERE` left in place of a
/// real credential or identifier.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.len() > "YOUR__HERE".len() && value.starts_with("YOUR_") && value.ends_with("_HERE")
}

pub(crate) fn require_identifier(field: &str, value: &str) -> Result<String, ProviderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Precondition(format!("{field} must not be empty")));
    }
    if is_placeholder(trimmed) {
        return Err(ProviderError::Precondition(format!(
            "{field} is still the placeholder `{trimmed}`"
        )));
    }
    Ok(trimmed.to_owned())
}

// ==============================================================================
// Base URLs
// ==============================================================================

/// Base URLs for the two provider surfaces.
#[derive(Debug, Clone)]
pub struct ProviderUrls {
    pub api: Url,
    pub rpc: Url,
}

impl ProviderUrls {
    pub fn new(api: &str, rpc: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            api: parse_base_url(api)?,
            rpc: parse_base_url(rpc)?,
        })
    }
}

impl Default for ProviderUrls {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_RPC_BASE_URL)
            .expect("default provider URLs are valid static config")
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ProviderError> {
    let parsed = Url::parse(raw).map_err(|e| {
        ProviderError::Precondition(format!("invalid base URL `{raw}`: expected HTTP(S) URL ({e})"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ProviderError::Precondition(format!(
            "unsupported base URL scheme `{other}`; expected http or https"
        ))),
    }
}

/// The `HELIUS_RPC_URL` value for a key: `{rpc_base}/v0/{key}`.
pub fn rpc_url(rpc_base: &Url, api_key: &ApiKey) -> Result<Url, ProviderError> {
    with_segments(rpc_base, &["v0", api_key.expose()])
}

fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| {
            ProviderError::Precondition(format!("base URL `{base}` cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ==============================================================================
// Endpoint Descriptor
// ==============================================================================

/// What an [`Endpoint`] points at. The HTTP method follows from the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// `GET {api}/v0/addresses/{address}/info?api-key={key}`
    AddressInfo { address: String },
    /// `POST {api}/v0/transactions/?api-key={key}`
    Transactions,
    /// `POST {rpc}/v0/{key}` with a JSON-RPC envelope.
    JsonRpc { method: String },
}

impl Resource {
    pub fn http_method(&self) -> Method {
        match self {
            Self::AddressInfo { .. } => Method::GET,
            Self::Transactions | Self::JsonRpc { .. } => Method::POST,
        }
    }
}

/// Immutable description of one provider call target.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: Url,
    api_key: ApiKey,
    resource: Resource,
}

impl Endpoint {
    pub fn address_info(
        api_base: &Url,
        api_key: &ApiKey,
        address: &str,
    ) -> Result<Self, ProviderError> {
        let address = require_identifier("address", address)?;
        Ok(Self {
            base_url: api_base.clone(),
            api_key: api_key.clone(),
            resource: Resource::AddressInfo { address },
        })
    }

    pub fn transactions(api_base: &Url, api_key: &ApiKey) -> Self {
        Self {
            base_url: api_base.clone(),
            api_key: api_key.clone(),
            resource: Resource::Transactions,
        }
    }

    pub fn json_rpc(rpc_base: &Url, api_key: &ApiKey, method: &str) -> Result<Self, ProviderError> {
        let method = require_identifier("RPC method", method)?;
        Ok(Self {
            base_url: rpc_base.clone(),
            api_key: api_key.clone(),
            resource: Resource::JsonRpc { method },
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn http_method(&self) -> Method {
        self.resource.http_method()
    }

    /// Full request URL, credential included.
    pub fn url(&self) -> Result<Url, ProviderError> {
        self.url_with_credential(self.api_key.expose())
    }

    /// The request URL with the credential masked, for logs and diagnostics.
    ///
    /// Built from the same segments as [`Endpoint::url`], so keys that need
    /// percent-encoding are masked as well.
    pub fn redacted_url(&self) -> String {
        match self.url_with_credential(REDACTED) {
            Ok(url) => url.to_string(),
            Err(_) => self.base_url.to_string(),
        }
    }

    fn url_with_credential(&self, credential: &str) -> Result<Url, ProviderError> {
        let mut url = match &self.resource {
            Resource::AddressInfo { address } => {
                with_segments(&self.base_url, &["v0", "addresses", address.as_str(), "info"])?
            }
            Resource::Transactions => with_segments(&self.base_url, &["v0", "transactions", ""])?,
            Resource::JsonRpc { .. } => return with_segments(&self.base_url, &["v0", credential]),
        };
        url.query_pairs_mut().append_pair("api-key", credential);
        Ok(url)
    }
}

use std::path::PathBuf;

use crate::ws::SessionReport;

/// Longest response-body excerpt carried in error messages.
const BODY_SNIPPET_CHARS: usize = 256;

// ==============================================================================
// Crate Error
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    EnvFile(#[from] EnvFileError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Ws(#[from] WsError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ==============================================================================
// Provider Errors
// ==============================================================================

/// Coarse classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Precondition,
    Transport,
    HttpStatus,
    MalformedResponse,
    RpcError,
    NotFound,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precondition => write!(f, "precondition"),
            Self::Transport => write!(f, "transport"),
            Self::HttpStatus => write!(f, "http status"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::RpcError => write!(f, "rpc error"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

/// Failure of a single call against the blockchain data provider.
///
/// Transport errors are stored with their URL stripped, since provider URLs
/// embed the API key.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON-RPC error: {0}")]
    Rpc(serde_json::Value),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Precondition(_) => FailureKind::Precondition,
            Self::Transport(_) => FailureKind::Transport,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::Rpc(_) => FailureKind::RpcError,
            Self::NotFound(_) => FailureKind::NotFound,
        }
    }

    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

// ==============================================================================
// Env File Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EnvFileError {
    #[error("invalid env key `{0}`: must be non-empty and contain no `=` or line breaks")]
    InvalidKey(String),

    #[error("invalid value for `{0}`: must not contain line breaks")]
    InvalidValue(String),

    #[error("env file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ==============================================================================
// Backend Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("backend returned malformed JSON: {0}")]
    Malformed(String),
}

// ==============================================================================
// WebSocket Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("websocket protocol error: {0}")]
    Protocol(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("no reply to `{command}` within {timeout_ms} ms")]
    ReplyTimeout { command: String, timeout_ms: u128 },

    #[error("connection closed before a reply to `{command}` arrived")]
    Closed { command: String },

    #[error("session stopped after {} replies: {source}", report.replies.len())]
    Incomplete {
        report: Box<SessionReport>,
        #[source]
        source: Box<WsError>,
    },
}

impl WsError {
    /// Replies and events received before the session failed, if it got
    /// past the connect step.
    pub fn partial_report(&self) -> Option<&SessionReport> {
        match self {
            Self::Incomplete { report, .. } => Some(&**report),
            _ => None,
        }
    }

    /// The failure itself, looking through [`WsError::Incomplete`].
    pub fn failure(&self) -> &WsError {
        match self {
            Self::Incomplete { source, .. } => source.failure(),
            other => other,
        }
    }
}

/// Truncate a response body for inclusion in a diagnostic.
pub(crate) fn body_snippet(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

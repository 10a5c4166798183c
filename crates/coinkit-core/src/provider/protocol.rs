use serde_json::Value;

use crate::error::{body_snippet, ProviderError};

#[derive(serde::Serialize)]
pub(super) struct JsonRpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) id: u64,
    pub(super) method: &'a str,
    pub(super) params: Vec<Value>,
}

/// Unwrap a decoded JSON-RPC envelope.
///
/// An `error` member wins over `result`. A well-formed envelope with neither
/// is still an RPC-level failure, reported with a `null` error payload.
pub(super) fn unwrap_envelope(decoded: Value) -> Result<Value, ProviderError> {
    let Value::Object(mut envelope) = decoded else {
        return Err(ProviderError::MalformedResponse(format!(
            "expected JSON-RPC envelope object, got {}",
            body_snippet(&decoded.to_string())
        )));
    };

    match envelope.remove("error") {
        Some(err) if !err.is_null() => return Err(ProviderError::Rpc(err)),
        _ => {}
    }

    envelope
        .remove("result")
        .ok_or(ProviderError::Rpc(Value::Null))
}

/// The transaction lookup answers with a sequence; only its head is wanted.
pub(super) fn first_of_sequence(decoded: Value, signature: &str) -> Result<Value, ProviderError> {
    match decoded {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("transaction {signature}"))),
        other => Err(ProviderError::MalformedResponse(format!(
            "expected a JSON array of transactions, got {}",
            body_snippet(&other.to_string())
        ))),
    }
}

/// Address lookups answer with a document; `null` or `{}` means nothing known.
pub(super) fn non_empty_document(decoded: Value, address: &str) -> Result<Value, ProviderError> {
    let empty = match &decoded {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ProviderError::NotFound(format!("address {address}")));
    }
    Ok(decoded)
}

//! Typed views over provider responses that callers inspect field by field.
//!
//! Address and transaction documents stay as raw `serde_json::Value`; their
//! shape is owned by the provider and only ever pretty-printed.

use serde::{Deserialize, Serialize};

// ==============================================================================
// Performance Samples
// ==============================================================================

/// One entry of `getRecentPerformanceSamples`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub num_transactions: Option<u64>,
    #[serde(default)]
    pub num_slots: Option<u64>,
    #[serde(default)]
    pub sample_period_secs: Option<u64>,
}

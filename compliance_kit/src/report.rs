//! Benchmark report model and decoder
//!
//! Mirrors the JSON export written by the benchmark evaluator: a root group
//! holding nested `groups`, each with `controls`, each with `results`. Every
//! field except the root `groups` is optional; absent or `null` values decode
//! to empty defaults.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::DecodeError;

/// Decoded evaluator output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBenchmarkReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,

    /// `None` when the export has no `groups` key at all (or it is `null`)
    #[serde(default)]
    pub groups: Option<Vec<BenchmarkGroup>>,
}

/// A benchmark section; may nest further sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub controls: Vec<BenchmarkControl>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<BenchmarkGroup>,
}

/// A single compliance control and its per-resource results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkControl {
    #[serde(default, deserialize_with = "null_as_default")]
    pub control_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<CheckResult>,
}

/// Outcome of one control against one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Raw status string (`ok`, `alarm`, `info`, `skip`, `error`, or anything else)
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,

    /// Human-readable explanation of the outcome
    #[serde(default, alias = "description", deserialize_with = "null_as_default")]
    pub reason: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub resource: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub dimensions: Vec<Dimension>,
}

impl CheckResult {
    /// Value of the first dimension with the given key
    pub fn dimension(&self, key: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

/// Decode raw evaluator output
pub fn decode_report(bytes: &[u8]) -> Result<RawBenchmarkReport, DecodeError> {
    let report = serde_json::from_slice(bytes)?;
    Ok(report)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Check results as produced by workers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One worker's execution of one check against one entity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CheckResult {
    /// Check identifier.
    pub check_id: i64,

    /// Monitored entity identifier.
    pub entity_id: String,

    /// Entity attributes (application_id, stack_name, ...).
    ///
    /// Numbers and booleans are kept as their text form; nested values and
    /// nulls are dropped.
    #[serde(default, deserialize_with = "scalar_attributes")]
    pub entity: BTreeMap<String, String>,

    /// Raw result object. Carries `ts` (seconds, float) and `value` (tree).
    #[serde(default)]
    pub check_result: Value,

    /// Non-sampled results never reach storage.
    #[serde(default = "default_sampled")]
    pub is_sampled: bool,
}

fn default_sampled() -> bool {
    true
}

fn scalar_attributes<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect())
}

impl CheckResult {
    /// Timestamp in seconds, if present and numeric.
    pub fn timestamp(&self) -> Option<f64> {
        self.check_result.get("ts").and_then(Value::as_f64)
    }

    /// The nested value tree, if present.
    pub fn value(&self) -> Option<&Value> {
        self.check_result.get("value")
    }
}

/// Ordered results of one worker invocation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct WorkerBatch {
    #[serde(default)]
    pub results: Vec<CheckResult>,
}

/// Batch envelope with results left unparsed.
#[derive(Deserialize)]
struct RawBatch {
    #[serde(default)]
    results: Vec<Value>,
}

/// Outcome of [`WorkerBatch::parse_lenient`].
#[derive(Debug)]
pub struct ParsedBatch {
    pub batch: WorkerBatch,
    /// One entry per result that did not match the wire format.
    pub rejected: Vec<serde_json::Error>,
}

impl WorkerBatch {
    pub fn new(results: Vec<CheckResult>) -> Self {
        Self { results }
    }

    /// Parse a batch, dropping only the results that fail to deserialize.
    ///
    /// Fails as a whole only when the envelope itself is not a batch.
    pub fn parse_lenient(raw: &str) -> Result<ParsedBatch, serde_json::Error> {
        let envelope: RawBatch = serde_json::from_str(raw)?;
        let mut results = Vec::with_capacity(envelope.results.len());
        let mut rejected = Vec::new();
        for value in envelope.results {
            match serde_json::from_value::<CheckResult>(value) {
                Ok(result) => results.push(result),
                Err(e) => rejected.push(e),
            }
        }
        Ok(ParsedBatch {
            batch: Self { results },
            rejected,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Check id used for shard routing of the whole batch.
    ///
    /// Only the first result is consulted; a batch spanning several checks is
    /// routed as a unit.
    pub fn reference_check_id(&self) -> Option<i64> {
        self.results.first().map(|r| r.check_id)
    }
}

/// Everything a writer receives for one ingested batch.
#[derive(Debug, Clone)]
pub struct WriteData {
    /// Parsed batch; `None` when the upstream payload could not be parsed.
    pub batch: Option<WorkerBatch>,
    /// Originating account.
    pub account_id: String,
    /// Originating region.
    pub region: String,
    /// Size of the raw inbound payload in bytes.
    pub payload_bytes: usize,
}

impl WriteData {
    pub fn new(
        batch: WorkerBatch,
        account_id: impl Into<String>,
        region: impl Into<String>,
        payload_bytes: usize,
    ) -> Self {
        Self {
            batch: Some(batch),
            account_id: account_id.into(),
            region: region.into(),
            payload_bytes,
        }
    }

    /// Results of the batch, or `None` when absent or empty.
    pub fn results(&self) -> Option<&[CheckResult]> {
        match &self.batch {
            Some(batch) if !batch.is_empty() => Some(&batch.results),
            _ => None,
        }
    }
}

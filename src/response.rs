//! Response bodies and the outcome of a completed search.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{LlmProvider, SearchEngine, SearchError};

/// Fallback detail when an error body names no cause.
pub const DEFAULT_SERVER_DETAIL: &str = "Server error";

/// Backend statistics attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// Provider that wrote the answer.
    pub llm_provider: LlmProvider,
    /// Engine that supplied the sources.
    pub search_engine: SearchEngine,
    /// Backend processing time.
    pub processing_time_ms: u64,
    /// Number of sources found.
    pub results_found: u64,
}

impl SearchMetadata {
    /// One-line badge summary, e.g. `OpenAI · google · 1234ms · 5 sources`.
    pub fn summary(&self) -> String {
        format!(
            "{} · {} · {}ms · {} sources",
            self.llm_provider.label(),
            self.search_engine,
            self.processing_time_ms,
            self.results_found
        )
    }

    /// Reads metadata from a loosely shaped JSON object.
    ///
    /// Extra keys are ignored and non-negative float counts are rounded.
    /// Returns `None` if a field is missing or the provider/engine is unknown.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = |name: &str| value.get(name).and_then(Value::as_str);
        let count = |name: &str| value.get(name).and_then(as_count);

        Some(Self {
            llm_provider: text("llm_provider")?.parse().ok()?,
            search_engine: text("search_engine")?.parse().ok()?,
            processing_time_ms: count("processing_time_ms")?,
            results_found: count("results_found")?,
        })
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.round() as u64)
    })
}

/// A metadata object that does not fit [`SearchMetadata`] is dropped, never
/// allowed to invalidate the answer it came with.
fn lenient_metadata<'de, D>(deserializer: D) -> Result<Option<SearchMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let metadata = raw.as_ref().and_then(SearchMetadata::from_value);
    if raw.is_some() && metadata.is_none() {
        debug!("Ignoring metadata that does not match the expected shape");
    }
    Ok(metadata)
}

/// Successful (2xx) response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Generated answer.
    pub answer: String,
    /// Source URLs in backend order.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    /// Backend statistics. `None` when absent or not in the expected shape.
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Option<SearchMetadata>,
}

/// Error (non-2xx) response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl ErrorBody {
    /// Parses a raw error body. Anything that is not a JSON object yields an empty body.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// `detail`, else `error`, else [`DEFAULT_SERVER_DETAIL`].
    ///
    /// Empty strings and nulls count as missing. Non-string values (such as a
    /// list of validation problems) are rendered as compact JSON.
    pub fn message(&self) -> String {
        [&self.detail, &self.error]
            .into_iter()
            .find_map(|field| field.as_ref().and_then(render_detail))
            .unwrap_or_else(|| DEFAULT_SERVER_DETAIL.to_string())
    }
}

fn render_detail(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

/// The displayable result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The backend answered.
    Success {
        answer: String,
        sources: Vec<String>,
        metadata: Option<SearchMetadata>,
    },
    /// The submission failed; `message` is shown verbatim.
    Failure { message: String },
}

impl SearchOutcome {
    /// Builds a failure outcome from an error's user-facing message.
    pub fn failure(error: &SearchError) -> Self {
        SearchOutcome::Failure {
            message: error.to_string(),
        }
    }

    /// Returns true for [`SearchOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }
}

impl From<SearchResponse> for SearchOutcome {
    fn from(response: SearchResponse) -> Self {
        SearchOutcome::Success {
            answer: response.answer,
            sources: response.sources.unwrap_or_default(),
            metadata: response.metadata,
        }
    }
}

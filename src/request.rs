//! Outbound search request composition.

use serde::{Deserialize, Serialize};

use crate::{LlmProvider, Result, SearchEngine, SearchError, SearchPreferences};

/// Per-submission choices that are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientSelections {
    /// Search engine for this submission.
    pub search_engine: SearchEngine,
}

impl TransientSelections {
    /// Creates selections for the given engine.
    pub fn new(search_engine: SearchEngine) -> Self {
        Self { search_engine }
    }
}

/// Body of the `POST` sent to the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Trimmed, non-empty question.
    pub query: String,
    /// Search engine the backend should use.
    pub search_engine: SearchEngine,
    /// LLM provider the backend should use.
    pub llm_provider: LlmProvider,
    /// Custom search API key, omitted when the server default applies.
    #[serde(rename = "searchcans_api_key", skip_serializing_if = "Option::is_none", default)]
    pub search_api_key: Option<String>,
    /// Custom LLM API key, omitted when the server default applies.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub llm_api_key: Option<String>,
}

impl SearchRequest {
    /// Builds a request from preferences, transient selections and raw query text.
    ///
    /// Pure: touches neither storage nor network. Fails with
    /// [`SearchError::Validation`] when the query is blank after trimming.
    pub fn compose(
        prefs: &SearchPreferences,
        selections: &TransientSelections,
        query: &str,
    ) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::Validation);
        }

        Ok(Self {
            query: query.to_string(),
            search_engine: selections.search_engine,
            llm_provider: prefs.llm_provider,
            search_api_key: prefs.effective_search_key().map(str::to_string),
            llm_api_key: prefs.effective_llm_key().map(str::to_string),
        })
    }

    /// Returns true if any user-supplied key is attached.
    pub fn has_custom_keys(&self) -> bool {
        self.search_api_key.is_some() || self.llm_api_key.is_some()
    }
}

//! Provider choices and the persisted preference record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// LLM provider used by the backend to write the answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Qwen,
}

impl LlmProvider {
    /// Wire and storage identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Qwen => "qwen",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::Qwen => "Qwen",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "qwen" => Ok(LlmProvider::Qwen),
            other => Err(format!("unknown LLM provider '{}'", other)),
        }
    }
}

/// Web search engine the backend queries. Chosen per submission, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
}

impl SearchEngine {
    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::Bing => "bing",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SearchEngine::Google => "Google",
            SearchEngine::Bing => "Bing",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(SearchEngine::Google),
            "bing" => Ok(SearchEngine::Bing),
            other => Err(format!("unknown search engine '{}'", other)),
        }
    }
}

/// User preferences that survive between sessions.
///
/// Key fields may hold text while their custom flag is off (the user typed a
/// key, then switched back to the server default). Such keys are never sent
/// and never stored; see [`SearchPreferences::effective_search_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPreferences {
    /// Selected LLM provider.
    pub llm_provider: LlmProvider,
    /// Whether a user-supplied search API key replaces the server default.
    pub use_custom_search_key: bool,
    /// User-supplied search API key.
    pub search_api_key: Option<String>,
    /// Whether a user-supplied LLM API key replaces the server default.
    pub use_custom_llm_key: bool,
    /// User-supplied LLM API key.
    pub llm_api_key: Option<String>,
}

impl SearchPreferences {
    /// Creates the default preferences.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the LLM provider.
    pub fn with_llm_provider(mut self, provider: LlmProvider) -> Self {
        self.llm_provider = provider;
        self
    }

    /// Enables a custom search API key.
    pub fn with_custom_search_key(mut self, key: impl Into<String>) -> Self {
        self.use_custom_search_key = true;
        self.search_api_key = Some(key.into());
        self
    }

    /// Enables a custom LLM API key.
    pub fn with_custom_llm_key(mut self, key: impl Into<String>) -> Self {
        self.use_custom_llm_key = true;
        self.llm_api_key = Some(key.into());
        self
    }

    /// The search key to send and store: only in custom mode and only when non-empty.
    pub fn effective_search_key(&self) -> Option<&str> {
        effective_key(self.use_custom_search_key, self.search_api_key.as_deref())
    }

    /// The LLM key to send and store: only in custom mode and only when non-empty.
    pub fn effective_llm_key(&self) -> Option<&str> {
        effective_key(self.use_custom_llm_key, self.llm_api_key.as_deref())
    }
}

fn effective_key(enabled: bool, key: Option<&str>) -> Option<&str> {
    match key {
        Some(key) if enabled && !key.is_empty() => Some(key),
        _ => None,
    }
}

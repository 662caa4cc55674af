//! Persistence of [`SearchPreferences`] on top of a [`Storage`].

use tracing::debug;

use crate::storage::Storage;
use crate::{LlmProvider, Result, SearchPreferences};

/// Storage key for the selected LLM provider.
pub const KEY_LLM_PROVIDER: &str = "llmProvider";
/// Storage key for the custom search key flag.
pub const KEY_USE_CUSTOM_SEARCH_KEY: &str = "useCustomSearchKey";
/// Storage key for the custom search API key.
pub const KEY_SEARCH_API_KEY: &str = "searchcansApiKey";
/// Storage key for the custom LLM key flag.
pub const KEY_USE_CUSTOM_LLM_KEY: &str = "useCustomLlmKey";
/// Storage key for the custom LLM API key.
pub const KEY_LLM_API_KEY: &str = "llmApiKey";

/// Loads and saves user preferences.
pub struct ConfigStore<S> {
    storage: S,
}

impl<S: Storage> ConfigStore<S> {
    /// Wraps a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Reads preferences, falling back to defaults field by field.
    ///
    /// Never fails: absent or unparseable values yield the default for that field.
    pub fn load(&self) -> SearchPreferences {
        let defaults = SearchPreferences::default();

        let llm_provider = self
            .storage
            .get_item(KEY_LLM_PROVIDER)
            .and_then(|raw| raw.parse::<LlmProvider>().ok())
            .unwrap_or(defaults.llm_provider);

        SearchPreferences {
            llm_provider,
            use_custom_search_key: self.load_flag(KEY_USE_CUSTOM_SEARCH_KEY),
            search_api_key: self.load_key(KEY_SEARCH_API_KEY),
            use_custom_llm_key: self.load_flag(KEY_USE_CUSTOM_LLM_KEY),
            llm_api_key: self.load_key(KEY_LLM_API_KEY),
        }
    }

    /// Writes preferences.
    ///
    /// Provider and flags are always written. A key is written only in custom
    /// mode with a non-empty value; otherwise any stored copy is removed.
    pub fn save(&mut self, prefs: &SearchPreferences) -> Result<()> {
        self.storage
            .set_item(KEY_LLM_PROVIDER, prefs.llm_provider.as_str())?;
        self.storage.set_item(
            KEY_USE_CUSTOM_SEARCH_KEY,
            bool_str(prefs.use_custom_search_key),
        )?;
        self.storage
            .set_item(KEY_USE_CUSTOM_LLM_KEY, bool_str(prefs.use_custom_llm_key))?;

        self.store_or_scrub(KEY_SEARCH_API_KEY, prefs.effective_search_key())?;
        self.store_or_scrub(KEY_LLM_API_KEY, prefs.effective_llm_key())?;

        debug!(
            "Saved preferences: provider={}, custom_search_key={}, custom_llm_key={}",
            prefs.llm_provider, prefs.use_custom_search_key, prefs.use_custom_llm_key
        );
        Ok(())
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn load_flag(&self, key: &str) -> bool {
        self.storage.get_item(key).as_deref() == Some("true")
    }

    fn load_key(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).filter(|value| !value.is_empty())
    }

    fn store_or_scrub(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.storage.set_item(key, value),
            None => self.storage.remove_item(key),
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

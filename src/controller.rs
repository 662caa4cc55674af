//! Search request lifecycle.
//!
//! [`SearchController`] holds the editable form state, the user's
//! preferences and the single live [`SearchOutcome`]. A submission runs in
//! two halves so the caller can await the network without holding the
//! controller: [`SearchController::begin_submit`] validates, clears the old
//! result, saves preferences and hands back a [`PendingSearch`];
//! [`SearchController::complete`] applies the result if it is still current.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_TIMEOUT_MS;
use crate::config_store::ConfigStore;
use crate::response::{SearchMetadata, SearchOutcome};
use crate::storage::Storage;
use crate::transport::{classify, Transport, TransportError};
use crate::{
    LlmProvider, SearchEngine, SearchError, SearchPreferences, SearchRequest, TransientSelections,
};

/// Ready-made questions offered next to the query field.
pub const EXAMPLE_QUERIES: [&str; 3] = [
    "Latest AI breakthroughs 2024",
    "ChatGPT vs other LLMs",
    "React 19 features",
];

/// Where the controller is in the request lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl Phase {
    /// Returns true for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

/// A request that has been issued but not yet delivered.
pub struct PendingSearch {
    seq: u64,
    request: SearchRequest,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl PendingSearch {
    /// Sequence number of this request.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The request body that will be sent.
    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// Sends the request and classifies the result. Never fails; failures
    /// become [`SearchOutcome::Failure`].
    pub async fn dispatch(self) -> Completion {
        let start = Instant::now();
        let result = match timeout(self.timeout, self.transport.send(&self.request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Request #{} timed out after {:?}", self.seq, self.timeout);
                Err(TransportError::NoResponse(format!(
                    "timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        let outcome = classify(result);
        debug!(
            "Request #{} finished in {}ms (success={})",
            self.seq,
            start.elapsed().as_millis(),
            outcome.is_success()
        );
        Completion {
            seq: self.seq,
            outcome,
        }
    }
}

/// The classified result of a [`PendingSearch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    seq: u64,
    outcome: SearchOutcome,
}

impl Completion {
    /// Sequence number of the request this completes.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The classified outcome.
    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }
}

/// Drives one search form: input, persistence, dispatch and result display.
pub struct SearchController<S> {
    config_store: ConfigStore<S>,
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
    query: String,
    selections: TransientSelections,
    prefs: SearchPreferences,
    phase: Phase,
    outcome: Option<SearchOutcome>,
    latest_seq: u64,
    save_error: Option<String>,
}

impl<S: Storage> SearchController<S> {
    /// Creates a controller, restoring preferences from `storage`.
    pub fn new<T: Transport + 'static>(storage: S, transport: T) -> Self {
        Self::with_shared_transport(storage, Arc::new(transport))
    }

    /// Creates a controller around an already shared transport.
    pub fn with_shared_transport(storage: S, transport: Arc<dyn Transport>) -> Self {
        let config_store = ConfigStore::new(storage);
        let prefs = config_store.load();
        debug!(
            "Restored preferences: provider={}, custom_search_key={}, custom_llm_key={}",
            prefs.llm_provider, prefs.use_custom_search_key, prefs.use_custom_llm_key
        );

        Self {
            config_store,
            transport,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            query: String::new(),
            selections: TransientSelections::default(),
            prefs,
            phase: Phase::Idle,
            outcome: None,
            latest_seq: 0,
            save_error: None,
        }
    }

    /// Sets the client-side bound on a single request.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    // ------------------------------------------------------------------
    // Field edits. All of them are inert while a request is in flight.
    // ------------------------------------------------------------------

    /// Sets the query text.
    pub fn set_query(&mut self, query: impl Into<String>) {
        if self.guard_busy("set_query") {
            return;
        }
        self.query = query.into();
    }

    /// Sets the query to one of the examples and clears any error.
    /// Answer, sources and metadata are left alone; nothing is submitted.
    pub fn select_example(&mut self, example: impl Into<String>) {
        if self.guard_busy("select_example") {
            return;
        }
        self.query = example.into();
        if matches!(self.outcome, Some(SearchOutcome::Failure { .. })) {
            self.outcome = None;
            self.phase = Phase::Idle;
        }
    }

    /// Chooses the search engine for the next submission.
    pub fn set_search_engine(&mut self, engine: SearchEngine) {
        if self.guard_busy("set_search_engine") {
            return;
        }
        self.selections.search_engine = engine;
    }

    /// Chooses the LLM provider.
    pub fn set_llm_provider(&mut self, provider: LlmProvider) {
        if self.guard_busy("set_llm_provider") {
            return;
        }
        self.prefs.llm_provider = provider;
    }

    /// Switches between the server's search key and a custom one.
    pub fn set_use_custom_search_key(&mut self, enabled: bool) {
        if self.guard_busy("set_use_custom_search_key") {
            return;
        }
        self.prefs.use_custom_search_key = enabled;
    }

    /// Sets the custom search key text.
    pub fn set_search_api_key(&mut self, key: impl Into<String>) {
        if self.guard_busy("set_search_api_key") {
            return;
        }
        self.prefs.search_api_key = Some(key.into());
    }

    /// Switches between the server's LLM key and a custom one.
    pub fn set_use_custom_llm_key(&mut self, enabled: bool) {
        if self.guard_busy("set_use_custom_llm_key") {
            return;
        }
        self.prefs.use_custom_llm_key = enabled;
    }

    /// Sets the custom LLM key text.
    pub fn set_llm_api_key(&mut self, key: impl Into<String>) {
        if self.guard_busy("set_llm_api_key") {
            return;
        }
        self.prefs.llm_api_key = Some(key.into());
    }

    /// Flips custom search key mode.
    pub fn toggle_custom_search_key(&mut self) {
        let enabled = !self.prefs.use_custom_search_key;
        self.set_use_custom_search_key(enabled);
    }

    /// Flips custom LLM key mode.
    pub fn toggle_custom_llm_key(&mut self) {
        let enabled = !self.prefs.use_custom_llm_key;
        self.set_use_custom_llm_key(enabled);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts a submission.
    ///
    /// Returns `None` when a request is already in flight (the call is
    /// ignored) or when the query is blank (the controller is now `Failed`
    /// with the validation message; nothing was saved or sent).
    ///
    /// Otherwise the previous result is cleared, preferences are saved, and
    /// the composed request is returned for dispatch. A failed preference
    /// write does not stop the submission; it is reported through
    /// [`SearchController::preferences_save_error`].
    pub fn begin_submit(&mut self) -> Option<PendingSearch> {
        if self.phase == Phase::Submitting {
            debug!("Submit ignored: request #{} still in flight", self.latest_seq);
            return None;
        }

        self.phase = Phase::Validating;
        if self.query.trim().is_empty() {
            debug!("Submit rejected: empty query");
            self.finish(SearchOutcome::failure(&SearchError::Validation));
            return None;
        }

        self.outcome = None;

        self.save_error = match self.config_store.save(&self.prefs) {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to save preferences: {}", e);
                Some(e.to_string())
            }
        };

        let request = match SearchRequest::compose(&self.prefs, &self.selections, &self.query) {
            Ok(request) => request,
            Err(e) => {
                self.finish(SearchOutcome::failure(&e));
                return None;
            }
        };

        self.latest_seq += 1;
        self.phase = Phase::Submitting;
        info!(
            "Submitting request #{}: engine={}, provider={}",
            self.latest_seq, request.search_engine, request.llm_provider
        );

        Some(PendingSearch {
            seq: self.latest_seq,
            request,
            transport: Arc::clone(&self.transport),
            timeout: self.request_timeout,
        })
    }

    /// Applies a completion. Returns false, leaving the display untouched,
    /// if it is not for the latest request or the controller was cleared
    /// in the meantime.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if completion.seq != self.latest_seq || self.phase != Phase::Submitting {
            debug!(
                "Ignoring stale completion #{} (latest #{}, phase {:?})",
                completion.seq, self.latest_seq, self.phase
            );
            return false;
        }

        self.finish(completion.outcome);
        true
    }

    /// Runs a whole submission and returns the resulting live outcome.
    pub async fn submit(&mut self) -> Option<&SearchOutcome> {
        if let Some(pending) = self.begin_submit() {
            let completion = pending.dispatch().await;
            self.complete(completion);
        }
        self.outcome.as_ref()
    }

    /// Resets query and result to empty. Preferences are untouched, and a
    /// request still in flight will be ignored when it completes.
    pub fn clear(&mut self) {
        if self.phase == Phase::Submitting {
            debug!("Clearing with request #{} in flight", self.latest_seq);
        }
        self.query.clear();
        self.outcome = None;
        self.phase = Phase::Idle;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// Current query text, untrimmed.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Selected search engine.
    pub fn search_engine(&self) -> SearchEngine {
        self.selections.search_engine
    }

    /// Working copy of the preferences.
    pub fn preferences(&self) -> &SearchPreferences {
        &self.prefs
    }

    /// The live outcome, if any.
    pub fn outcome(&self) -> Option<&SearchOutcome> {
        self.outcome.as_ref()
    }

    /// Answer text of a successful outcome.
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            Some(SearchOutcome::Success { answer, .. }) => Some(answer),
            _ => None,
        }
    }

    /// Sources of a successful outcome; empty otherwise.
    pub fn sources(&self) -> &[String] {
        match &self.outcome {
            Some(SearchOutcome::Success { sources, .. }) => sources,
            _ => &[],
        }
    }

    /// Metadata of a successful outcome.
    pub fn metadata(&self) -> Option<&SearchMetadata> {
        match &self.outcome {
            Some(SearchOutcome::Success { metadata, .. }) => metadata.as_ref(),
            _ => None,
        }
    }

    /// Message of a failed outcome.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Some(SearchOutcome::Failure { message }) => Some(message),
            _ => None,
        }
    }

    /// Why the last preference write failed, if it did. Cleared by the next
    /// successful write.
    pub fn preferences_save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    /// The preference store.
    pub fn config_store(&self) -> &ConfigStore<S> {
        &self.config_store
    }

    fn finish(&mut self, outcome: SearchOutcome) {
        self.phase = if outcome.is_success() {
            Phase::Succeeded
        } else {
            Phase::Failed
        };
        if let SearchOutcome::Failure { message } = &outcome {
            info!("Search failed: {}", message);
        }
        self.outcome = Some(outcome);
    }

    fn guard_busy(&self, action: &str) -> bool {
        if self.is_busy() {
            debug!("{} ignored while request #{} is in flight", action, self.latest_seq);
            return true;
        }
        false
    }
}

//! # smart-search
//!
//! Client library for a search-and-answer backend: it collects a question
//! plus provider choices, posts them to the backend, and turns the reply into
//! an answer with sources or a single human-readable error.
//!
//! - Preferences (LLM provider, custom API keys) persist through a pluggable
//!   [`Storage`]; keys are scrubbed as soon as custom mode is switched off.
//! - Requests go through a pluggable [`Transport`]; the default
//!   [`HttpTransport`] uses reqwest with a 30 second timeout.
//! - [`SearchController`] owns the request lifecycle and drops responses
//!   that arrive for anything but the latest request.
//!
//! ## Example
//!
//! ```rust,no_run
//! use smart_search::{ClientConfig, FileStorage, HttpTransport, SearchController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::from_env()?;
//!     let storage = FileStorage::open(&config.store_path)?;
//!     let transport = HttpTransport::new(&config)?;
//!
//!     let mut controller = SearchController::new(storage, transport);
//!     controller.set_query("Latest AI breakthroughs 2024");
//!     controller.submit().await;
//!
//!     match controller.error() {
//!         Some(message) => eprintln!("{}", message),
//!         None => println!("{}", controller.answer().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod config_store;
mod controller;
mod error;
mod preferences;
mod request;
mod response;
mod storage;
mod transport;
mod transport_http;

pub use config::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS};
pub use config_store::{
    ConfigStore, KEY_LLM_API_KEY, KEY_LLM_PROVIDER, KEY_SEARCH_API_KEY, KEY_USE_CUSTOM_LLM_KEY,
    KEY_USE_CUSTOM_SEARCH_KEY,
};
pub use controller::{Completion, PendingSearch, Phase, SearchController, EXAMPLE_QUERIES};
pub use error::{Result, SearchError};
pub use preferences::{LlmProvider, SearchEngine, SearchPreferences};
pub use request::{SearchRequest, TransientSelections};
pub use response::{ErrorBody, SearchMetadata, SearchOutcome, SearchResponse};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use transport::{classify, Transport, TransportError, TransportResponse};
pub use transport_http::HttpTransport;

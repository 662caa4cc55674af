//! End-to-end tests: controller + HTTP transport + file storage against a
//! local mock backend.

use std::time::Duration;

use serde_json::{json, Value};
use smart_search::{
    ClientConfig, ConfigStore, FileStorage, HttpTransport, LlmProvider, Phase, SearchController,
    SearchEngine, Storage, KEY_LLM_API_KEY, KEY_LLM_PROVIDER, KEY_SEARCH_API_KEY,
    KEY_USE_CUSTOM_LLM_KEY, KEY_USE_CUSTOM_SEARCH_KEY,
};
use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SEARCH_PATH: &str = "/api/smart_search";

/// Controller wired to `server` with preferences stored in `dir`.
fn controller_for(server: &MockServer, dir: &TempDir) -> SearchController<FileStorage> {
    let config = ClientConfig::new()
        .with_endpoint(format!("{}{}", server.uri(), SEARCH_PATH))
        .with_store_path(dir.path().join("preferences.json"));
    let storage = assert_ok!(FileStorage::open(&config.store_path));
    let transport = assert_ok!(HttpTransport::new(&config));
    SearchController::new(storage, transport)
}

fn reopen_storage(dir: &TempDir) -> FileStorage {
    assert_ok!(FileStorage::open(dir.path().join("preferences.json")))
}

async fn sent_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request: &Request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

async fn mount_answer(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_queries_never_reach_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "x"})))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        for query in ["", " ", "\n\t  "] {
            controller.set_query(query);
            controller.submit().await;
            assert_eq!(controller.phase(), Phase::Failed);
            assert_eq!(controller.error(), Some("Please enter your question"));
        }

        assert!(!dir.path().join("preferences.json").exists());
    }
}

mod preference_tests {
    use super::*;

    #[test]
    fn test_provider_and_flags_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");

        for provider in [LlmProvider::OpenAi, LlmProvider::Qwen] {
            for (search_flag, llm_flag) in [(false, false), (true, false), (false, true), (true, true)] {
                let mut store = ConfigStore::new(FileStorage::open(&path).unwrap());
                let mut prefs = store.load();
                prefs.llm_provider = provider;
                prefs.use_custom_search_key = search_flag;
                prefs.use_custom_llm_key = llm_flag;
                store.save(&prefs).unwrap();

                let loaded = ConfigStore::new(FileStorage::open(&path).unwrap()).load();
                assert_eq!(loaded.llm_provider, provider);
                assert_eq!(loaded.use_custom_search_key, search_flag);
                assert_eq!(loaded.use_custom_llm_key, llm_flag);
            }
        }
    }

    #[test]
    fn test_custom_mode_off_scrubs_stored_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item(KEY_USE_CUSTOM_SEARCH_KEY, "true").unwrap();
        storage.set_item(KEY_SEARCH_API_KEY, "vcans_old").unwrap();
        storage.set_item(KEY_USE_CUSTOM_LLM_KEY, "true").unwrap();
        storage.set_item(KEY_LLM_API_KEY, "sk-old").unwrap();

        let mut store = ConfigStore::new(storage);
        let mut prefs = store.load();
        assert_eq!(prefs.llm_api_key.as_deref(), Some("sk-old"));
        prefs.use_custom_search_key = false;
        prefs.use_custom_llm_key = false;
        store.save(&prefs).unwrap();

        let loaded = ConfigStore::new(FileStorage::open(&path).unwrap()).load();
        assert!(loaded.search_api_key.is_none());
        assert!(loaded.llm_api_key.is_none());
    }
}

mod response_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_sources_is_empty_list() {
        let server = MockServer::start().await;
        mount_answer(&server, json!({"answer": "No sources needed."})).await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("hello");
        controller.submit().await;

        assert_eq!(controller.phase(), Phase::Succeeded);
        assert_eq!(controller.answer(), Some("No sources needed."));
        assert!(controller.sources().is_empty());
        assert!(controller.metadata().is_none());
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn test_metadata_is_exposed() {
        let server = MockServer::start().await;
        mount_answer(
            &server,
            json!({
                "answer": "Answer",
                "sources": ["https://a.example"],
                "metadata": {
                    "llm_provider": "qwen",
                    "search_engine": "bing",
                    "processing_time_ms": 812,
                    "results_found": 1
                }
            }),
        )
        .await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("hello");
        controller.submit().await;

        let metadata = controller.metadata().unwrap();
        assert_eq!(metadata.llm_provider, LlmProvider::Qwen);
        assert_eq!(metadata.search_engine, SearchEngine::Bing);
        assert_eq!(metadata.processing_time_ms, 812);
        assert_eq!(metadata.results_found, 1);
    }

    #[tokio::test]
    async fn test_rate_limited_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({"detail": "rate limited"})))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("hello");
        controller.submit().await;

        assert_eq!(controller.phase(), Phase::Failed);
        assert_eq!(controller.error(), Some("Error (429): rate limited"));
    }

    #[tokio::test]
    async fn test_server_error_without_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("hello");
        controller.submit().await;

        assert_eq!(controller.error(), Some("Error (500): Server error"));
    }

    #[tokio::test]
    async fn test_timeout_reports_no_connection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let config = ClientConfig::new()
            .with_endpoint(format!("{}{}", server.uri(), SEARCH_PATH))
            .with_timeout_ms(200);
        let storage = FileStorage::open(dir.path().join("preferences.json")).unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        let mut controller = SearchController::new(storage, transport);

        controller.set_query("hello");
        controller.submit().await;

        assert_eq!(
            controller.error(),
            Some("Cannot connect to server. Check network or backend status.")
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_no_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dir = TempDir::new().unwrap();
        let config =
            ClientConfig::new().with_endpoint(format!("http://127.0.0.1:{}{}", port, SEARCH_PATH));
        let storage = FileStorage::open(dir.path().join("preferences.json")).unwrap();
        let mut controller = SearchController::new(storage, HttpTransport::new(&config).unwrap());

        controller.set_query("hello");
        controller.submit().await;

        assert_eq!(
            controller.error(),
            Some("Cannot connect to server. Check network or backend status.")
        );
        // Preferences were written before the request went out.
        assert!(reopen_storage(&dir).contains(KEY_LLM_PROVIDER));
    }
}

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_default_keys_three_sources() {
        let server = MockServer::start().await;
        mount_answer(
            &server,
            json!({
                "answer": "Several notable AI breakthroughs happened in 2024.",
                "sources": [
                    "https://one.example/ai",
                    "https://two.example/ai",
                    "https://three.example/ai"
                ]
            }),
        )
        .await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("Latest AI breakthroughs 2024");
        controller.set_search_engine(SearchEngine::Google);
        controller.set_llm_provider(LlmProvider::OpenAi);
        controller.submit().await;

        let bodies = sent_bodies(&server).await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0],
            json!({
                "query": "Latest AI breakthroughs 2024",
                "search_engine": "google",
                "llm_provider": "openai"
            })
        );

        assert_eq!(
            controller.answer(),
            Some("Several notable AI breakthroughs happened in 2024.")
        );
        assert_eq!(
            controller.sources(),
            [
                "https://one.example/ai",
                "https://two.example/ai",
                "https://three.example/ai"
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_llm_key_is_sent_and_stored() {
        let server = MockServer::start().await;
        mount_answer(&server, json!({"answer": "ok", "sources": []})).await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.toggle_custom_llm_key();
        controller.set_llm_api_key("sk-test");
        controller.set_query("anything");
        controller.submit().await;

        let bodies = sent_bodies(&server).await;
        assert_eq!(bodies[0]["llm_api_key"], "sk-test");
        assert!(bodies[0].get("searchcans_api_key").is_none());

        assert_eq!(controller.phase(), Phase::Succeeded);
        let storage = reopen_storage(&dir);
        assert_eq!(storage.get_item(KEY_LLM_API_KEY), Some("sk-test".to_string()));
        assert_eq!(storage.get_item(KEY_USE_CUSTOM_LLM_KEY), Some("true".to_string()));
    }

    #[tokio::test]
    async fn test_toggling_custom_llm_key_off_removes_stored_key() {
        let server = MockServer::start().await;
        mount_answer(&server, json!({"answer": "ok"})).await;
        let dir = TempDir::new().unwrap();

        {
            let mut storage = reopen_storage(&dir);
            storage.set_item(KEY_USE_CUSTOM_LLM_KEY, "true").unwrap();
            storage.set_item(KEY_LLM_API_KEY, "sk-stored").unwrap();
        }

        let mut controller = controller_for(&server, &dir);
        assert!(controller.preferences().use_custom_llm_key);

        controller.toggle_custom_llm_key();
        controller.set_query("any valid query");
        controller.submit().await;

        let bodies = sent_bodies(&server).await;
        assert!(bodies[0].get("llm_api_key").is_none());

        let storage = reopen_storage(&dir);
        assert!(!storage.contains(KEY_LLM_API_KEY));
        assert_eq!(storage.get_item(KEY_USE_CUSTOM_LLM_KEY), Some("false".to_string()));
    }

    #[tokio::test]
    async fn test_failure_then_retry_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "warming up"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_answer(&server, json!({"answer": "ready"})).await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("status?");
        controller.submit().await;
        assert_eq!(controller.error(), Some("Error (503): warming up"));

        controller.submit().await;
        assert_eq!(controller.answer(), Some("ready"));
        assert!(controller.error().is_none());
        assert_eq!(sent_bodies(&server).await.len(), 2);
    }

    #[tokio::test]
    async fn test_preferences_saved_before_request_leaves() {
        let server = MockServer::start().await;
        mount_answer(&server, json!({"answer": "ok"})).await;
        let dir = TempDir::new().unwrap();
        let mut controller = controller_for(&server, &dir);

        controller.set_query("  rust async  ");
        controller.set_search_engine(SearchEngine::Bing);
        controller.set_llm_provider(LlmProvider::Qwen);
        controller.set_use_custom_search_key(true);
        controller.set_search_api_key("sc-key");

        let pending = controller.begin_submit().unwrap();
        assert_eq!(controller.phase(), Phase::Submitting);
        assert_eq!(pending.request().query, "rust async");
        assert_eq!(pending.request().search_engine, SearchEngine::Bing);
        assert_eq!(pending.request().llm_provider, LlmProvider::Qwen);
        assert_eq!(pending.request().search_api_key.as_deref(), Some("sc-key"));
        assert!(pending.request().llm_api_key.is_none());

        let storage = reopen_storage(&dir);
        assert_eq!(storage.get_item(KEY_LLM_PROVIDER), Some("qwen".to_string()));
        assert_eq!(storage.get_item(KEY_SEARCH_API_KEY), Some("sc-key".to_string()));
        assert!(sent_bodies(&server).await.is_empty());

        let completion = pending.dispatch().await;
        assert!(controller.complete(completion));
        assert_eq!(controller.answer(), Some("ok"));
        assert!(controller.preferences_save_error().is_none());
        assert_eq!(sent_bodies(&server).await.len(), 1);
    }
}

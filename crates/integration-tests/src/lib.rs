//! Integration tests for Kennel Desk.
//!
//! The tests run the admin API in-process against mocked collaborators:
//! - the hosted data store is a `wiremock` server answering under `/rest/v1/`
//! - the analysis API is a second `wiremock` server (only when needed)
//! - the durable state file lives in a `tempfile` directory
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kennel-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `store_persistence` - Durable subset across restarts
//! - `dog_sync` - Roster services against the data store
//! - `api` - The JSON API over HTTP

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, TimeZone, Utc};
use kennel_admin::analysis::AnalysisClient;
use kennel_admin::config::AdminConfig;
use kennel_admin::db::DataClient;
use kennel_admin::routes;
use kennel_admin::state::AppState;
use kennel_admin::store::{AppStore, JsonFilePersistence, MissingDogPolicy, StoreHandle};
use kennel_core::{Dog, DogId, DogStatus, Email, Gender, User, UserId};
use serde::Serialize;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DATA_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.c2VydmljZV9yb2xl.Qm9vZ2llV29vZ2ll";
pub const ANALYSIS_KEY: &str = "sk-proj-7Hq2LmZ9xVb4Nc8Rt1Ws6Ky3";

/// Configuration pointing at the given mock servers.
pub fn config(
    data_url: &str,
    analysis_url: Option<&str>,
    state_file: &Path,
    policy: &str,
) -> AdminConfig {
    let mut vars = HashMap::from([
        ("DATA_STORE_URL".to_string(), data_url.to_string()),
        ("DATA_STORE_KEY".to_string(), DATA_KEY.to_string()),
        (
            "KENNEL_STATE_FILE".to_string(),
            state_file.display().to_string(),
        ),
        ("KENNEL_MISSING_DOG_POLICY".to_string(), policy.to_string()),
    ]);
    if let Some(url) = analysis_url {
        vars.insert("ANALYSIS_API_KEY".to_string(), ANALYSIS_KEY.to_string());
        vars.insert("ANALYSIS_API_URL".to_string(), url.to_string());
    }
    AdminConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config is valid")
}

/// Open a store over a state file.
pub fn open_store(state_file: &Path, policy: MissingDogPolicy) -> StoreHandle {
    StoreHandle::new(AppStore::open(JsonFilePersistence::new(state_file), policy))
}

/// Data store mock plus a data client and store wired to it, for driving
/// the services directly.
pub struct Backend {
    pub data_store: MockServer,
    pub data: DataClient,
    pub store: StoreHandle,
    pub state_file: PathBuf,
    _dir: TempDir,
}

impl Backend {
    pub async fn start() -> Self {
        Self::start_with_policy(MissingDogPolicy::Ignore).await
    }

    pub async fn start_with_policy(policy: MissingDogPolicy) -> Self {
        let dir = TempDir::new().unwrap();
        let state_file = dir.path().join("state.json");
        let data_store = MockServer::start().await;
        let config = config(&data_store.uri(), None, &state_file, "ignore");
        let data = DataClient::new(&config.data_store).unwrap();
        let store = open_store(&state_file, policy);
        Self {
            data_store,
            data,
            store,
            state_file,
            _dir: dir,
        }
    }
}

/// The API served on an ephemeral port.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub data_store: MockServer,
    pub analysis: Option<MockServer>,
    _dir: TempDir,
}

impl TestApp {
    /// Serve the API without analysis configured.
    pub async fn spawn() -> Self {
        Self::spawn_inner(false).await
    }

    /// Serve the API with the analysis API mocked as well.
    pub async fn spawn_with_analysis() -> Self {
        Self::spawn_inner(true).await
    }

    async fn spawn_inner(with_analysis: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let data_store = MockServer::start().await;
        let analysis = if with_analysis {
            Some(MockServer::start().await)
        } else {
            None
        };
        let analysis_url = analysis.as_ref().map(|server| format!("{}/v1", server.uri()));

        let config = config(
            &data_store.uri(),
            analysis_url.as_deref(),
            &dir.path().join("state.json"),
            "ignore",
        );
        let store = open_store(&config.state_file, config.missing_dog_policy);
        let data = DataClient::new(&config.data_store).unwrap();
        let analysis_client = config.analysis().map(|c| AnalysisClient::new(c).unwrap());
        let state = AppState::new(config, store, data, analysis_client);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::router().with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            state,
            data_store,
            analysis,
            _dir: dir,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

// -----------------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------------

#[must_use]
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[must_use]
pub fn dog(name: &str, gender: Gender) -> Dog {
    Dog {
        id: DogId::generate(),
        name: name.to_string(),
        breed: "Border Collie".to_string(),
        gender,
        birth_date: day(2021, 4, 12),
        color: "black and white".to_string(),
        weight: None,
        microchip_id: None,
        registration_number: None,
        owner_contact: None,
        status: DogStatus::Owned,
        photos: vec![],
        sire_id: None,
        dam_id: None,
        notes: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap(),
        updated_at: None,
    }
}

#[must_use]
pub fn user() -> User {
    User {
        id: UserId::generate(),
        email: Email::parse("breeder@kennel.test").unwrap(),
        full_name: Some("Ada Breeder".to_string()),
        avatar_url: None,
        created_at: Utc.with_ymd_and_hms(2023, 11, 2, 8, 0, 0).unwrap(),
    }
}

/// A 200 response carrying `rows` as a JSON array.
pub fn rows<T: Serialize>(rows: &[T]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::to_value(rows).unwrap())
}

/// Answer `GET /rest/v1/{table}` with `rows`.
pub async fn mount_table<T: Serialize>(server: &MockServer, table: &str, data: &[T]) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{table}")))
        .respond_with(rows(data))
        .mount(server)
        .await;
}

/// Answer every other table read with an empty array. Mount this after the
/// specific tables, which take precedence.
pub async fn mount_empty_tables(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/v1/[a-z_]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

/// A chat-completions response with one choice.
#[must_use]
pub fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

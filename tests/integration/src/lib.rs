//! Integration tests for SaltSign server.
//!
//! Each test starts the real HTTP service on an ephemeral local port with an
//! in-memory store and drives it over HTTP with `reqwest`, exactly as a
//! browser client would.
//!
//! Run them with:
//! ```text
//! cargo test -p saltsign-integration
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use saltsign_auth::StaticKeyRepository;
use saltsign_auth::canonical::Payload;
use saltsign_auth::signer::{SignableRequest, sign_with_password};
use saltsign_core::SaltSignConfig;
use saltsign_http::AuthHttpService;
use saltsign_store::MemoryStore;
use tokio::net::TcpListener;

/// Application salt used by every test server.
pub const APP_SALT: &str = "app-default-salt";

/// Reduced iteration count; the production floor is not under test here.
pub const TEST_ITERATIONS: u32 = 1_000;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A running in-process server.
#[derive(Debug)]
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// The store behind the server, for inspecting state.
    pub store: MemoryStore,
}

impl TestServer {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Start a server with default configuration and users `admin`/`password`
/// and `alice`/`wonderland`.
pub async fn spawn_server() -> TestServer {
    spawn_server_with(SaltSignConfig::default()).await
}

/// Start a server with the given configuration.
pub async fn spawn_server_with(config: SaltSignConfig) -> TestServer {
    init_tracing();

    let store = MemoryStore::new();
    let keys = StaticKeyRepository::default()
        .with_password("admin", "password", APP_SALT, TEST_ITERATIONS)
        .with_password("alice", "wonderland", APP_SALT, TEST_ITERATIONS);
    let service = AuthHttpService::from_config(&config, Arc::new(store.clone()), Arc::new(keys));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let conn = http
                .serve_connection(TokioIo::new(stream), service.clone())
                .into_owned();
            tokio::spawn(async move {
                let _ = conn.await;
            });
        }
    });

    TestServer {
        base_url: format!("http://{addr}"),
        store,
    }
}

/// Create an HTTP client.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// A salt as returned by `GET /api/salt`.
#[derive(Debug, Clone)]
pub struct Salt {
    /// Salt identifier.
    pub salt_id: String,
    /// Base64 salt value.
    pub salt: String,
}

/// Fetch a fresh salt.
pub async fn fetch_salt(client: &reqwest::Client, server: &TestServer) -> Salt {
    let json: serde_json::Value = client
        .get(server.url("/api/salt"))
        .send()
        .await
        .expect("GET /api/salt")
        .json()
        .await
        .expect("salt JSON");
    Salt {
        salt_id: json["salt_id"].as_str().expect("salt_id").to_owned(),
        salt: json["salt"].as_str().expect("salt").to_owned(),
    }
}

/// Build a signed request body for `path`.
#[must_use]
pub fn signed_body(
    salt: &Salt,
    path: &str,
    username: &str,
    password: &str,
    timestamp: i64,
    nonce: &str,
    payload: &Payload,
) -> serde_json::Value {
    let signable = SignableRequest {
        method: "POST".to_owned(),
        path: path.to_owned(),
        salt: salt.salt.clone(),
        timestamp,
        nonce: nonce.to_owned(),
        payload: payload.clone(),
    };
    let sig = sign_with_password(password, APP_SALT, TEST_ITERATIONS, &signable)
        .expect("sign request");

    let mut body = serde_json::json!({
        "username": username,
        "sig": sig,
        "salt_id": salt.salt_id,
        "timestamp": timestamp,
        "nonce": nonce,
    });
    match payload {
        Payload::Body(raw) => body["body"] = serde_json::Value::from(raw.as_str()),
        Payload::Params(params) => {
            body["params"] = serde_json::to_value(params).expect("params JSON");
        }
    }
    body
}

/// Current unix time in seconds.
#[must_use]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Log in and return the `session_id=...` cookie pair.
pub async fn login(
    client: &reqwest::Client,
    server: &TestServer,
    username: &str,
    password: &str,
) -> String {
    let salt = fetch_salt(client, server).await;
    let body = signed_body(
        &salt,
        "/api/login",
        username,
        password,
        now(),
        "login",
        &Payload::default(),
    );
    let response = client
        .post(server.url("/api/login"))
        .json(&body)
        .send()
        .await
        .expect("POST /api/login");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    session_cookie(&response).expect("session cookie")
}

/// Extract the `session_id=...` pair from a response's `Set-Cookie` header.
#[must_use]
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_id="))
        .and_then(|v| v.split(';').next())
        .map(ToOwned::to_owned)
}

mod test_login;
mod test_query;
mod test_salt;
mod test_session;

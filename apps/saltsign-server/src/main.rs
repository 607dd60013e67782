//! SaltSign Server - salted challenge-response authentication over HTTP.
//!
//! Issues single-use salts, verifies HMAC-signed login and query requests and
//! keeps sessions in an expiring key-value store.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:5000 saltsign-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:5000` | Bind address |
//! | `APP_SALT` | `app-default-salt` | Application salt for key derivation |
//! | `KDF_ITERATIONS` | `100000` | PBKDF2 iterations (never lower) |
//! | `SALT_TTL` | `60` | Salt lifetime in seconds |
//! | `SESSION_TTL` | `3600` | Session lifetime in seconds |
//! | `MAX_SKEW` | `60` | Allowed clock skew in seconds |
//! | `REDIS_URL` | *(unset = in-memory)* | Redis store (requires the `redis` feature) |
//! | `STORE_TIMEOUT_MS` | `500` | Deadline for each store call |
//! | `NONCE_REPLAY_PROTECTION` | `false` | Reject reused nonces |
//! | `DEMO_USER` / `DEMO_PASS` | `admin` / `password` | Provisioned demo account |
//! | `COOKIE_SECURE` | `false` | Mark the session cookie `Secure` |
//! | `CORS_ALLOWED_ORIGINS` | `http://127.0.0.1:5000,http://localhost:5000` | Credentialed CORS origins |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use saltsign_auth::StaticKeyRepository;
use saltsign_core::SaltSignConfig;
use saltsign_http::AuthHttpService;
use saltsign_store::{KeyValueStore, MemoryStore, TimeoutStore};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often expired entries are swept from the in-memory store.
const PURGE_INTERVAL: Duration = Duration::from_secs(30);

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// The store selected from configuration.
struct SelectedStore {
    /// Store shared by salts, sessions and nonces, bounded by the store timeout.
    shared: Arc<dyn KeyValueStore>,
    /// The in-memory store when one is used, for periodic purging.
    memory: Option<MemoryStore>,
}

/// Select the backing store: Redis when configured and compiled in, otherwise memory.
async fn build_store(config: &SaltSignConfig) -> Result<SelectedStore> {
    let timeout = Duration::from_millis(config.store_timeout_ms);

    if let Some(url) = &config.store_url {
        #[cfg(feature = "redis")]
        {
            let redis = saltsign_store::RedisStore::connect(url)
                .await
                .context("failed to connect to Redis")?;
            info!("using Redis store");
            return Ok(SelectedStore {
                shared: Arc::new(TimeoutStore::new(Arc::new(redis), timeout)),
                memory: None,
            });
        }
        #[cfg(not(feature = "redis"))]
        {
            let _ = url;
            warn!("REDIS_URL is set but the redis feature is not compiled in, using memory store");
        }
    }

    let memory = MemoryStore::new();
    info!("using in-memory store");
    Ok(SelectedStore {
        shared: Arc::new(TimeoutStore::new(Arc::new(memory.clone()), timeout)),
        memory: Some(memory),
    })
}

/// Derive the demo user's key on a blocking thread.
async fn provision_keys(config: &SaltSignConfig) -> Result<StaticKeyRepository> {
    let user = config.demo_user.clone();
    let password = config.demo_password.clone();
    let app_salt = config.app_salt.clone();
    let iterations = config.kdf_iterations;

    let keys = tokio::task::spawn_blocking(move || {
        StaticKeyRepository::default().with_password(&user, &password, &app_salt, iterations)
    })
    .await
    .context("key derivation task failed")?;

    info!(
        user = %config.demo_user,
        iterations,
        "provisioned demo user"
    );
    Ok(keys)
}

/// Periodically evict expired entries from the in-memory store.
fn spawn_purge_task(memory: MemoryStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            memory.purge_expired();
        }
    });
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: AuthHttpService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the server and requesting `/health`.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    response.contains("200 OK") && response.contains("\"running\"")
}

/// Turn a wildcard bind address into one a local client can connect to.
fn health_check_addr(listen_addr: &str) -> String {
    listen_addr.replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = SaltSignConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;
    config.validate().context("invalid configuration")?;

    let store = build_store(&config).await?;
    if let Some(memory) = store.memory.clone() {
        spawn_purge_task(memory);
    }

    let keys = provision_keys(&config).await?;
    let service = AuthHttpService::from_config(&config, store.shared, Arc::new(keys));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        salt_ttl = config.salt_ttl_seconds,
        session_ttl = config.session_ttl_seconds,
        max_skew = config.max_skew_seconds,
        nonce_replay_protection = config.nonce_replay_protection,
        version = VERSION,
        "starting SaltSign Server",
    );

    serve(listener, service).await
}

//! SaltSign HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use saltsign_auth::{KeyRepository, NonceCache, RequestAuthenticator, SaltStore, SessionManager};
use saltsign_core::SaltSignConfig;
use saltsign_store::KeyValueStore;
use tracing::{info, warn};

use crate::error::HttpError;
use crate::handler::AuthHandler;
use crate::response::{AuthResponseBody, error_to_response};
use crate::router::resolve_route;

/// Largest request body accepted by default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Configuration for the SaltSign HTTP service.
#[derive(Debug, Clone)]
pub struct AuthHttpConfig {
    /// Origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for AuthHttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: SaltSignConfig::default().allowed_origins,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AuthHttpConfig {
    /// Derive the HTTP configuration from the service configuration.
    #[must_use]
    pub fn from_config(config: &SaltSignConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

/// Hyper `Service` implementation for SaltSign.
///
/// Wraps an [`AuthHandler`] and routes incoming HTTP requests to it.
#[derive(Debug, Clone)]
pub struct AuthHttpService {
    handler: Arc<AuthHandler>,
    config: Arc<AuthHttpConfig>,
}

impl AuthHttpService {
    /// Create a new `AuthHttpService`.
    pub fn new(handler: AuthHandler, config: AuthHttpConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            config: Arc::new(config),
        }
    }

    /// Wire the full service from configuration, a store and a key repository.
    ///
    /// Salts, sessions and (when enabled) nonces all share `store`.
    pub fn from_config(
        config: &SaltSignConfig,
        store: Arc<dyn KeyValueStore>,
        keys: Arc<dyn KeyRepository>,
    ) -> Self {
        let max_skew = Duration::from_secs(config.max_skew_seconds);
        let salts = SaltStore::new(
            Arc::clone(&store),
            Duration::from_secs(config.salt_ttl_seconds),
        );
        let mut authenticator = RequestAuthenticator::new(salts, keys, max_skew);
        if config.nonce_replay_protection {
            info!("nonce replay protection enabled");
            authenticator =
                authenticator.with_nonce_cache(NonceCache::new(Arc::clone(&store), max_skew));
        }
        let sessions =
            SessionManager::new(store, Duration::from_secs(config.session_ttl_seconds));

        Self::new(
            AuthHandler::new(authenticator, sessions, config.cookie_secure),
            AuthHttpConfig::from_config(config),
        )
    }

    /// Handle a request with any body type.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<AuthResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let origin = req.headers().get(http::header::ORIGIN).cloned();

        let response = match process_request(req, &self.handler, &self.config).await {
            Ok(response) => response,
            Err(err) => {
                if err.status_code().is_server_error() {
                    warn!(request_id, error = %err, "request failed");
                }
                error_to_response(&err)
            }
        };
        add_common_headers(response, &request_id, origin.as_ref(), &self.config)
    }
}

impl hyper::service::Service<http::Request<Incoming>> for AuthHttpService {
    type Response = http::Response<AuthResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Process a single request through routing, body collection and dispatch.
async fn process_request<B>(
    req: http::Request<B>,
    handler: &AuthHandler,
    config: &AuthHttpConfig,
) -> Result<http::Response<AuthResponseBody>, HttpError>
where
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, incoming) = req.into_parts();

    let route = resolve_route(&parts.method, parts.uri.path())?;
    let body = collect_body(incoming, config.max_body_bytes).await?;

    handler.dispatch(route, &parts.headers, body).await
}

/// Collect the incoming body into a single `Bytes` buffer, bounded in size.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, HttpError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                HttpError::PayloadTooLarge(limit)
            } else {
                HttpError::malformed(format!("failed to read request body: {e}"))
            }
        })
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<AuthResponseBody>,
    request_id: &str,
    origin: Option<&http::HeaderValue>,
    config: &AuthHttpConfig,
) -> http::Response<AuthResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }

    headers.insert("server", http::HeaderValue::from_static("SaltSign"));

    // CORS headers, only for allowed origins since credentials are allowed.
    if let Some(origin) = origin {
        if origin.to_str().is_ok_and(|o| config.is_origin_allowed(o)) {
            headers.insert("access-control-allow-origin", origin.clone());
            headers.insert(
                "access-control-allow-credentials",
                http::HeaderValue::from_static("true"),
            );
            headers.insert(
                "access-control-allow-methods",
                http::HeaderValue::from_static("GET, POST, OPTIONS"),
            );
            headers.insert(
                "access-control-allow-headers",
                http::HeaderValue::from_static("content-type"),
            );
        }
        headers.append(http::header::VARY, http::HeaderValue::from_static("Origin"));
    }

    response
}

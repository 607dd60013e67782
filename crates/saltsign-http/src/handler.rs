//! Endpoint handlers.
//!
//! Each handler takes the already-collected request body and returns either a
//! complete response or an [`HttpError`] that the service formats. Protected
//! routes all go through the same [`RequestAuthenticator`], so timestamp and
//! salt checks apply uniformly.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use saltsign_auth::{AuthError, RequestAuthenticator, SessionManager, SignedRequestBody};
use saltsign_core::SessionId;
use serde::Serialize;
use tracing::{debug, info};

use crate::cookie::{session_clear_cookie, session_cookie, session_set_cookie};
use crate::error::HttpError;
use crate::response::{AuthResponseBody, ok_json};
use crate::router::Route;

type Response = http::Response<AuthResponseBody>;

/// A row returned by the demo query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoRow {
    /// Row id.
    pub id: u32,
    /// Display name.
    pub name: &'static str,
    /// Account status.
    pub status: &'static str,
}

const DEMO_ROWS: [DemoRow; 3] = [
    DemoRow {
        id: 1,
        name: "Alice",
        status: "active",
    },
    DemoRow {
        id: 2,
        name: "Bob",
        status: "inactive",
    },
    DemoRow {
        id: 3,
        name: "Carol",
        status: "active",
    },
];

#[derive(Serialize)]
struct UserReply<'a> {
    ok: bool,
    user: Option<&'a str>,
}

#[derive(Serialize)]
struct RowsReply<'a> {
    ok: bool,
    rows: &'a [DemoRow],
}

/// Route handlers over the authentication core.
#[derive(Debug, Clone)]
pub struct AuthHandler {
    authenticator: RequestAuthenticator,
    sessions: SessionManager,
    cookie_secure: bool,
}

impl AuthHandler {
    /// Create a handler.
    pub fn new(
        authenticator: RequestAuthenticator,
        sessions: SessionManager,
        cookie_secure: bool,
    ) -> Self {
        Self {
            authenticator,
            sessions,
            cookie_secure,
        }
    }

    /// Dispatch a resolved route.
    pub async fn dispatch(
        &self,
        route: Route,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, HttpError> {
        match route {
            Route::IssueSalt => self.issue_salt().await,
            Route::Login => self.login(&body).await,
            Route::Query => self.query(headers, &body).await,
            Route::Session => self.session(headers).await,
            Route::Logout => self.logout(headers).await,
            Route::Version => ok_json(&serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
            Route::Health => ok_json(&serde_json::json!({ "status": "running" })),
            Route::Preflight => Ok(http::Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(AuthResponseBody::default())
                .expect("valid preflight response")),
        }
    }

    async fn issue_salt(&self) -> Result<Response, HttpError> {
        let issued = self.authenticator.salts().issue().await?;
        ok_json(&issued)
    }

    async fn login(&self, body: &[u8]) -> Result<Response, HttpError> {
        let request = parse_signed(body)?.into_signed_request("POST", "/api/login")?;
        let verdict = self.authenticator.authenticate(&request).await?;

        let session_id = self.sessions.create(&verdict.username).await?;
        info!(username = %verdict.username, "login succeeded");

        let mut response = ok_json(&UserReply {
            ok: true,
            user: Some(&verdict.username),
        })?;
        set_cookie(
            &mut response,
            &session_set_cookie(session_id.as_str(), self.sessions.ttl(), self.cookie_secure),
        );
        Ok(response)
    }

    async fn query(&self, headers: &HeaderMap, body: &[u8]) -> Result<Response, HttpError> {
        let Some(raw_id) = session_cookie(headers) else {
            return Err(HttpError::NotLoggedIn);
        };
        let Some(session) = self.sessions.resolve_raw(&raw_id).await? else {
            return Err(HttpError::NotLoggedIn);
        };

        let request = parse_signed(body)?.into_signed_request("POST", "/api/query")?;
        let verdict = self.authenticator.authenticate(&request).await?;
        if verdict.username != session.username {
            return Err(HttpError::SessionMismatch);
        }

        debug!(username = %verdict.username, "query served");
        ok_json(&RowsReply {
            ok: true,
            rows: &DEMO_ROWS,
        })
    }

    async fn session(&self, headers: &HeaderMap) -> Result<Response, HttpError> {
        let session = match session_cookie(headers) {
            Some(raw_id) => self.sessions.resolve_raw(&raw_id).await?,
            None => None,
        };
        let user = session.as_ref().map(|s| s.username.as_str());
        ok_json(&UserReply {
            ok: user.is_some(),
            user,
        })
    }

    async fn logout(&self, headers: &HeaderMap) -> Result<Response, HttpError> {
        if let Some(session_id) = session_cookie(headers).and_then(|raw| SessionId::new(raw).ok())
        {
            self.sessions.destroy(&session_id).await?;
        }

        let mut response = ok_json(&serde_json::json!({ "ok": true }))?;
        set_cookie(&mut response, &session_clear_cookie(self.cookie_secure));
        Ok(response)
    }
}

fn set_cookie(response: &mut Response, cookie: &str) {
    if let Ok(hv) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(http::header::SET_COOKIE, hv);
    }
}

fn parse_signed(body: &[u8]) -> Result<SignedRequestBody, AuthError> {
    serde_json::from_slice(body)
        .map_err(|e| AuthError::InputMalformed(format!("invalid JSON body: {e}")))
}

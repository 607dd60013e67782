//! Session cookie parsing and formatting.

use std::time::Duration;

use http::HeaderMap;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Extract the session cookie value from request headers.
///
/// All `Cookie` headers are searched; the first `session_id` pair wins.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Format the `Set-Cookie` value that establishes a session.
#[must_use]
pub fn session_set_cookie(session_id: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Lax; Max-Age={}; Path=/",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Format the `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn session_clear_cookie(secure: bool) -> String {
    session_set_cookie("", Duration::ZERO, secure)
}

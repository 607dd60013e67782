//! Request router.
//!
//! The API surface is a handful of fixed paths, so routing is an exact match
//! on method and path. `OPTIONS` is accepted on every path for CORS
//! preflight.

use http::Method;

use crate::error::HttpError;

/// A resolved endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /api/salt`
    IssueSalt,
    /// `POST /api/login`
    Login,
    /// `POST /api/query`
    Query,
    /// `GET /api/session`
    Session,
    /// `POST /api/logout`
    Logout,
    /// `GET /api/version`
    Version,
    /// `GET /health`
    Health,
    /// `OPTIONS` on any path
    Preflight,
}

const ROUTES: &[(&str, Method, Route)] = &[
    ("/api/salt", Method::GET, Route::IssueSalt),
    ("/api/login", Method::POST, Route::Login),
    ("/api/query", Method::POST, Route::Query),
    ("/api/session", Method::GET, Route::Session),
    ("/api/logout", Method::POST, Route::Logout),
    ("/api/version", Method::GET, Route::Version),
    ("/health", Method::GET, Route::Health),
];

/// Resolve the route for a request.
pub fn resolve_route(method: &Method, path: &str) -> Result<Route, HttpError> {
    if *method == Method::OPTIONS {
        return Ok(Route::Preflight);
    }

    let mut path_known = false;
    for (route_path, route_method, route) in ROUTES {
        if *route_path == path {
            if route_method == method {
                return Ok(*route);
            }
            path_known = true;
        }
    }

    if path_known {
        Err(HttpError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_owned(),
        })
    } else {
        Err(HttpError::NotFound(path.to_owned()))
    }
}

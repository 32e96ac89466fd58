//! Request helpers shared by the sign-in, sign-out, and server endpoints.

use http::header::{HeaderValue, LOCATION, REFERER};
use http::request::Parts;
use http::{HeaderMap, Method, Response, StatusCode, Uri};

use crate::error::{Error, Result};

/// Query key selecting the persona to sign in as.
pub const OVERRIDE_QUERY_KEY: &str = "OverrideUserId";

/// Query key naming where to send the browser afterwards.
pub const RETURN_URL_QUERY_KEY: &str = "ReturnUrl";

/// First non-blank value of a query parameter; keys ignore ASCII case.
pub fn query_param(uri: &Uri, key: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.trim().is_empty())
}

/// Non-blank `Referer` header value.
pub fn referer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
}

/// `ReturnUrl` query parameter, else the `Referer` header.
pub fn return_url_hint(parts: &Parts) -> Option<String> {
    query_param(&parts.uri, RETURN_URL_QUERY_KEY).or_else(|| referer(&parts.headers))
}

/// Where a redirect-producing endpoint must send the browser.
pub fn resolve_return_url(parts: &Parts) -> Result<String> {
    return_url_hint(parts).ok_or(Error::MissingReturnUrl)
}

/// Request path equals `target`, ignoring ASCII case and one trailing slash.
pub fn path_matches(path: &str, target: &str) -> bool {
    let path = path.strip_suffix('/').unwrap_or(path);
    let target = target.strip_suffix('/').unwrap_or(target);
    path.eq_ignore_ascii_case(target)
}

/// Sign-in and sign-out change the session, so only GET reaches them.
pub fn is_session_method(method: &Method) -> bool {
    method == Method::GET
}

pub fn is_read_method(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

// ─────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────

/// 302 to `location`.
pub fn redirect(location: &str) -> Result<Response<String>> {
    let value = HeaderValue::try_from(location)
        .map_err(|_| Error::invalid_uri(location, "not usable as a Location header"))?;

    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, value)
        .body(String::new())
        .map_err(|e| Error::Internal(e.to_string()))
}

pub fn text(status: StatusCode, content_type: &str, body: String) -> Result<Response<String>> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|e| Error::Internal(e.to_string()))
}

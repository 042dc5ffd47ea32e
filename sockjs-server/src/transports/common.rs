//! Helpers shared by every HTTP (non-WebSocket) transport: header extraction,
//! CORS preflight, and the new/locked/expired gating every `recv` transport
//! performs identically before it touches the session queue.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::headers::{enable_cookie, enable_cors};
use crate::session::Session;

pub fn origin_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

pub fn cookie_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// A standard `OPTIONS` preflight response: 204, CORS, caching, and the
/// given `Allow` list.
pub fn preflight(headers: &HeaderMap, allow: &'static str) -> Response {
    let mut resp_headers = HeaderMap::new();
    enable_cors(&mut resp_headers, origin_of(headers).as_deref());
    enable_cookie(&mut resp_headers, cookie_of(headers).as_deref());
    super::super::http::headers::enable_caching(&mut resp_headers);
    resp_headers.insert("Allow", HeaderValue::from_static(allow));
    (StatusCode::NO_CONTENT, resp_headers).into_response()
}

/// Whether a would-be reader should be turned away before touching the
/// queue, and why.
pub enum Gate {
    /// First hit ever observed on this session: send OPEN, no workers.
    Open,
    /// Already expired: send CLOSE 3000.
    Expired,
    /// Another reader already owns the session: send CLOSE 2010.
    Locked,
    /// Clear to dequeue. The caller now owns the single-reader lock and
    /// must call `session.unlock()` when done.
    Ready,
}

/// Runs the hit counter and new/expired/locked checks common to every
/// polling and streaming transport. Leaves lock acquisition to the caller
/// via the `Ready` variant so error paths don't need to unlock anything.
pub fn gate(session: &Arc<Session>) -> Gate {
    let was_new = session.is_new();
    session.incr_hits();

    if was_new {
        return Gate::Open;
    }
    if session.is_expired() {
        return Gate::Expired;
    }
    if !session.lock() {
        return Gate::Locked;
    }
    Gate::Ready
}

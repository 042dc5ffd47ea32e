//! `xhr`: classic long polling. One request in, one batch out, connection
//! closed either way.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use sockjs_protocol::{close_frame, encode_batch, message_frame, CLOSE_ANOTHER_CONNECTION, CLOSE_GO_AWAY, OPEN_FRAME};

use crate::http::headers::{enable_cookie, enable_cors, enable_nocache};
use crate::session::Session;
use crate::transports::common::{cookie_of, gate, origin_of, preflight, Gate};

pub async fn handle(session: Arc<Session>, method: &Method, headers: &HeaderMap, poll_timeout: Duration) -> Response {
    if *method == Method::OPTIONS {
        return preflight(headers, "OPTIONS, POST");
    }

    let origin = origin_of(headers);
    let cookie = cookie_of(headers);
    let mut resp_headers = HeaderMap::new();
    enable_cors(&mut resp_headers, origin.as_deref());
    enable_cookie(&mut resp_headers, cookie.as_deref());
    enable_nocache(&mut resp_headers);

    match gate(&session) {
        Gate::Open => (StatusCode::OK, resp_headers, OPEN_FRAME).into_response(),
        Gate::Expired => {
            let (code, reason) = CLOSE_GO_AWAY;
            (StatusCode::OK, resp_headers, close_frame(code, reason, true)).into_response()
        }
        Gate::Locked => {
            let (code, reason) = CLOSE_ANOTHER_CONNECTION;
            (StatusCode::OK, resp_headers, close_frame(code, reason, true)).into_response()
        }
        Gate::Ready => {
            let batch = session.get_messages(poll_timeout).await.unwrap_or_default();
            session.unlock();
            if session.is_expired() {
                let (code, reason) = CLOSE_GO_AWAY;
                return (StatusCode::OK, resp_headers, close_frame(code, reason, true)).into_response();
            }
            let body = message_frame(&encode_batch(&batch)) + "\n";
            resp_headers.insert("Connection", "close".parse().unwrap());
            (StatusCode::OK, resp_headers, body).into_response()
        }
    }
}

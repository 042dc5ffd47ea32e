//! The three "long-lived response body" transports — `xhr_streaming`,
//! `eventsource`, `htmlfile` — share one engine: write a format-specific
//! prelude, then either an OPEN or CLOSE frame, then (if still open) poll
//! the session queue until a byte cutoff forces a reconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::StreamExt;
use sockjs_protocol::{close_frame, encode_batch, message_frame, CLOSE_ANOTHER_CONNECTION, CLOSE_GO_AWAY};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::http::headers::{enable_cookie, enable_cors, enable_nocache};
use crate::session::Session;
use crate::transports::common::{cookie_of, gate, origin_of, Gate};

const STREAM_CUTOFF_BYTES: usize = 10_240;
const PRELUDE_H_COUNT: usize = 2048;

/// The bytes-on-the-wire dialect of one streaming transport.
pub struct Framer {
    pub prelude: Vec<u8>,
    pub content_type: &'static str,
    pub wrap_open: Box<dyn Fn() -> String + Send>,
    pub wrap_message: Box<dyn Fn(&[String]) -> String + Send>,
    pub wrap_close: Box<dyn Fn(u16, &str) -> String + Send>,
}

pub fn xhr_streaming_framer() -> Framer {
    let mut prelude = "h".repeat(PRELUDE_H_COUNT).into_bytes();
    prelude.push(b'\n');
    Framer {
        prelude,
        content_type: "application/javascript; charset=UTF-8",
        wrap_open: Box::new(|| "o\n".to_owned()),
        wrap_message: Box::new(|batch| message_frame(&encode_batch(batch)) + "\n"),
        wrap_close: Box::new(|code, reason| close_frame(code, reason, true)),
    }
}

pub fn eventsource_framer() -> Framer {
    Framer {
        prelude: b"\r\n".to_vec(),
        content_type: "text/event-stream; charset=UTF-8",
        wrap_open: Box::new(|| "data: o\r\n\r\n".to_owned()),
        wrap_message: Box::new(|batch| format!("data: {}\r\n\r\n", message_frame(&encode_batch(batch)))),
        wrap_close: Box::new(|code, reason| format!("data: {}\r\n\r\n", close_frame(code, reason, false))),
    }
}

pub fn htmlfile_framer(callback: String) -> Framer {
    let head = format!(
        "<!doctype html>\n<html><head>\n<script>\n  document.domain = document.domain;\n  var c = parent.{callback};\n  function p(d) {{c.message(d);}};\n</script>\n",
    );
    let padding = " ".repeat(1024usize.saturating_sub(head.len()));
    let mut prelude = format!("{head}{padding}\n").into_bytes();
    prelude.extend_from_slice(b"</head><body>\n");
    Framer {
        prelude,
        content_type: "text/html; charset=UTF-8",
        wrap_open: Box::new(|| "<script>\np(\"o\");\n</script>\r\n".to_owned()),
        wrap_message: Box::new(|batch| {
            let json = serde_json::to_string(&message_frame(&encode_batch(batch))).expect("string always serializes");
            format!("<script>\np({json});\n</script>\r\n")
        }),
        wrap_close: Box::new(|code, reason| {
            let json = serde_json::to_string(&close_frame(code, reason, false)).expect("string always serializes");
            format!("<script>\np({json});\n</script>\r\n")
        }),
    }
}

pub fn handle(session: Arc<Session>, headers: &HeaderMap, framer: Framer, poll_timeout: Duration) -> Response {
    let origin = origin_of(headers);
    let cookie = cookie_of(headers);
    let content_type = framer.content_type;
    let (tx, rx) = mpsc::channel::<Vec<u8>>(8);

    tokio::spawn(drive(session, tx, framer, poll_timeout));

    let stream = ReceiverStream::new(rx).map(|chunk| Ok::<_, std::convert::Infallible>(Bytes::from(chunk)));
    let mut response = Response::new(Body::from_stream(stream));
    let resp_headers = response.headers_mut();
    enable_cors(resp_headers, origin.as_deref());
    enable_cookie(resp_headers, cookie.as_deref());
    enable_nocache(resp_headers);
    resp_headers.insert("Content-Type", content_type.parse().unwrap());
    response
}

async fn drive(session: Arc<Session>, tx: mpsc::Sender<Vec<u8>>, framer: Framer, poll_timeout: Duration) {
    if tx.send(framer.prelude.clone()).await.is_err() {
        return;
    }

    match gate(&session) {
        Gate::Open => {
            if tx.send((framer.wrap_open)().into_bytes()).await.is_err() {
                return;
            }
            poll_loop(session, tx, framer, poll_timeout).await;
        }
        Gate::Ready => {
            poll_loop(session, tx, framer, poll_timeout).await;
        }
        Gate::Expired => {
            let (code, reason) = CLOSE_GO_AWAY;
            let _ = tx.send((framer.wrap_close)(code, reason).into_bytes()).await;
        }
        Gate::Locked => {
            let (code, reason) = CLOSE_ANOTHER_CONNECTION;
            let _ = tx.send((framer.wrap_close)(code, reason).into_bytes()).await;
        }
    }
}

async fn poll_loop(session: Arc<Session>, tx: mpsc::Sender<Vec<u8>>, framer: Framer, poll_timeout: Duration) {
    let mut written = 0usize;
    loop {
        if session.is_expired() {
            let (code, reason) = CLOSE_GO_AWAY;
            let _ = tx.send((framer.wrap_close)(code, reason).into_bytes()).await;
            break;
        }
        let batch = session.get_messages(poll_timeout).await.unwrap_or_default();
        if session.is_expired() {
            let (code, reason) = CLOSE_GO_AWAY;
            let _ = tx.send((framer.wrap_close)(code, reason).into_bytes()).await;
            break;
        }
        let chunk = (framer.wrap_message)(&batch).into_bytes();
        written += chunk.len();
        if tx.send(chunk).await.is_err() {
            session.kill();
            break;
        }
        if written >= STREAM_CUTOFF_BYTES {
            break;
        }
    }
    session.unlock();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn session() -> Arc<Session> {
        Session::new("sid".into(), "srv".into(), Duration::from_secs(5))
    }

    /// Streaming responses only end once the session expires or the byte
    /// cutoff is hit; tests kill the session shortly after the first poll
    /// cycle so the body stream terminates quickly instead of running to
    /// the real 10KB cutoff.
    async fn kill_soon(session: Arc<Session>) {
        tokio::time::sleep(Duration::from_millis(30)).await;
        session.kill();
    }

    #[tokio::test]
    async fn xhr_streaming_opens_with_prelude_and_open_frame() {
        let s = session();
        tokio::spawn(kill_soon(s.clone()));
        let response = handle(s, &HeaderMap::new(), xhr_streaming_framer(), Duration::from_millis(10));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with(&"h".repeat(PRELUDE_H_COUNT)));
        assert!(text.contains("o\n"));
        assert!(text.contains("Go away!"));
    }

    #[tokio::test]
    async fn eventsource_wraps_messages_as_sse_data_events() {
        let s = session();
        s.incr_hits(); // simulate an already-open session
        tokio::spawn(kill_soon(s.clone()));
        let response = handle(s, &HeaderMap::new(), eventsource_framer(), Duration::from_millis(10));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("\r\n"));
        assert!(text.contains("data: a[]\r\n\r\n"));
    }

    #[tokio::test]
    async fn locked_session_emits_close_2010_and_stops() {
        let s = session();
        s.incr_hits();
        assert!(s.lock());
        let response = handle(s, &HeaderMap::new(), eventsource_framer(), Duration::from_millis(20));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Another connection still open"));
    }
}

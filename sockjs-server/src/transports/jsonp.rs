//! `jsonp` (recv) and `jsonp_send` (send): the script-tag fallback for
//! browsers that can't do cross-origin XHR at all.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use sockjs_protocol::{close_frame, decode_messages, encode_batch, message_frame, SockJsError, CLOSE_ANOTHER_CONNECTION, CLOSE_GO_AWAY};

use crate::connection::ConnectionClass;
use crate::http::headers::{enable_cookie, enable_cors, enable_nocache};
use crate::session::Session;
use crate::transports::common::{cookie_of, gate, origin_of, Gate};

fn jsonp_wrap(callback: &str, raw: &str) -> String {
    format!("{callback}({});\r\n", serde_json::to_string(raw).expect("string always serializes"))
}

pub async fn handle_poll(
    session: Arc<Session>,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
    poll_timeout: std::time::Duration,
) -> Result<Response, SockJsError> {
    let callback = query
        .get("c")
        .filter(|c| !c.is_empty())
        .ok_or(SockJsError::MissingCallback)?;

    let mut resp_headers = HeaderMap::new();
    enable_cors(&mut resp_headers, origin_of(headers).as_deref());
    enable_cookie(&mut resp_headers, cookie_of(headers).as_deref());
    enable_nocache(&mut resp_headers);
    resp_headers.insert(
        "Content-Type",
        "application/javascript; charset=UTF-8".parse().unwrap(),
    );

    let body = match gate(&session) {
        Gate::Open => jsonp_wrap(callback, "o"),
        Gate::Expired => {
            let (code, reason) = CLOSE_GO_AWAY;
            jsonp_wrap(callback, &close_frame(code, reason, false))
        }
        Gate::Locked => {
            let (code, reason) = CLOSE_ANOTHER_CONNECTION;
            jsonp_wrap(callback, &close_frame(code, reason, false))
        }
        Gate::Ready => {
            let batch = session.get_messages(poll_timeout).await.unwrap_or_default();
            session.unlock();
            if session.is_expired() {
                let (code, reason) = CLOSE_GO_AWAY;
                jsonp_wrap(callback, &close_frame(code, reason, false))
            } else {
                jsonp_wrap(callback, &message_frame(&encode_batch(&batch)))
            }
        }
    };

    Ok((StatusCode::OK, resp_headers, body).into_response())
}

pub async fn handle_send(
    session: Arc<Session>,
    connection: &Arc<dyn ConnectionClass>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, SockJsError> {
    if body.is_empty() {
        return Err(SockJsError::MissingPayload);
    }

    let is_form = headers
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    let payload: Bytes = if is_form {
        let form: HashMap<String, String> =
            serde_urlencoded::from_bytes(&body).map_err(|_| SockJsError::MissingPayload)?;
        let d = form.get("d").cloned().ok_or(SockJsError::MissingPayload)?;
        Bytes::from(d.into_bytes())
    } else {
        body
    };

    if payload.is_empty() {
        return Err(SockJsError::MissingPayload);
    }

    let messages = decode_messages(&payload)?;
    for msg in &messages {
        connection.on_message(&session, msg);
    }
    session.incr_hits();

    let mut resp_headers = HeaderMap::new();
    enable_cors(&mut resp_headers, origin_of(headers).as_deref());
    enable_cookie(&mut resp_headers, cookie_of(headers).as_deref());
    resp_headers.insert("Content-Type", "text/plain; charset=UTF-8".parse().unwrap());
    Ok((StatusCode::OK, resp_headers, "ok").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::EchoConnection;
    use axum::body::to_bytes;
    use std::time::Duration;

    async fn body_of(response: Response) -> String {
        String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap()
    }

    fn session() -> Arc<Session> {
        Session::new("sid".into(), "srv".into(), Duration::from_secs(5))
    }

    fn query(callback: &str) -> HashMap<String, String> {
        let mut q = HashMap::new();
        q.insert("c".to_owned(), callback.to_owned());
        q
    }

    #[tokio::test]
    async fn missing_callback_is_rejected() {
        let s = session();
        let err = handle_poll(s, &HashMap::new(), &HeaderMap::new(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SockJsError::MissingCallback));
    }

    #[tokio::test]
    async fn first_poll_wraps_open_marker() {
        let s = session();
        let response = handle_poll(s, &query("cb"), &HeaderMap::new(), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(body_of(response).await, "cb(\"o\");\r\n");
    }

    #[tokio::test]
    async fn message_poll_wraps_message_frame() {
        let s = session();
        handle_poll(s.clone(), &query("cb"), &HeaderMap::new(), Duration::from_millis(20))
            .await
            .unwrap();
        s.add_message("hi");
        let response = handle_poll(s, &query("cb"), &HeaderMap::new(), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(body_of(response).await, "cb(\"a[\\\"hi\\\"]\");\r\n");
    }

    #[tokio::test]
    async fn session_killed_mid_poll_returns_close_3000_not_empty_batch() {
        let s = session();
        handle_poll(s.clone(), &query("cb"), &HeaderMap::new(), Duration::from_millis(20))
            .await
            .unwrap();
        let killer = s.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            killer.kill();
        });
        let response = handle_poll(s, &query("cb"), &HeaderMap::new(), Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(
            body_of(response).await,
            "cb(\"c[3000,\\\"Go away!\\\"]\");\r\n"
        );
    }

    #[tokio::test]
    async fn send_with_raw_json_body_dispatches_messages() {
        let s = session();
        let conn: Arc<dyn ConnectionClass> = Arc::new(EchoConnection);
        let response = handle_send(
            s.clone(),
            &conn,
            &HeaderMap::new(),
            Bytes::from_static(br#"["hello"]"#),
        )
        .await
        .unwrap();
        assert_eq!(body_of(response).await, "ok");
        let batch = s.get_messages(Duration::from_millis(10)).await.unwrap();
        assert_eq!(batch, vec!["hello".to_owned()]);
    }

    #[tokio::test]
    async fn send_with_urlencoded_form_body_dispatches_messages() {
        let s = session();
        let conn: Arc<dyn ConnectionClass> = Arc::new(EchoConnection);
        let mut headers = HeaderMap::new();
        headers.insert(
            "Content-Type",
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        let response = handle_send(
            s.clone(),
            &conn,
            &headers,
            Bytes::from_static(b"d=%5B%22hello%22%5D"),
        )
        .await
        .unwrap();
        assert_eq!(body_of(response).await, "ok");
        let batch = s.get_messages(Duration::from_millis(10)).await.unwrap();
        assert_eq!(batch, vec!["hello".to_owned()]);
    }

    #[tokio::test]
    async fn send_with_empty_body_is_rejected() {
        let s = session();
        let conn: Arc<dyn ConnectionClass> = Arc::new(EchoConnection);
        let err = handle_send(s, &conn, &HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SockJsError::MissingPayload));
    }
}

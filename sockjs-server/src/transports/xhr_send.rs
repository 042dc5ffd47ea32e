//! `xhr_send`: the producer half of XHR polling. Delivers decoded messages
//! to the application and acknowledges with an empty `204`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use sockjs_protocol::{decode_messages, SockJsError};

use crate::connection::ConnectionClass;
use crate::http::headers::{enable_cookie, enable_cors};
use crate::session::Session;
use crate::transports::common::{cookie_of, origin_of, preflight};

pub async fn handle(
    session: Arc<Session>,
    connection: &Arc<dyn ConnectionClass>,
    method: &Method,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, SockJsError> {
    if *method == Method::OPTIONS {
        return Ok(preflight(headers, "OPTIONS, POST"));
    }

    if body.is_empty() {
        return Err(SockJsError::MissingPayload);
    }

    let messages = decode_messages(&body)?;
    for msg in &messages {
        connection.on_message(&session, msg);
    }
    session.incr_hits();

    let mut resp_headers = HeaderMap::new();
    enable_cors(&mut resp_headers, origin_of(headers).as_deref());
    enable_cookie(&mut resp_headers, cookie_of(headers).as_deref());
    resp_headers.insert("Content-Type", "text/plain; charset=UTF-8".parse().unwrap());
    Ok((StatusCode::NO_CONTENT, resp_headers).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::EchoConnection;
    use std::time::Duration;

    fn session() -> Arc<Session> {
        Session::new("sid".into(), "srv".into(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let s = session();
        let conn: Arc<dyn ConnectionClass> = Arc::new(EchoConnection);
        let err = handle(s, &conn, &Method::POST, &HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SockJsError::MissingPayload));
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let s = session();
        let conn: Arc<dyn ConnectionClass> = Arc::new(EchoConnection);
        let err = handle(
            s,
            &conn,
            &Method::POST,
            &HeaderMap::new(),
            Bytes::from_static(b"not-json"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SockJsError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn valid_messages_are_delivered_and_return_204() {
        let s = session();
        let conn: Arc<dyn ConnectionClass> = Arc::new(EchoConnection);
        let response = handle(
            s.clone(),
            &conn,
            &Method::POST,
            &HeaderMap::new(),
            Bytes::from_static(br#"["hello"]"#),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let batch = s.get_messages(Duration::from_millis(10)).await.unwrap();
        assert_eq!(batch, vec!["hello".to_owned()]);
    }
}

//! Per-transport state machines. `websocket` and `rawwebsocket` are driven
//! directly from the HTTP layer (they need the raw upgrade), everything
//! else is dispatched uniformly from [`dispatch`].

pub mod common;
pub mod jsonp;
pub mod raw_websocket;
pub mod streaming;
pub mod websocket;
pub mod xhr;
pub mod xhr_send;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use sockjs_protocol::SockJsError;

use crate::connection::TransportKind;
use crate::router::Downlink;

const POLL_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs the HTTP-bodied half of the transport table (everything but the two
/// WebSocket variants, which the caller upgrades before reaching here).
pub async fn dispatch(
    downlink: Downlink,
    method: &Method,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    body: Bytes,
) -> Result<Response, SockJsError> {
    let Downlink {
        transport,
        session,
        connection,
        ..
    } = downlink;

    match transport {
        TransportKind::Xhr => Ok(xhr::handle(session, method, headers, POLL_TIMEOUT).await),
        TransportKind::XhrSend => xhr_send::handle(session, &connection, method, headers, body).await,
        TransportKind::XhrStreaming => Ok(streaming::handle(
            session,
            headers,
            streaming::xhr_streaming_framer(),
            POLL_TIMEOUT,
        )),
        TransportKind::EventSource => Ok(streaming::handle(
            session,
            headers,
            streaming::eventsource_framer(),
            POLL_TIMEOUT,
        )),
        TransportKind::HtmlFile => {
            let callback = query
                .get("c")
                .filter(|c| !c.is_empty())
                .ok_or(SockJsError::MissingCallback)?
                .clone();
            Ok(streaming::handle(
                session,
                headers,
                streaming::htmlfile_framer(callback),
                POLL_TIMEOUT,
            ))
        }
        TransportKind::Jsonp => jsonp::handle_poll(session, query, headers, POLL_TIMEOUT).await,
        TransportKind::JsonpSend => jsonp::handle_send(session, &connection, headers, body).await,
        TransportKind::Iframe | TransportKind::WebSocket | TransportKind::RawWebSocket => Err(
            SockJsError::NotFound("transport not reachable via dynamic dispatch".into()),
        ),
    }
}

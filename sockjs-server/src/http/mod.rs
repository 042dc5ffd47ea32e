//! Single fallback handler: classifies every inbound path and dispatches to
//! the static endpoints, the per-transport HTTP handlers, or a manual
//! WebSocket upgrade. axum's typed `WebSocketUpgrade` extractor can't be used
//! on a fixed-signature handler here, since whether a path upgrades at all
//! depends on the `transport` segment the URL classifier parses out — so this
//! handler takes the raw `Request` and drives the extraction itself.

pub mod headers;
pub mod response;
pub mod static_handlers;
pub mod url;

use std::collections::HashMap;

use axum::body::to_bytes;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use sockjs_protocol::SockJsError;
use uuid::Uuid;

use crate::connection::TransportKind;
use crate::http::response::ErrorResponse;
use crate::http::url::{classify, ParsedPath};
use crate::router::StaticEndpoint;
use crate::session::Session;
use crate::state::AppState;
use crate::transports;

/// The SockJS client bundle the iframe transport bootstraps against. Every
/// route's iframe shell points at the same build — this isn't a per-route
/// setting, so it isn't part of `ServerConfig`.
const CLIENT_URL: &str = "https://cdn.jsdelivr.net/npm/sockjs-client@1/dist/sockjs.min.js";

pub fn build_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .fallback(handle_request)
        .with_state(state)
}

async fn handle_request(State(state): State<AppState>, req: Request) -> Response {
    let (mut parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();
    let trace = state.config.trace;

    match classify(&path) {
        ParsedPath::RawWs(m) => {
            let connection = match state.router.connection_for(&m.route) {
                Ok(c) => c,
                Err(err) => return error(err, trace),
            };
            if !connection.allows("rawwebsocket") {
                return error(
                    SockJsError::NotFound("rawwebsocket not allowed on this route".into()),
                    trace,
                );
            }
            let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
                Ok(upgrade) => upgrade,
                Err(rejection) => return rejection.into_response(),
            };
            let session = Session::new(
                Uuid::new_v4().to_string(),
                "rawwebsocket".to_owned(),
                state.router.pool().ttl(),
            );
            state.router.register_raw_session(session.clone(), &connection);
            upgrade.on_upgrade(move |socket| {
                transports::raw_websocket::handle(socket, session, connection)
            })
        }

        ParsedPath::Dynamic(m) => {
            let downlink = match state.router.route_dynamic(
                &m.route,
                &m.session_id,
                &m.server_id,
                &m.transport,
            ) {
                Ok(d) => d,
                Err(err) => return error(err, trace),
            };

            if downlink.transport == TransportKind::WebSocket {
                let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await
                {
                    Ok(upgrade) => upgrade,
                    Err(rejection) => return rejection.into_response(),
                };
                let session = downlink.session;
                let connection = downlink.connection;
                return upgrade.on_upgrade(move |socket| {
                    transports::websocket::handle(socket, session, connection)
                });
            }

            let query = parse_query(parts.uri.query());
            let body = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(_) => return error(SockJsError::MissingPayload, trace),
            };

            match transports::dispatch(downlink, &parts.method, &parts.headers, &query, body).await
            {
                Ok(response) => response,
                Err(err) => error(err, trace),
            }
        }

        ParsedPath::Static(m) => {
            let (connection, endpoint) =
                match state.router.route_static(&m.route, m.suffix.as_deref()) {
                    Ok(pair) => pair,
                    Err(err) => return error(err, trace),
                };
            match endpoint {
                StaticEndpoint::Greeting => {
                    if parts.method == Method::GET {
                        static_handlers::greeting()
                    } else {
                        error(SockJsError::MethodNotAllowed("GET"), trace)
                    }
                }
                StaticEndpoint::Info => {
                    let origin = header_str(&parts.headers, "Origin");
                    static_handlers::info(&parts.method, &connection, origin)
                }
                StaticEndpoint::IFrame => {
                    let if_none_match = header_str(&parts.headers, "If-None-Match");
                    match static_handlers::iframe(&parts.method, CLIENT_URL, if_none_match) {
                        Ok(response) => response,
                        Err(err) => error(err, trace),
                    }
                }
            }
        }

        ParsedPath::NoMatch => error(SockJsError::NotFound(path), trace),
    }
}

fn error(err: SockJsError, trace: bool) -> Response {
    ErrorResponse { error: err, trace }.into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default()
}

//! The three non-session endpoints every route exposes: the plain-text
//! greeting, the `info` capability probe, and the cacheable iframe shell.

use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use rand::Rng;
use serde::Serialize;
use sockjs_protocol::{render_iframe_html, SockJsError, IFRAME_MD5};

use crate::connection::ConnectionClass;
use crate::http::headers::{enable_caching, enable_cors, enable_nocache};

const GREETING_BODY: &str = "Welcome to SockJS!\n";

pub fn greeting() -> Response {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=UTF-8")],
        GREETING_BODY,
    )
        .into_response()
}

#[derive(Serialize)]
struct InfoBody {
    cookie_needed: bool,
    websocket: bool,
    origins: Vec<&'static str>,
    entropy: u32,
    route: &'static str,
}

pub fn info(method: &Method, connection: &Arc<dyn ConnectionClass>, origin: Option<&str>) -> Response {
    if method == Method::OPTIONS {
        let mut headers = HeaderMap::new();
        enable_cors(&mut headers, origin);
        headers.insert("Allow", "OPTIONS, GET".parse().unwrap());
        enable_caching(&mut headers);
        return (StatusCode::NO_CONTENT, headers).into_response();
    }

    let body = InfoBody {
        cookie_needed: true,
        websocket: connection.allows("websocket"),
        origins: vec!["*:*"],
        entropy: rand::thread_rng().gen_range(1..=u32::MAX),
        route: connection.name(),
    };

    let mut headers = HeaderMap::new();
    enable_cors(&mut headers, origin);
    enable_nocache(&mut headers);
    headers.insert(
        "Content-Type",
        "application/json; charset=UTF-8".parse().unwrap(),
    );
    (StatusCode::OK, headers, serde_json::to_string(&body).unwrap()).into_response()
}

pub fn iframe(method: &Method, client_url: &str, if_none_match: Option<&str>) -> Result<Response, SockJsError> {
    if method != Method::GET {
        return Err(SockJsError::MethodNotAllowed("GET"));
    }

    if if_none_match == Some(IFRAME_MD5.as_str()) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let mut headers = HeaderMap::new();
    enable_caching(&mut headers);
    headers.insert("ETag", IFRAME_MD5.parse().unwrap());
    headers.insert("Content-Type", "text/html; charset=UTF-8".parse().unwrap());
    Ok((StatusCode::OK, headers, render_iframe_html(client_url)).into_response())
}

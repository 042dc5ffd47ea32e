//! The three anchored URL shapes the SockJS wire contract defines, and the
//! classifier that picks one of them for a given path.

use std::sync::LazyLock;

use regex::Regex;

static DYNAMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?P<route>[^/]+)/(?P<server_id>[^/.]+)/(?P<session_id>[^/.]+)/(?P<transport>[^/.]+)$")
        .expect("valid regex")
});

static STATIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?P<route>[^/]+)(/)?(?P<suffix>[^/]+)?$").expect("valid regex")
});

static RAW_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?P<route>[^/]+)/websocket$").expect("valid regex"));

static SESSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^.]*$").expect("valid regex"));

pub struct DynamicMatch {
    pub route: String,
    pub server_id: String,
    pub session_id: String,
    pub transport: String,
}

pub struct StaticMatch {
    pub route: String,
    pub suffix: Option<String>,
}

pub struct RawWsMatch {
    pub route: String,
}

/// The outcome of classifying a request path against the three shapes, in
/// the order the wire contract demands: raw WS, then dynamic, then static.
pub enum ParsedPath {
    RawWs(RawWsMatch),
    Dynamic(DynamicMatch),
    Static(StaticMatch),
    NoMatch,
}

pub fn classify(path: &str) -> ParsedPath {
    if let Some(caps) = RAW_WS.captures(path) {
        return ParsedPath::RawWs(RawWsMatch {
            route: caps["route"].to_owned(),
        });
    }
    if let Some(caps) = DYNAMIC.captures(path) {
        let session_id = caps["session_id"].to_owned();
        if SESSION_ID.is_match(&session_id) {
            return ParsedPath::Dynamic(DynamicMatch {
                route: caps["route"].to_owned(),
                server_id: caps["server_id"].to_owned(),
                session_id,
                transport: caps["transport"].to_owned(),
            });
        }
    }
    if let Some(caps) = STATIC.captures(path) {
        return ParsedPath::Static(StaticMatch {
            route: caps["route"].to_owned(),
            suffix: caps.name("suffix").map(|m| m.as_str().to_owned()),
        });
    }
    ParsedPath::NoMatch
}

//! The application-facing contract (`ConnectionClass`) and the closed set
//! of transports a [`crate::router::Router`] can dispatch to.

use std::sync::Arc;

use sockjs_protocol::SockJsError;

use crate::session::Session;

/// User-defined handler bound to a route prefix. The framework calls
/// `on_open` exactly once per session, `on_message` any number of times
/// (never concurrently for the same session), and `on_close` exactly once.
pub trait ConnectionClass: Send + Sync {
    /// Name surfaced in the `info` endpoint response.
    fn name(&self) -> &'static str;

    /// Transport names this route refuses to serve (e.g. `["websocket"]`).
    fn disallowed_transports(&self) -> &'static [&'static str] {
        &[]
    }

    fn on_open(&self, _session: &Arc<Session>) {}

    fn on_message(&self, session: &Arc<Session>, msg: &str);

    fn on_close(&self, _session: &Arc<Session>) {}

    fn on_error(&self, _err: &SockJsError) {}
}

impl dyn ConnectionClass {
    pub fn allows(&self, transport: &str) -> bool {
        !self.disallowed_transports().contains(&transport)
    }
}

/// Which side of a session a transport drives: the consumer dequeuing
/// messages (`Recv`), the producer delivering them (`Send`), or both over a
/// single socket (`Bi`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
    Bi,
}

impl Direction {
    /// Whether a session may be created for a request using this direction
    /// if one doesn't already exist.
    pub fn create_if_null(self) -> bool {
        matches!(self, Direction::Recv | Direction::Bi)
    }
}

/// The closed set of SockJS transports, per the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Xhr,
    XhrSend,
    XhrStreaming,
    Jsonp,
    JsonpSend,
    EventSource,
    HtmlFile,
    Iframe,
    WebSocket,
    RawWebSocket,
}

impl TransportKind {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "xhr" => TransportKind::Xhr,
            "xhr_send" => TransportKind::XhrSend,
            "xhr_streaming" => TransportKind::XhrStreaming,
            "jsonp" => TransportKind::Jsonp,
            "jsonp_send" => TransportKind::JsonpSend,
            "eventsource" => TransportKind::EventSource,
            "htmlfile" => TransportKind::HtmlFile,
            "iframe" => TransportKind::Iframe,
            "websocket" => TransportKind::WebSocket,
            "rawwebsocket" => TransportKind::RawWebSocket,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            TransportKind::Xhr => "xhr",
            TransportKind::XhrSend => "xhr_send",
            TransportKind::XhrStreaming => "xhr_streaming",
            TransportKind::Jsonp => "jsonp",
            TransportKind::JsonpSend => "jsonp_send",
            TransportKind::EventSource => "eventsource",
            TransportKind::HtmlFile => "htmlfile",
            TransportKind::Iframe => "iframe",
            TransportKind::WebSocket => "websocket",
            TransportKind::RawWebSocket => "rawwebsocket",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            TransportKind::Xhr
            | TransportKind::XhrStreaming
            | TransportKind::Jsonp
            | TransportKind::EventSource
            | TransportKind::HtmlFile
            | TransportKind::Iframe => Direction::Recv,
            TransportKind::XhrSend | TransportKind::JsonpSend => Direction::Send,
            TransportKind::WebSocket | TransportKind::RawWebSocket => Direction::Bi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_transport_name() {
        for name in [
            "xhr",
            "xhr_send",
            "xhr_streaming",
            "jsonp",
            "jsonp_send",
            "eventsource",
            "htmlfile",
            "iframe",
            "websocket",
            "rawwebsocket",
        ] {
            let kind = TransportKind::parse(name).expect("known transport name");
            assert_eq!(kind.name(), name);
        }
    }

    #[test]
    fn parse_rejects_unknown_transport() {
        assert!(TransportKind::parse("carrier-pigeon").is_none());
    }

    #[test]
    fn directions_match_the_canonical_table() {
        assert_eq!(TransportKind::Xhr.direction(), Direction::Recv);
        assert_eq!(TransportKind::XhrSend.direction(), Direction::Send);
        assert_eq!(TransportKind::WebSocket.direction(), Direction::Bi);
        assert_eq!(TransportKind::EventSource.direction(), Direction::Recv);
        assert_eq!(TransportKind::Iframe.direction(), Direction::Recv);
    }

    #[test]
    fn create_if_null_excludes_send_only_transports() {
        assert!(!Direction::Send.create_if_null());
        assert!(Direction::Recv.create_if_null());
        assert!(Direction::Bi.create_if_null());
    }
}

//! Minimal `ConnectionClass` implementations used by `main` and the
//! integration tests to exercise the router/transport/session stack without
//! pulling in any real application logic.

use std::sync::Arc;

use crate::connection::ConnectionClass;
use crate::session::Session;

/// Echoes every inbound message straight back to the sender.
pub struct EchoConnection;

impl ConnectionClass for EchoConnection {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn on_message(&self, session: &Arc<Session>, msg: &str) {
        session.send(msg);
    }
}

/// Closes the session the instant it opens — used to exercise the
/// CLOSE-on-open path the SockJS test suite expects.
pub struct CloseConnection;

impl ConnectionClass for CloseConnection {
    fn name(&self) -> &'static str {
        "close"
    }

    fn on_open(&self, session: &Arc<Session>) {
        session.close();
    }

    fn on_message(&self, _session: &Arc<Session>, _msg: &str) {}
}

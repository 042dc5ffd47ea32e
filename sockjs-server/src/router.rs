//! Route table and request classifier: turns `(route, session_id, transport)`
//! into a live [`Session`] plus the [`ConnectionClass`] that owns it, or a
//! static endpoint bound to that same class.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use sockjs_protocol::SockJsError;
use tracing::info;

use crate::connection::{ConnectionClass, TransportKind};
use crate::pool::SessionPool;
use crate::session::Session;

static IFRAME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^iframe[0-9-.a-z_]*\.html$").expect("valid regex"));

/// A static (non-session) endpoint resolved under a route prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaticEndpoint {
    Greeting,
    Info,
    IFrame,
}

/// The resolved target of a dynamic (session-bearing) request: everything a
/// transport needs to run its state machine.
pub struct Downlink {
    pub transport: TransportKind,
    pub session: Arc<Session>,
    pub connection: Arc<dyn ConnectionClass>,
    pub is_new: bool,
}

pub struct Router {
    routes: HashMap<String, Arc<dyn ConnectionClass>>,
    pool: Arc<SessionPool>,
}

impl Router {
    pub fn new(pool: Arc<SessionPool>) -> Self {
        Self {
            routes: HashMap::new(),
            pool,
        }
    }

    pub fn add_route(&mut self, prefix: impl Into<String>, connection: Arc<dyn ConnectionClass>) {
        self.routes.insert(prefix.into(), connection);
    }

    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }

    /// Looks up the `ConnectionClass` bound to a route prefix, with no
    /// session or transport involved — used by the raw-WebSocket path,
    /// which has its own URL shape.
    pub fn connection_for(&self, route: &str) -> Result<Arc<dyn ConnectionClass>, SockJsError> {
        self.resolve(route)
    }

    fn resolve(&self, route: &str) -> Result<Arc<dyn ConnectionClass>, SockJsError> {
        self.routes
            .get(route)
            .cloned()
            .ok_or_else(|| SockJsError::NotFound(format!("no such route: {route}")))
    }

    /// Same lookup as `resolve`, but for the dynamic (session-bearing) path,
    /// where a missing route is an unhandled-case failure on the server's
    /// part rather than a client-facing 404 — the static path's lookup is a
    /// legitimate "page not found", this one is the request reaching a route
    /// the server never registered a handler for.
    fn resolve_dynamic(&self, route: &str) -> Result<Arc<dyn ConnectionClass>, SockJsError> {
        self.routes
            .get(route)
            .cloned()
            .ok_or_else(|| SockJsError::internal_msg(format!("no such route: {route}")))
    }

    /// Resolve a static (suffix-based) endpoint under `route`.
    pub fn route_static(
        &self,
        route: &str,
        suffix: Option<&str>,
    ) -> Result<(Arc<dyn ConnectionClass>, StaticEndpoint), SockJsError> {
        let connection = self.resolve(route)?;
        let endpoint = match suffix {
            None | Some("") => StaticEndpoint::Greeting,
            Some("info") => StaticEndpoint::Info,
            Some(s) if IFRAME_SUFFIX.is_match(s) => StaticEndpoint::IFrame,
            Some(other) => {
                return Err(SockJsError::NotFound(format!(
                    "no such static endpoint: {other}"
                )))
            }
        };
        Ok((connection, endpoint))
    }

    /// Resolve a dynamic (session-bearing) request. If this call creates the
    /// session, fires `on_open` and arranges for `on_close` to run once the
    /// session dies.
    pub fn route_dynamic(
        &self,
        route: &str,
        session_id: &str,
        server_id: &str,
        transport: &str,
    ) -> Result<Downlink, SockJsError> {
        let connection = self.resolve_dynamic(route)?;
        let transport = TransportKind::parse(transport)
            .ok_or_else(|| SockJsError::NotFound(format!("no such transport: {transport}")))?;
        if !connection.allows(transport.name()) {
            return Err(SockJsError::NotFound(format!(
                "transport not allowed by route: {}",
                transport.name()
            )));
        }

        let direction = transport.direction();
        let (session, is_new) = if direction.create_if_null() {
            self.pool.get_or_create(session_id, server_id)
        } else {
            let session = self
                .pool
                .get(session_id)
                .ok_or_else(|| SockJsError::NotFound("no such session".to_owned()))?;
            (session, false)
        };

        if is_new {
            connection.on_open(&session);
            self.spawn_close_watcher(connection.clone(), session.clone());
        }

        Ok(Downlink {
            transport,
            session,
            connection,
            is_new,
        })
    }

    /// Registers a freshly-created raw-WebSocket session directly, bypassing
    /// the dynamic URL lookup (raw WS sessions are one-shot and have no
    /// server_id/session_id from the URL).
    pub fn register_raw_session(&self, session: Arc<Session>, connection: &Arc<dyn ConnectionClass>) {
        self.pool.add(session.clone());
        connection.on_open(&session);
        self.spawn_close_watcher(connection.clone(), session);
    }

    fn spawn_close_watcher(&self, connection: Arc<dyn ConnectionClass>, session: Arc<Session>) {
        tokio::spawn(async move {
            session.wait_for_close().await;
            info!(session_id = %session.session_id(), "session closed");
            connection.on_close(&session);
        });
    }
}

//! Registry and garbage collector for live [`Session`]s.
//!
//! The expected pool size for a single-process SockJS endpoint is small, so
//! unlike the heap-based re-tagging scheme sketched for very large pools,
//! this collects with a single lock-and-scan sweep: see `DESIGN.md` for the
//! tradeoff.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::info;

use crate::session::Session;

pub struct SessionPool {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    ttl: Duration,
    gc_cycle: Duration,
    gc_started: AtomicBool,
}

impl SessionPool {
    pub fn new(ttl: Duration, gc_cycle: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            gc_cycle,
            gc_started: AtomicBool::new(false),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn add(&self, session: Arc<Session>) {
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .insert(session.session_id().to_owned(), session);
    }

    /// Returns the session if present and not expired.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .get(id)
            .filter(|s| !s.is_expired())
            .cloned()
    }

    /// Returns the existing session for `id` — live or already expired — or
    /// creates and registers a fresh one if none exists yet. An expired
    /// entry is returned as-is rather than replaced, so a reader that hits
    /// a dead session id still gets turned away with CLOSE 3000 instead of
    /// silently reopening it; GC is the only thing that removes it from the
    /// registry. The `bool` is `true` iff this call created the session —
    /// callers must use it (not `Session::is_new`) to decide whether to fire
    /// `on_open`, since it is resolved atomically under the registry lock
    /// and so can't race with a concurrent request for the same id.
    pub fn get_or_create(&self, id: &str, server_id: &str) -> (Arc<Session>, bool) {
        let mut sessions = self.sessions.lock().expect("sessions mutex poisoned");
        if let Some(existing) = sessions.get(id) {
            return (existing.clone(), false);
        }
        let session = Session::new(id.to_owned(), server_id.to_owned(), self.ttl);
        sessions.insert(id.to_owned(), session.clone());
        info!(session_id = %id, "session created");
        (session, true)
    }

    pub fn remove(&self, id: &str) {
        self.sessions.lock().expect("sessions mutex poisoned").remove(id);
    }

    /// Spawns the background sweeper. Calling this more than once is a
    /// no-op — only the first call wins.
    pub fn start_gc(self: &Arc<Self>) {
        if self.gc_started.swap(true, Ordering::AcqRel) {
            return;
        }
        let pool = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(pool.gc_cycle);
            loop {
                interval.tick().await;
                pool.gc();
            }
        });
    }

    /// One sweep: drop any session that is already expired, or that has
    /// gone past its `expires_at` and isn't pinned `forever`.
    pub fn gc(&self) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().expect("sessions mutex poisoned");
        sessions.retain(|id, session| {
            if session.is_expired() {
                info!(session_id = %id, "session reaped (already expired)");
                return false;
            }
            if !session.is_forever() && session.expires_at() < now {
                session.kill();
                info!(session_id = %id, "session reaped (ttl elapsed)");
                return false;
            }
            true
        });
    }

    /// Marks every live session expired and drains the registry. Called
    /// once, from the shutdown path.
    pub fn shutdown(&self) {
        let mut sessions = self.sessions.lock().expect("sessions mutex poisoned");
        for (_, session) in sessions.drain() {
            session.kill();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("sessions mutex poisoned").len()
    }
}

//! The per-session message buffer: the one piece of state every transport
//! reads and writes regardless of which HTTP transport carries a given hit.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

/// Raised by [`Session::get_messages`] when no message arrives before the
/// deadline.
#[derive(Debug)]
pub struct Empty;

struct Timing {
    expires_at: Instant,
    forever: bool,
}

/// A transport-agnostic, durable message channel for one client identity.
///
/// A `Session` knows nothing about HTTP, transports, or the connection class
/// using it — it only tracks a FIFO queue, a handful of lifecycle flags, and
/// a sliding expiry. Transports attach to it, application code calls
/// [`Session::send`] on it; neither side holds a reference back to the pool
/// or router that created it.
pub struct Session {
    session_id: String,
    server_id: String,
    ttl: Duration,
    queue: Mutex<VecDeque<String>>,
    msg_notify: Notify,
    close_notify: Notify,
    timing: Mutex<Timing>,
    hits: AtomicU64,
    heartbeats: AtomicU64,
    connected: AtomicBool,
    expired: AtomicBool,
    interrupted: AtomicBool,
    locked: AtomicBool,
    network_error: AtomicBool,
}

impl Session {
    pub fn new(session_id: String, server_id: String, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            server_id,
            ttl,
            queue: Mutex::new(VecDeque::new()),
            msg_notify: Notify::new(),
            close_notify: Notify::new(),
            timing: Mutex::new(Timing {
                expires_at: Instant::now() + ttl,
                forever: false,
            }),
            hits: AtomicU64::new(0),
            heartbeats: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
            locked: AtomicBool::new(false),
            network_error: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// True exactly until the first accepted dequeue request.
    pub fn is_new(&self) -> bool {
        self.hits.load(Ordering::Acquire) == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Acquire)
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats.load(Ordering::Acquire)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    pub fn is_forever(&self) -> bool {
        self.timing.lock().expect("timing mutex poisoned").forever
    }

    pub fn set_network_error(&self) {
        self.network_error.store(true, Ordering::Release);
    }

    pub fn expires_at(&self) -> Instant {
        self.timing.lock().expect("timing mutex poisoned").expires_at
    }

    /// Non-blocking enqueue. Producers do not extend the session's lifetime
    /// by sending — only hits and heartbeats do that.
    pub fn add_message(&self, msg: impl Into<String>) {
        self.queue
            .lock()
            .expect("queue mutex poisoned")
            .push_back(msg.into());
        self.msg_notify.notify_waiters();
    }

    /// Application-facing alias for [`Session::add_message`].
    pub fn send(&self, msg: impl Into<String>) {
        self.add_message(msg);
    }

    /// Block up to `timeout`. If the queue is already non-empty, drain and
    /// return everything available right away. Otherwise wait for exactly
    /// one message to arrive and return a single-element batch.
    pub async fn get_messages(&self, timeout: Duration) -> Result<Vec<String>, Empty> {
        if let Some(batch) = self.drain() {
            return Ok(batch);
        }
        match tokio::time::timeout(timeout, self.wait_for_one()).await {
            Ok(msg) => Ok(vec![msg]),
            Err(_) => Err(Empty),
        }
    }

    fn drain(&self) -> Option<Vec<String>> {
        let mut queue = self.queue.lock().expect("queue mutex poisoned");
        if queue.is_empty() {
            None
        } else {
            Some(queue.drain(..).collect())
        }
    }

    async fn wait_for_one(&self) -> String {
        loop {
            let notified = self.msg_notify.notified();
            {
                let mut queue = self.queue.lock().expect("queue mutex poisoned");
                if let Some(msg) = queue.pop_front() {
                    return msg;
                }
            }
            notified.await;
        }
    }

    pub fn incr_hits(&self) -> u64 {
        self.connected.store(true, Ordering::Release);
        self.clear_disconnect_timeout();
        self.hits.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn heartbeat(&self) -> u64 {
        self.clear_disconnect_timeout();
        self.heartbeats.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Slide `expires_at` forward by `extension` (default: the session's
    /// configured ttl), or mark the session as never expiring.
    pub fn persist(&self, extension: Option<Duration>, forever: bool) {
        let mut timing = self.timing.lock().expect("timing mutex poisoned");
        timing.forever = forever;
        if forever {
            return;
        }
        timing.expires_at = Instant::now() + extension.unwrap_or(self.ttl);
    }

    fn clear_disconnect_timeout(&self) {
        self.persist(None, false);
    }

    /// Client-initiated close: sets `interrupted`, then kills.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
        self.kill();
    }

    /// Application-facing alias for [`Session::interrupt`].
    pub fn close(&self) {
        self.interrupt();
    }

    /// Marks the session dead and wakes every waiter (queue readers and the
    /// close watcher) exactly once. Idempotent.
    pub fn kill(&self) {
        self.connected.store(false, Ordering::Release);
        if self
            .expired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.close_notify.notify_waiters();
            self.msg_notify.notify_waiters();
        }
    }

    /// Resolves once, after [`Session::kill`] has run. Used by the router to
    /// invoke `on_close` exactly once per session.
    pub async fn wait_for_close(&self) {
        if self.is_expired() {
            return;
        }
        self.close_notify.notified().await;
    }

    /// Atomic test-and-set; never blocks. Returns `true` if this caller now
    /// owns the single reader slot.
    pub fn lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Arc<Session> {
        Session::new("sid".into(), "srv".into(), Duration::from_secs(5))
    }

    #[test]
    fn new_session_has_no_hits_and_is_new() {
        let s = session();
        assert!(s.is_new());
        assert_eq!(s.hits(), 0);
    }

    #[test]
    fn incr_hits_clears_is_new_and_marks_connected() {
        let s = session();
        s.incr_hits();
        assert!(!s.is_new());
        assert!(s.is_connected());
        assert_eq!(s.hits(), 1);
    }

    #[tokio::test]
    async fn get_messages_drains_all_available_without_waiting() {
        let s = session();
        s.add_message("a");
        s.add_message("b");
        let batch = s.get_messages(Duration::from_millis(50)).await.unwrap();
        assert_eq!(batch, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[tokio::test]
    async fn get_messages_times_out_on_empty_queue() {
        let s = session();
        let result = s.get_messages(Duration::from_millis(20)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn get_messages_wakes_on_single_late_message() {
        let s = session();
        let waiter = tokio::spawn({
            let s = s.clone();
            async move { s.get_messages(Duration::from_secs(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        s.add_message("late");
        let batch = waiter.await.unwrap().unwrap();
        assert_eq!(batch, vec!["late".to_owned()]);
    }

    #[test]
    fn lock_is_single_reader_and_non_blocking() {
        let s = session();
        assert!(s.lock());
        assert!(!s.lock());
        s.unlock();
        assert!(s.lock());
    }

    #[test]
    fn kill_is_idempotent_and_sets_expired() {
        let s = session();
        assert!(!s.is_expired());
        s.kill();
        s.kill();
        assert!(s.is_expired());
        assert!(!s.is_connected());
    }

    #[test]
    fn interrupt_sets_interrupted_and_expires() {
        let s = session();
        s.interrupt();
        assert!(s.is_interrupted());
        assert!(s.is_expired());
    }

    #[tokio::test]
    async fn wait_for_close_resolves_after_kill() {
        let s = session();
        let waiter = tokio::spawn({
            let s = s.clone();
            async move { s.wait_for_close().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        s.kill();
        waiter.await.unwrap();
    }

    #[test]
    fn persist_forever_pins_expiry() {
        let s = session();
        s.persist(None, true);
        assert!(s.is_forever());
    }
}

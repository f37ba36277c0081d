//! Session registry for the streamable HTTP transport
//!
//! A session groups the logically related requests of one MCP client,
//! starting at the `initialize` handshake. The registry is the sole owner of
//! session bookkeeping: creation, activity tracking, idle expiry, and
//! teardown. Expiry is dual: `get` lazily removes an expired entry the moment
//! a caller presents it, and an independent periodic sweep evicts idle
//! entries between requests, so a stale session is never handed back.
//!
//! Every operation is synchronous over a `std::sync::Mutex`; the lock is
//! never held across an await, so check-then-act sequences on session state
//! cannot interleave with other requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Bookkeeping for one logical client connection
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub is_active: bool,
    last_activity: Instant,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            is_active: true,
            last_activity: Instant::now(),
        }
    }

    /// Time since the last successfully routed request for this session
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

struct RegistryInner {
    sessions: HashMap<String, Session>,
    torn_down: bool,
}

/// In-memory session store with sliding-window idle expiry
pub struct SessionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    timeout: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SessionRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                torn_down: false,
            })),
            timeout,
            sweeper: Mutex::new(None),
        }
    }

    /// Allocate a new session id and insert a fresh entry.
    ///
    /// After teardown the registry stays empty: an id is still returned but
    /// nothing is stored, so it will never validate.
    pub fn create(&self) -> String {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let mut id = Uuid::new_v4().to_string();
        while inner.sessions.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }
        if !inner.torn_down {
            inner.sessions.insert(id.clone(), Session::new(id.clone()));
            debug!(session_id = %id, total = inner.sessions.len(), "session created");
        }
        id
    }

    /// Fetch a session if it exists and has not idled out.
    ///
    /// An expired entry is removed as a side effect and reported absent
    /// (lazy expiry).
    pub fn get(&self, id: &str) -> Option<Session> {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let expired = match inner.sessions.get(id) {
            Some(session) => session.idle_for() > self.timeout,
            None => return None,
        };
        if expired {
            inner.sessions.remove(id);
            debug!(session_id = %id, "expired session removed on access");
            return None;
        }
        inner.sessions.get(id).cloned()
    }

    /// Record activity on a session; no-op for unknown ids (never creates)
    pub fn touch(&self, id: &str) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if let Some(session) = inner.sessions.get_mut(id) {
            session.last_activity = Instant::now();
            session.last_activity_at = Utc::now();
        }
    }

    /// Remove a session; idempotent
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if inner.sessions.remove(id).is_some() {
            debug!(session_id = %id, "session removed");
        }
    }

    /// Evict every session whose idle time exceeds the timeout.
    ///
    /// Returns the ids evicted so the caller can release per-session
    /// resources bound to them.
    pub fn sweep(&self) -> Vec<String> {
        sweep_map(&self.inner, self.timeout)
    }

    /// Snapshot of all live sessions. Diagnostics only, never used for routing.
    pub fn list_active(&self) -> Vec<Session> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner
            .sessions
            .values()
            .filter(|s| s.is_active && s.idle_for() <= self.timeout)
            .cloned()
            .collect()
    }

    /// Number of live (non-expired) sessions
    pub fn active_count(&self) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner
            .sessions
            .values()
            .filter(|s| s.idle_for() <= self.timeout)
            .count()
    }

    /// Start the periodic sweep. Runs until [`SessionRegistry::teardown`],
    /// or until the registry itself is dropped.
    pub fn start_sweeper(&self, interval: Duration) {
        let inner = self.inner.clone();
        let timeout = self.timeout;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sweep_map(&inner, timeout);
            }
        });
        let mut sweeper = self.sweeper.lock().expect("sweeper lock poisoned");
        if let Some(old) = sweeper.replace(handle) {
            old.abort();
        }
    }

    /// Stop the sweep, deactivate all sessions, and clear storage.
    ///
    /// Safe to call once; any session operation afterwards behaves as if the
    /// registry were empty.
    pub fn teardown(&self) {
        if let Some(handle) = self
            .sweeper
            .lock()
            .expect("sweeper lock poisoned")
            .take()
        {
            handle.abort();
        }
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        for session in inner.sessions.values_mut() {
            session.is_active = false;
        }
        let cleared = inner.sessions.len();
        inner.sessions.clear();
        inner.torn_down = true;
        info!(cleared, "session registry torn down");
    }
}

fn sweep_map(inner: &Mutex<RegistryInner>, timeout: Duration) -> Vec<String> {
    let mut inner = inner.lock().expect("registry lock poisoned");
    let expired: Vec<String> = inner
        .sessions
        .values()
        .filter(|s| s.idle_for() > timeout)
        .map(|s| s.id.clone())
        .collect();
    for id in &expired {
        inner.sessions.remove(id);
    }
    if !expired.is_empty() {
        info!(evicted = expired.len(), "sweep evicted idle sessions");
    }
    expired
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sweeper
            .lock()
            .expect("sweeper lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

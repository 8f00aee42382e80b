use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::{mapref::one::RefMut, DashMap};
use job_notifications::{NotificationSource, NotificationStore};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// One browser session: its notification store and when it was last used.
pub struct Session {
    pub store: NotificationStore,
    pub last_touched: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            store: NotificationStore::new(),
            last_touched: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) >= ttl
    }
}

/// Shared handles for every request.
///
/// Each session owns an independent notification store; the map is only a
/// registry of them, so no store is ever visible to another session.
/// Sessions idle for longer than `session_ttl` are dropped.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<DashMap<Uuid, Session>>,
    pub jobs: Arc<dyn NotificationSource>,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(jobs: Arc<dyn NotificationSource>) -> Self {
        AppState {
            sessions: Arc::new(DashMap::new()),
            jobs,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Looks a session up and marks it as used. An expired session is
    /// removed on the spot and reported as missing.
    pub fn live_session(&self, session_id: &Uuid) -> Option<RefMut<'_, Uuid, Session>> {
        let now = Instant::now();
        let ttl = self.session_ttl;
        if self
            .sessions
            .remove_if(session_id, |_, session| session.is_expired(now, ttl))
            .is_some()
        {
            tracing::info!(session_id = %session_id, "notification session expired");
            return None;
        }

        let mut session = self.sessions.get_mut(session_id)?;
        session.last_touched = now;
        Some(session)
    }

    /// Drops every session idle at `now`. Returns how many went.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let ttl = self.session_ttl;
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_expired(now, ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

/// Background sweep so abandoned sessions are freed even if nobody asks
/// for them again.
pub async fn sweep_sessions(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = state.sweep_expired(Instant::now());
        if removed > 0 {
            tracing::info!(removed, remaining = state.sessions.len(), "swept idle notification sessions");
        }
    }
}

// src/engine/registry.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::RwLock, task::JoinHandle};
use uuid::Uuid;

use super::driver::{LiveSession, SessionTiming};
use super::view::SessionView;
use crate::models::quiz::Quiz;

/// Live sessions keyed by id. Each entry is an independent attempt; the
/// registry never looks inside one.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<LiveSession>>>,
    timing: SessionTiming,
}

impl SessionRegistry {
    pub fn new(timing: SessionTiming) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timing,
        }
    }

    pub async fn start(&self, quiz: Arc<Quiz>) -> (Uuid, SessionView) {
        let id = Uuid::new_v4();
        let (session, view) = LiveSession::start(quiz, self.timing).await;
        self.sessions.write().await.insert(id, Arc::new(session));
        (id, view)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<LiveSession>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Exits the session and forgets it. Returns false for an unknown id.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.exit().await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions nobody has touched for `ttl`. Returns how many went.
    ///
    /// Candidates are re-checked under the write lock, so a session touched
    /// after the first pass survives.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let snapshot: Vec<(Uuid, Arc<LiveSession>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        let mut candidates = Vec::new();
        for (id, session) in snapshot {
            if session.idle_for().await >= ttl {
                candidates.push(id);
            }
        }
        if candidates.is_empty() {
            return 0;
        }

        let mut expired = Vec::new();
        {
            let mut sessions = self.sessions.write().await;
            for id in candidates {
                let still_idle = match sessions.get(&id) {
                    Some(session) => session.idle_for().await >= ttl,
                    None => false,
                };
                if still_idle {
                    if let Some(session) = sessions.remove(&id) {
                        expired.push(session);
                    }
                }
            }
        }

        let swept = expired.len();
        for session in expired {
            session.exit().await;
        }
        swept
    }
}

/// Periodically drops abandoned sessions.
pub fn spawn_sweeper(sessions: Arc<SessionRegistry>, ttl: Duration) -> JoinHandle<()> {
    let every = ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;

        loop {
            interval.tick().await;
            let swept = sessions.sweep_idle(ttl).await;
            if swept > 0 {
                tracing::info!(swept, "Dropped idle quiz sessions");
            }
        }
    })
}

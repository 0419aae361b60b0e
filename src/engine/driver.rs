// src/engine/driver.rs

//! Runs a [`QuizEngine`] against real time.
//!
//! The engine says what to schedule; this module owns the single timer task
//! that does it. Every transition aborts the previous task before spawning
//! the next one, and the engine's ticket check turns any task that slipped
//! through into a no-op.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::{sync::Mutex, task::JoinHandle, time::Instant};

use super::machine::{Choice, EngineError, Phase, QuizEngine, Schedule, Ticket, TickOutcome};
use super::view::{ReviewSheet, SessionView};
use crate::models::quiz::Quiz;

/// Timing knobs for a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub question_seconds: u32,
    pub tick: Duration,
    pub advance_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            question_seconds: super::machine::QUESTION_TIME_LIMIT,
            tick: Duration::from_secs(1),
            advance_delay: Duration::from_millis(500),
        }
    }
}

struct Inner {
    engine: QuizEngine,
    timer: Option<JoinHandle<()>>,
    last_activity: Instant,
}

/// One quiz attempt with its countdown running on the tokio runtime.
pub struct LiveSession {
    inner: Arc<Mutex<Inner>>,
    timing: SessionTiming,
}

impl LiveSession {
    /// Starts `quiz` immediately.
    pub async fn start(quiz: Arc<Quiz>, timing: SessionTiming) -> (Self, SessionView) {
        let session = Self {
            inner: Arc::new(Mutex::new(Inner {
                engine: QuizEngine::new(timing.question_seconds),
                timer: None,
                last_activity: Instant::now(),
            })),
            timing,
        };
        let view = {
            let mut inner = session.inner.lock().await;
            let schedule = inner.engine.start_session(quiz);
            apply(&mut inner, schedule, &session.inner, timing);
            SessionView::from(&inner.engine)
        };
        (session, view)
    }

    /// Current view. Reading counts as activity, so a page that keeps
    /// polling keeps its session alive.
    pub async fn view(&self) -> SessionView {
        let mut inner = self.inner.lock().await;
        inner.last_activity = Instant::now();
        SessionView::from(&inner.engine)
    }

    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.engine.phase()
    }

    pub async fn select_option(&self, choice: Choice) -> Result<SessionView, EngineError> {
        let mut inner = self.inner.lock().await;
        inner.last_activity = Instant::now();
        let schedule = inner.engine.select_option(choice)?;
        apply(&mut inner, schedule, &self.inner, self.timing);
        Ok(SessionView::from(&inner.engine))
    }

    pub async fn review(&self) -> Result<ReviewSheet, EngineError> {
        let mut inner = self.inner.lock().await;
        inner.last_activity = Instant::now();
        let total = inner.engine.quiz().map_or(0, |q| q.questions.len());
        let log = inner.engine.review()?;
        Ok(ReviewSheet::from_log(log, total))
    }

    pub async fn close_review(&self) -> Result<SessionView, EngineError> {
        let mut inner = self.inner.lock().await;
        inner.last_activity = Instant::now();
        inner.engine.close_review()?;
        Ok(SessionView::from(&inner.engine))
    }

    pub async fn reset(&self) -> Result<SessionView, EngineError> {
        let mut inner = self.inner.lock().await;
        inner.last_activity = Instant::now();
        let schedule = inner.engine.reset()?;
        apply(&mut inner, schedule, &self.inner, self.timing);
        Ok(SessionView::from(&inner.engine))
    }

    /// Discards the attempt and cancels whatever timer is pending.
    pub async fn exit(&self) {
        let mut inner = self.inner.lock().await;
        let schedule = inner.engine.exit_to_catalog();
        apply(&mut inner, schedule, &self.inner, self.timing);
    }

    pub async fn idle_for(&self) -> Duration {
        self.inner.lock().await.last_activity.elapsed()
    }

    pub async fn has_pending_timer(&self) -> bool {
        self.inner
            .lock()
            .await
            .timer
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(handle) = inner.timer.take() {
                handle.abort();
            }
        }
    }
}

fn apply(inner: &mut Inner, schedule: Schedule, shared: &Arc<Mutex<Inner>>, timing: SessionTiming) {
    if let Some(handle) = inner.timer.take() {
        handle.abort();
    }
    inner.timer = match schedule {
        Schedule::Countdown(ticket) => Some(spawn_countdown(Arc::downgrade(shared), ticket, timing)),
        Schedule::Advance(ticket) => Some(spawn_advance(Arc::downgrade(shared), ticket, timing)),
        Schedule::Cancel => None,
    };
}

/// Hands the finished task's slot over without aborting the caller itself.
/// Timer-driven transitions count as activity.
fn chain(inner: &mut Inner, schedule: Schedule, shared: &Arc<Mutex<Inner>>, timing: SessionTiming) {
    inner.last_activity = Instant::now();
    drop(inner.timer.take());
    apply(inner, schedule, shared, timing);
}

fn spawn_countdown(weak: Weak<Mutex<Inner>>, ticket: Ticket, timing: SessionTiming) -> JoinHandle<()> {
    let period = timing.tick.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            let Some(shared) = weak.upgrade() else {
                break;
            };
            let mut inner = shared.lock().await;
            match inner.engine.tick(ticket) {
                TickOutcome::Running(_) => {}
                TickOutcome::Stale => break,
                TickOutcome::Expired(next) => {
                    tracing::debug!(question = ticket.question_index(), "Question timed out");
                    chain(&mut inner, next, &shared, timing);
                    break;
                }
            }
        }
    })
}

fn spawn_advance(weak: Weak<Mutex<Inner>>, ticket: Ticket, timing: SessionTiming) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timing.advance_delay).await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut inner = shared.lock().await;
        if let Some(next) = inner.engine.advance(ticket) {
            chain(&mut inner, next, &shared, timing);
        }
    })
}

// src/engine/machine.rs

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::models::quiz::{Question, Quiz};

/// Seconds granted to each question unless configured otherwise.
pub const QUESTION_TIME_LIMIT: u32 = 30;

/// Lifecycle of one quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    AwaitingAnswer,
    /// Answer recorded, next question not yet shown.
    ShowingFeedback,
    Finished,
    ReviewingAnswers,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingAnswer => "awaiting answer",
            Phase::ShowingFeedback => "showing feedback",
            Phase::Finished => "finished",
            Phase::ReviewingAnswers => "reviewing answers",
        };
        f.write_str(name)
    }
}

/// Input to `select_option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Option(usize),
    Timeout,
}

/// Identity of a scheduled timer. Only the ticket matching the live session
/// is allowed to act; any other is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    question_index: usize,
}

impl Ticket {
    pub fn question_index(&self) -> usize {
        self.question_index
    }
}

/// What the caller has to schedule after a transition. The previously
/// scheduled timer, if any, must be cancelled first in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Tick once per second for the current question.
    Countdown(Ticket),
    /// Show the next question after the feedback delay.
    Advance(Ticket),
    /// Nothing left to run.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Stale,
    Running(u32),
    /// The countdown hit zero and a timeout answer was recorded.
    Expired(Schedule),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidTransition { operation, phase } => {
                write!(f, "cannot {} while {}", operation, phase)
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Immutable record of one answered (or timed-out) question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question: String,
    pub options: Vec<String>,
    /// `None` exactly when the question timed out.
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug)]
struct Session {
    quiz: Arc<Quiz>,
    phase: Phase,
    current_index: usize,
    score: usize,
    answer_log: Vec<AnswerRecord>,
    remaining_seconds: u32,
}

/// Single-session quiz state machine.
///
/// All transitions are synchronous; timing is delegated to the caller through
/// the returned [`Schedule`]. `generation` moves on every transition that
/// supersedes a pending timer, so a callback carrying an old [`Ticket`] can
/// never touch a later question.
#[derive(Debug)]
pub struct QuizEngine {
    session: Option<Session>,
    generation: u64,
    time_limit: u32,
}

impl Default for QuizEngine {
    fn default() -> Self {
        Self::new(QUESTION_TIME_LIMIT)
    }
}

impl QuizEngine {
    pub fn new(time_limit: u32) -> Self {
        Self {
            session: None,
            generation: 0,
            time_limit: time_limit.max(1),
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn quiz(&self) -> Option<&Arc<Quiz>> {
        self.session.as_ref().map(|s| &s.quiz)
    }

    pub fn score(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.score)
    }

    pub fn current_index(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.current_index)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.remaining_seconds)
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        self.session.as_ref().map_or(&[], |s| s.answer_log.as_slice())
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    /// The question on screen, only while awaiting an answer.
    pub fn current_question(&self) -> Option<&Question> {
        let session = self.session.as_ref()?;
        if session.phase != Phase::AwaitingAnswer {
            return None;
        }
        session.quiz.questions.get(session.current_index)
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
            question_index: self.current_index(),
        }
    }

    fn is_current(&self, ticket: Ticket, phase: Phase) -> bool {
        self.phase() == phase && ticket == self.ticket()
    }

    fn invalid(&self, operation: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            operation,
            phase: self.phase(),
        }
    }

    pub fn start_session(&mut self, quiz: Arc<Quiz>) -> Schedule {
        self.generation += 1;
        let empty = quiz.questions.is_empty();
        self.session = Some(Session {
            quiz,
            phase: if empty {
                Phase::Finished
            } else {
                Phase::AwaitingAnswer
            },
            current_index: 0,
            score: 0,
            answer_log: Vec::new(),
            remaining_seconds: if empty { 0 } else { self.time_limit },
        });
        if empty {
            Schedule::Cancel
        } else {
            Schedule::Countdown(self.ticket())
        }
    }

    /// Records the answer to the current question.
    ///
    /// An option index outside the question's options counts as a timeout.
    pub fn select_option(&mut self, choice: Choice) -> Result<Schedule, EngineError> {
        if self.phase() != Phase::AwaitingAnswer {
            return Err(self.invalid("select an option"));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(EngineError::InvalidTransition {
                operation: "select an option",
                phase: Phase::Idle,
            });
        };
        let Some(question) = session.quiz.questions.get(session.current_index) else {
            return Err(EngineError::InvalidTransition {
                operation: "select an option",
                phase: session.phase,
            });
        };

        let user_answer = match choice {
            Choice::Option(index) => question.options.get(index).cloned(),
            Choice::Timeout => None,
        };
        let is_correct = user_answer.as_deref() == Some(question.correct_answer.as_str());
        let record = AnswerRecord {
            question: question.question.clone(),
            options: question.options.clone(),
            user_answer,
            correct_answer: question.correct_answer.clone(),
            is_correct,
        };
        let total = session.quiz.questions.len();

        session.answer_log.push(record);
        if is_correct {
            session.score += 1;
        }
        session.current_index += 1;
        session.remaining_seconds = 0;
        session.phase = if session.current_index < total {
            Phase::ShowingFeedback
        } else {
            Phase::Finished
        };
        let phase = session.phase;

        self.generation += 1;
        Ok(match phase {
            Phase::ShowingFeedback => Schedule::Advance(self.ticket()),
            _ => Schedule::Cancel,
        })
    }

    /// One countdown second for the question `ticket` was issued for.
    pub fn tick(&mut self, ticket: Ticket) -> TickOutcome {
        if !self.is_current(ticket, Phase::AwaitingAnswer) {
            return TickOutcome::Stale;
        }
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Stale;
        };
        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        if session.remaining_seconds > 0 {
            return TickOutcome::Running(session.remaining_seconds);
        }
        match self.select_option(Choice::Timeout) {
            Ok(next) => TickOutcome::Expired(next),
            Err(_) => TickOutcome::Stale,
        }
    }

    /// Leaves the feedback window and shows the next question.
    pub fn advance(&mut self, ticket: Ticket) -> Option<Schedule> {
        if !self.is_current(ticket, Phase::ShowingFeedback) {
            return None;
        }
        let time_limit = self.time_limit;
        let session = self.session.as_mut()?;
        session.phase = Phase::AwaitingAnswer;
        session.remaining_seconds = time_limit;
        self.generation += 1;
        Some(Schedule::Countdown(self.ticket()))
    }

    /// Returns the answer log and moves to `ReviewingAnswers`.
    pub fn review(&mut self) -> Result<&[AnswerRecord], EngineError> {
        if !matches!(self.phase(), Phase::Finished | Phase::ReviewingAnswers) {
            return Err(self.invalid("review answers"));
        }
        match self.session.as_mut() {
            Some(session) => {
                session.phase = Phase::ReviewingAnswers;
                Ok(session.answer_log.as_slice())
            }
            None => Err(EngineError::InvalidTransition {
                operation: "review answers",
                phase: Phase::Idle,
            }),
        }
    }

    pub fn close_review(&mut self) -> Result<(), EngineError> {
        if self.phase() != Phase::ReviewingAnswers {
            return Err(self.invalid("close the review"));
        }
        if let Some(session) = self.session.as_mut() {
            session.phase = Phase::Finished;
        }
        Ok(())
    }

    /// Replays the same quiz from its first question.
    pub fn reset(&mut self) -> Result<Schedule, EngineError> {
        if !matches!(self.phase(), Phase::Finished | Phase::ReviewingAnswers) {
            return Err(self.invalid("reset"));
        }
        let Some(quiz) = self.session.as_ref().map(|s| Arc::clone(&s.quiz)) else {
            return Err(self.invalid("reset"));
        };
        Ok(self.start_session(quiz))
    }

    /// Discards the session from any state.
    pub fn exit_to_catalog(&mut self) -> Schedule {
        self.session = None;
        self.generation += 1;
        Schedule::Cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz() -> Arc<Quiz> {
        Arc::new(Quiz {
            title: "T".to_string(),
            questions: vec![
                Question {
                    question: "Q1".to_string(),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct_answer: "B".to_string(),
                },
                Question {
                    question: "Q2".to_string(),
                    options: vec!["X".into(), "Y".into(), "Z".into(), "W".into()],
                    correct_answer: "X".to_string(),
                },
            ],
        })
    }

    fn advance_from(engine: &mut QuizEngine, schedule: Schedule) -> Schedule {
        match schedule {
            Schedule::Advance(ticket) => engine.advance(ticket).expect("fresh ticket"),
            other => other,
        }
    }

    #[test]
    fn scenario_correct_then_timeout() {
        let mut engine = QuizEngine::default();
        let first = engine.start_session(sample_quiz());
        assert!(matches!(first, Schedule::Countdown(_)));
        assert_eq!(engine.phase(), Phase::AwaitingAnswer);
        assert_eq!(engine.remaining_seconds(), QUESTION_TIME_LIMIT);

        let next = engine.select_option(Choice::Option(1)).unwrap();
        assert_eq!(engine.phase(), Phase::ShowingFeedback);
        advance_from(&mut engine, next);
        assert_eq!(engine.current_question().unwrap().question, "Q2");

        let done = engine.select_option(Choice::Timeout).unwrap();
        assert_eq!(done, Schedule::Cancel);
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.score(), 1);

        let log = engine.answer_log();
        assert_eq!(log.len(), 2);
        assert!(log[0].is_correct);
        assert_eq!(log[0].user_answer.as_deref(), Some("B"));
        assert!(!log[1].is_correct);
        assert_eq!(log[1].user_answer, None);
    }

    #[test]
    fn full_run_scores_correct_answers_only() {
        let mut engine = QuizEngine::default();
        engine.start_session(sample_quiz());

        let mut last_score = 0;
        for choice in [Choice::Option(0), Choice::Option(0)] {
            let next = engine.select_option(choice).unwrap();
            assert!(engine.score() >= last_score);
            last_score = engine.score();
            advance_from(&mut engine, next);
        }

        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.answer_log().len(), 2);
        // "A" is wrong for Q1, "X" is right for Q2.
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn empty_quiz_finishes_immediately() {
        let mut engine = QuizEngine::default();
        let schedule = engine.start_session(Arc::new(Quiz {
            title: "empty".to_string(),
            questions: Vec::new(),
        }));
        assert_eq!(schedule, Schedule::Cancel);
        assert_eq!(engine.phase(), Phase::Finished);
        assert_eq!(engine.score(), 0);
        assert!(engine.answer_log().is_empty());
        assert!(engine.current_question().is_none());
    }

    #[test]
    fn out_of_range_index_counts_as_timeout() {
        let mut engine = QuizEngine::default();
        engine.start_session(sample_quiz());
        engine.select_option(Choice::Option(17)).unwrap();
        let record = &engine.answer_log()[0];
        assert_eq!(record.user_answer, None);
        assert!(!record.is_correct);
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn malformed_correct_answer_never_scores() {
        let mut engine = QuizEngine::default();
        engine.start_session(Arc::new(Quiz {
            title: "bad".to_string(),
            questions: vec![Question {
                question: "Q".to_string(),
                options: vec!["A".into(), "B".into()],
                correct_answer: "B ".to_string(),
            }],
        }));
        engine.select_option(Choice::Option(1)).unwrap();
        assert_eq!(engine.score(), 0);
        assert!(!engine.answer_log()[0].is_correct);
    }

    #[test]
    fn select_rejected_outside_awaiting_answer() {
        let mut engine = QuizEngine::default();
        assert!(engine.select_option(Choice::Option(0)).is_err());

        engine.start_session(sample_quiz());
        engine.select_option(Choice::Option(0)).unwrap();
        // Double click during the feedback window.
        let err = engine.select_option(Choice::Option(0)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                operation: "select an option",
                phase: Phase::ShowingFeedback,
            }
        );
        assert_eq!(engine.answer_log().len(), 1);
    }

    #[test]
    fn countdown_expiry_records_timeout() {
        let mut engine = QuizEngine::new(3);
        let Schedule::Countdown(ticket) = engine.start_session(sample_quiz()) else {
            panic!("expected countdown");
        };
        assert_eq!(engine.tick(ticket), TickOutcome::Running(2));
        assert_eq!(engine.tick(ticket), TickOutcome::Running(1));
        let outcome = engine.tick(ticket);
        assert!(matches!(outcome, TickOutcome::Expired(Schedule::Advance(_))));
        assert_eq!(engine.answer_log()[0].user_answer, None);
        assert_eq!(engine.current_index(), 1);
        // The same ticket is dead from now on.
        assert_eq!(engine.tick(ticket), TickOutcome::Stale);
    }

    #[test]
    fn stale_timer_after_manual_answer_is_noop() {
        let mut engine = QuizEngine::new(2);
        let Schedule::Countdown(stale) = engine.start_session(sample_quiz()) else {
            panic!("expected countdown");
        };
        let next = engine.select_option(Choice::Option(1)).unwrap();
        advance_from(&mut engine, next);

        let score = engine.score();
        let log_len = engine.answer_log().len();
        let remaining = engine.remaining_seconds();
        for _ in 0..5 {
            assert_eq!(engine.tick(stale), TickOutcome::Stale);
        }
        assert_eq!(engine.score(), score);
        assert_eq!(engine.answer_log().len(), log_len);
        assert_eq!(engine.remaining_seconds(), remaining);
    }

    #[test]
    fn stale_advance_is_ignored() {
        let mut engine = QuizEngine::default();
        engine.start_session(sample_quiz());
        let Schedule::Advance(ticket) = engine.select_option(Choice::Option(0)).unwrap() else {
            panic!("expected advance");
        };
        engine.exit_to_catalog();
        assert_eq!(engine.advance(ticket), None);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn reset_replays_same_quiz() {
        let mut engine = QuizEngine::default();
        let quiz = sample_quiz();
        engine.start_session(Arc::clone(&quiz));
        let next = engine.select_option(Choice::Option(1)).unwrap();
        advance_from(&mut engine, next);
        engine.select_option(Choice::Option(0)).unwrap();
        assert_eq!(engine.score(), 2);

        engine.review().unwrap();
        let schedule = engine.reset().unwrap();
        assert!(matches!(schedule, Schedule::Countdown(_)));
        assert_eq!(engine.phase(), Phase::AwaitingAnswer);
        assert_eq!(engine.score(), 0);
        assert!(engine.answer_log().is_empty());
        assert!(Arc::ptr_eq(engine.quiz().unwrap(), &quiz));
        assert_eq!(engine.current_question().unwrap().question, "Q1");
    }

    #[test]
    fn review_only_after_finish() {
        let mut engine = QuizEngine::default();
        engine.start_session(sample_quiz());
        assert!(engine.review().is_err());
        assert!(engine.reset().is_err());

        engine.select_option(Choice::Timeout).unwrap();
        let next = engine.select_option(Choice::Timeout);
        assert!(next.is_err());
    }

    #[test]
    fn review_round_trip_keeps_log() {
        let mut engine = QuizEngine::default();
        engine.start_session(sample_quiz());
        let next = engine.select_option(Choice::Option(1)).unwrap();
        advance_from(&mut engine, next);
        engine.select_option(Choice::Option(0)).unwrap();

        let log = engine.review().unwrap().to_vec();
        assert_eq!(engine.phase(), Phase::ReviewingAnswers);
        assert_eq!(log, engine.answer_log());

        engine.close_review().unwrap();
        assert_eq!(engine.phase(), Phase::Finished);
        assert!(engine.close_review().is_err());
    }

    #[test]
    fn exit_is_valid_from_any_state() {
        let mut engine = QuizEngine::default();
        assert_eq!(engine.exit_to_catalog(), Schedule::Cancel);

        let Schedule::Countdown(ticket) = engine.start_session(sample_quiz()) else {
            panic!("expected countdown");
        };
        engine.exit_to_catalog();
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.tick(ticket), TickOutcome::Stale);
        assert!(engine.answer_log().is_empty());
    }
}

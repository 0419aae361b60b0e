// src/engine/view.rs

//! Read-only projections of engine state for rendering.

use serde::Serialize;

use super::machine::{AnswerRecord, Phase, QuizEngine};

/// Everything the presentation layer needs to draw the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionView {
    Idle,
    #[serde(rename_all = "camelCase")]
    AwaitingAnswer {
        quiz_title: String,
        question_number: usize,
        total_questions: usize,
        question: String,
        options: Vec<String>,
        remaining_seconds: u32,
        score: usize,
    },
    #[serde(rename_all = "camelCase")]
    ShowingFeedback {
        quiz_title: String,
        question_number: usize,
        total_questions: usize,
        last_answer: AnswerRecord,
        score: usize,
    },
    #[serde(rename_all = "camelCase")]
    Finished {
        quiz_title: String,
        score: usize,
        total_questions: usize,
    },
    #[serde(rename_all = "camelCase")]
    ReviewingAnswers {
        quiz_title: String,
        score: usize,
        total_questions: usize,
        answers: Vec<AnswerRecord>,
    },
}

impl From<&QuizEngine> for SessionView {
    fn from(engine: &QuizEngine) -> Self {
        let Some(quiz) = engine.quiz() else {
            return SessionView::Idle;
        };
        let quiz_title = quiz.title.clone();
        let total_questions = quiz.questions.len();
        let score = engine.score();

        match engine.phase() {
            Phase::Idle => SessionView::Idle,
            Phase::AwaitingAnswer => match engine.current_question() {
                Some(q) => SessionView::AwaitingAnswer {
                    quiz_title,
                    question_number: engine.current_index() + 1,
                    total_questions,
                    question: q.question.clone(),
                    options: q.options.clone(),
                    remaining_seconds: engine.remaining_seconds(),
                    score,
                },
                None => SessionView::Finished {
                    quiz_title,
                    score,
                    total_questions,
                },
            },
            Phase::ShowingFeedback => match engine.answer_log().last() {
                Some(last) => SessionView::ShowingFeedback {
                    quiz_title,
                    question_number: engine.answer_log().len(),
                    total_questions,
                    last_answer: last.clone(),
                    score,
                },
                None => SessionView::Idle,
            },
            Phase::Finished => SessionView::Finished {
                quiz_title,
                score,
                total_questions,
            },
            Phase::ReviewingAnswers => SessionView::ReviewingAnswers {
                quiz_title,
                score,
                total_questions,
                answers: engine.answer_log().to_vec(),
            },
        }
    }
}

/// One option line of the answer sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOption {
    pub text: String,
    pub is_user_answer: bool,
    pub is_correct_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub number: usize,
    pub question: String,
    pub options: Vec<ReviewOption>,
    pub timed_out: bool,
    pub is_correct: bool,
}

/// The answer sheet shown after a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSheet {
    pub score: usize,
    pub total_questions: usize,
    pub items: Vec<ReviewItem>,
}

impl ReviewSheet {
    pub fn from_log(log: &[AnswerRecord], total_questions: usize) -> Self {
        let items = log
            .iter()
            .enumerate()
            .map(|(i, record)| ReviewItem {
                number: i + 1,
                question: record.question.clone(),
                options: record
                    .options
                    .iter()
                    .map(|opt| ReviewOption {
                        text: opt.clone(),
                        is_user_answer: record.user_answer.as_deref() == Some(opt.as_str()),
                        is_correct_answer: opt == &record.correct_answer,
                    })
                    .collect(),
                timed_out: record.user_answer.is_none(),
                is_correct: record.is_correct,
            })
            .collect();

        Self {
            score: log.iter().filter(|r| r.is_correct).count(),
            total_questions,
            items,
        }
    }
}

// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Root document of the catalog file: `{ "quizzes": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub quizzes: Vec<Quiz>,
}

/// A titled, ordered list of questions. Titles are unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// One multiple-choice question.
///
/// `correct_answer` is expected to equal exactly one of `options`, but nothing
/// enforces it: scoring is an exact string comparison, so a mismatch simply
/// makes the question unanswerable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
}

impl Question {
    pub fn has_matching_option(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 || options.len() > 10 {
        return Err(validator::ValidationError::new("options_count_out_of_range"));
    }
    for opt in options {
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// DTO for creating an empty quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

/// DTO for renaming a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

/// DTO accepted by `/api/admin/add-question`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    #[validate(length(min = 1, max = 200))]
    pub quiz_title: String,
    #[validate(nested)]
    pub new_question: Question,
}

/// DTO for AI-backed question generation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    #[validate(range(min = 1, max = 20))]
    pub number_of_questions: usize,
}

/// Response body for `/api/quiz-titles`.
#[derive(Debug, Serialize)]
pub struct QuizTitles {
    pub titles: Vec<String>,
}

impl Catalog {
    pub fn titles(&self) -> Vec<String> {
        self.quizzes.iter().map(|q| q.title.clone()).collect()
    }

    pub fn find(&self, title: &str) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.title == title)
    }

    fn find_mut(&mut self, title: &str) -> Result<&mut Quiz, AppError> {
        self.quizzes
            .iter_mut()
            .find(|q| q.title == title)
            .ok_or_else(|| AppError::NotFound(format!("Quiz '{}' not found", title)))
    }

    pub fn create_quiz(&mut self, title: &str) -> Result<(), AppError> {
        if self.find(title).is_some() {
            return Err(AppError::Conflict(format!("Quiz '{}' already exists", title)));
        }
        self.quizzes.push(Quiz {
            title: title.to_string(),
            questions: Vec::new(),
        });
        Ok(())
    }

    pub fn rename_quiz(&mut self, title: &str, new_title: &str) -> Result<(), AppError> {
        if title != new_title && self.find(new_title).is_some() {
            return Err(AppError::Conflict(format!(
                "Quiz '{}' already exists",
                new_title
            )));
        }
        self.find_mut(title)?.title = new_title.to_string();
        Ok(())
    }

    pub fn delete_quiz(&mut self, title: &str) -> Result<Quiz, AppError> {
        let index = self
            .quizzes
            .iter()
            .position(|q| q.title == title)
            .ok_or_else(|| AppError::NotFound(format!("Quiz '{}' not found", title)))?;
        Ok(self.quizzes.remove(index))
    }

    /// Appends a question and returns its index.
    pub fn add_question(&mut self, title: &str, question: Question) -> Result<usize, AppError> {
        let quiz = self.find_mut(title)?;
        quiz.questions.push(question);
        Ok(quiz.questions.len() - 1)
    }

    pub fn update_question(
        &mut self,
        title: &str,
        index: usize,
        question: Question,
    ) -> Result<(), AppError> {
        let quiz = self.find_mut(title)?;
        let slot = quiz
            .questions
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("Question {} not found", index)))?;
        *slot = question;
        Ok(())
    }

    pub fn delete_question(&mut self, title: &str, index: usize) -> Result<Question, AppError> {
        let quiz = self.find_mut(title)?;
        if index >= quiz.questions.len() {
            return Err(AppError::NotFound(format!("Question {} not found", index)));
        }
        Ok(quiz.questions.remove(index))
    }

    /// Appends generated questions to the quiz whose title matches `topic`
    /// case-insensitively, creating a quiz titled `topic` when none does.
    /// Returns the title the questions landed in.
    pub fn merge_generated(&mut self, topic: &str, questions: Vec<Question>) -> String {
        let needle = topic.to_lowercase();
        match self
            .quizzes
            .iter_mut()
            .find(|q| q.title.to_lowercase() == needle)
        {
            Some(quiz) => {
                quiz.questions.extend(questions);
                quiz.title.clone()
            }
            None => {
                self.quizzes.push(Quiz {
                    title: topic.to_string(),
                    questions,
                });
                topic.to_string()
            }
        }
    }
}

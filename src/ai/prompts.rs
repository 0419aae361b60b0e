// src/ai/prompts.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::{error::AppError, models::quiz::Question};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("static regex is valid")
});

/// Builds the generation prompt for `count` questions about `topic`.
pub fn question_prompt(topic: &str, count: usize) -> String {
    format!(
        r#"Generate {count} multiple-choice questions about {topic}. Each question should have 4 options and one correct answer. Format the output as a JSON array of objects, where each object has the following structure:
  {{
    "question": "The question text",
    "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
    "correctAnswer": "The correct option"
  }}
The correctAnswer value must be copied exactly from one of the options."#
    )
}

/// Pulls the question array out of a model reply.
///
/// Models usually wrap the JSON in a ```json fence; a bare array is accepted
/// too. At most `count` questions are returned.
pub fn extract_questions(reply: &str, count: usize) -> Result<Vec<Question>, AppError> {
    let body = JSON_FENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| reply.trim());

    let mut questions: Vec<Question> = serde_json::from_str(body).map_err(|e| {
        AppError::BadGateway(format!(
            "Unable to extract valid JSON from the AI response: {}",
            e
        ))
    })?;
    questions.truncate(count);
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FENCED: &str = r#"Sure! Here you go:
```json
[
  {"question": "What is 2+2?", "options": ["3", "4", "5", "6"], "correctAnswer": "4"},
  {"question": "Capital of France?", "options": ["Rome", "Paris", "Oslo", "Bern"], "correctAnswer": "Paris"}
]
```
Good luck!"#;

    #[test]
    fn prompt_mentions_topic_and_count() {
        let prompt = question_prompt("Rust lifetimes", 3);
        assert!(prompt.starts_with("Generate 3 multiple-choice questions about Rust lifetimes."));
        assert!(prompt.contains("\"correctAnswer\""));
    }

    #[test]
    fn extracts_fenced_json() {
        let questions = extract_questions(FENCED, 10).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].correct_answer, "Paris");
    }

    #[test]
    fn truncates_to_requested_count() {
        let questions = extract_questions(FENCED, 1).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "What is 2+2?");
    }

    #[test]
    fn accepts_bare_array() {
        let reply = r#"  [{"question": "Q", "options": ["a", "b"], "correctAnswer": "a"}]  "#;
        assert_eq!(extract_questions(reply, 5).unwrap().len(), 1);
    }

    #[test]
    fn rejects_prose() {
        let err = extract_questions("I cannot help with that.", 5).unwrap_err();
        assert!(matches!(err, AppError::BadGateway(_)));
    }
}

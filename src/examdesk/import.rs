//! Question-set import: validation and section selection.
//!
//! Everything here runs before a set reaches the store; a malformed file is
//! reported as `Validation` and nothing is written.

use crate::error::{ExamError, Result};
use crate::model::Question;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const OPTIONS_PER_QUESTION: usize = 4;

pub fn load_question_file(path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(path).map_err(ExamError::from_io)?;
    parse_question_set(&content)
}

pub fn parse_question_set(json: &str) -> Result<Vec<Question>> {
    let questions: Vec<Question> = serde_json::from_str(json)
        .map_err(|e| ExamError::Validation(format!("not a question array: {}", e)))?;
    validate(&questions)?;
    Ok(questions)
}

pub fn validate(questions: &[Question]) -> Result<()> {
    if questions.is_empty() {
        return Err(ExamError::Validation("question set is empty".to_string()));
    }

    for (i, q) in questions.iter().enumerate() {
        let n = i + 1;
        if q.question.trim().is_empty() {
            return Err(ExamError::Validation(format!(
                "question {} has no text",
                n
            )));
        }
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(ExamError::Validation(format!(
                "question {} has {} options, expected {}",
                n,
                q.options.len(),
                OPTIONS_PER_QUESTION
            )));
        }
        if let Some(blank) = q.options.iter().position(|o| o.trim().is_empty()) {
            return Err(ExamError::Validation(format!(
                "question {} option {} is blank",
                n,
                blank + 1
            )));
        }
        if q.answer >= OPTIONS_PER_QUESTION {
            return Err(ExamError::Validation(format!(
                "question {} answer {} is out of range",
                n, q.answer
            )));
        }
    }
    Ok(())
}

/// Levels present in a set, ascending.
pub fn levels(questions: &[Question]) -> Vec<u32> {
    questions
        .iter()
        .map(|q| q.level)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keep the questions whose level was requested, in their original order.
/// An empty request keeps everything.
pub fn select_sections(questions: &[Question], sections: &[u32]) -> Vec<Question> {
    if sections.is_empty() {
        return questions.to_vec();
    }
    questions
        .iter()
        .filter(|q| sections.contains(&q.level))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {"question": "Capital of France?", "options": ["Paris", "Rome", "Oslo", "Bern"], "answer": 0, "level": 1},
        {"question": "2 + 2?", "options": ["3", "4", "5", "6"], "answer": 1, "level": 2, "explanation": "Arithmetic"}
    ]"#;

    #[test]
    fn parses_valid_set() {
        let questions = parse_question_set(VALID).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].explanation.as_deref(), Some("Arithmetic"));
    }

    #[test]
    fn rejects_non_array() {
        let err = parse_question_set(r#"{"question": "x"}"#).unwrap_err();
        assert!(matches!(err, ExamError::Validation(_)));
    }

    #[test]
    fn rejects_empty_set() {
        assert!(matches!(
            parse_question_set("[]").unwrap_err(),
            ExamError::Validation(_)
        ));
    }

    #[test]
    fn rejects_wrong_option_count() {
        let json = r#"[{"question": "Q", "options": ["a", "b"], "answer": 0, "level": 1}]"#;
        let err = parse_question_set(json).unwrap_err();
        assert!(err.to_string().contains("2 options"));
    }

    #[test]
    fn rejects_answer_out_of_range() {
        let json = r#"[{"question": "Q", "options": ["a", "b", "c", "d"], "answer": 4, "level": 1}]"#;
        let err = parse_question_set(json).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_blank_option() {
        let json = r#"[{"question": "Q", "options": ["a", " ", "c", "d"], "answer": 0}]"#;
        let err = parse_question_set(json).unwrap_err();
        assert!(err.to_string().contains("option 2 is blank"));
    }

    #[test]
    fn selects_sections_by_level() {
        let questions = parse_question_set(VALID).unwrap();
        assert_eq!(levels(&questions), vec![1, 2]);
        assert_eq!(select_sections(&questions, &[2]).len(), 1);
        assert_eq!(select_sections(&questions, &[]).len(), 2);
        assert!(select_sections(&questions, &[9]).is_empty());
    }
}

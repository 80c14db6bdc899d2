use crate::model::Question;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub index: usize,
    pub selected: Option<usize>,
    pub correct: usize,
    pub outcome: Outcome,
    pub marked_for_review: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelBreakdown {
    pub level: u32,
    pub total: usize,
    pub correct: usize,
}

/// Score summary of a submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamReport {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub marked_for_review: usize,
    pub percentage: f64,
    pub levels: Vec<LevelBreakdown>,
    pub questions: Vec<QuestionResult>,
}

impl ExamReport {
    pub fn build(
        questions: &[Question],
        answers: &BTreeMap<usize, usize>,
        review_marks: &BTreeMap<usize, bool>,
    ) -> Self {
        let mut levels: BTreeMap<u32, LevelBreakdown> = BTreeMap::new();
        let mut results = Vec::with_capacity(questions.len());

        for (index, question) in questions.iter().enumerate() {
            let selected = answers.get(&index).copied();
            let outcome = match selected {
                None => Outcome::Unanswered,
                Some(s) if s == question.answer => Outcome::Correct,
                Some(_) => Outcome::Incorrect,
            };

            let level = levels.entry(question.level).or_insert_with(|| LevelBreakdown {
                level: question.level,
                ..Default::default()
            });
            level.total += 1;
            if outcome == Outcome::Correct {
                level.correct += 1;
            }

            results.push(QuestionResult {
                index,
                selected,
                correct: question.answer,
                outcome,
                marked_for_review: review_marks.get(&index).copied().unwrap_or(false),
            });
        }

        let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count();
        let correct = count(Outcome::Correct);
        let incorrect = count(Outcome::Incorrect);
        let unanswered = count(Outcome::Unanswered);
        let marked_for_review = results.iter().filter(|r| r.marked_for_review).count();
        let total = questions.len();

        Self {
            total,
            correct,
            incorrect,
            unanswered,
            marked_for_review,
            percentage: if total == 0 {
                0.0
            } else {
                correct as f64 * 100.0 / total as f64
            },
            levels: levels.into_values().collect(),
            questions: results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<Question> {
        vec![
            Question::new("One", ["a", "b", "c", "d"], 2, 1),
            Question::new("Two", ["a", "b", "c", "d"], 0, 2),
            Question::new("Three", ["a", "b", "c", "d"], 3, 1),
            Question::new("Four", ["a", "b", "c", "d"], 1, 2),
        ]
    }

    #[test]
    fn counts_outcomes() {
        let answers = BTreeMap::from([(0, 2), (1, 3), (3, 1)]);
        let marks = BTreeMap::from([(1, true), (2, false)]);

        let report = ExamReport::build(&questions(), &answers, &marks);

        assert_eq!(report.total, 4);
        assert_eq!(report.correct, 2);
        assert_eq!(report.incorrect, 1);
        assert_eq!(report.unanswered, 1);
        assert_eq!(report.marked_for_review, 1);
        assert_eq!(report.percentage, 50.0);
        assert_eq!(report.questions[2].outcome, Outcome::Unanswered);
    }

    #[test]
    fn breaks_down_by_level() {
        let answers = BTreeMap::from([(0, 2), (2, 0), (3, 1)]);
        let report = ExamReport::build(&questions(), &answers, &BTreeMap::new());

        assert_eq!(
            report.levels,
            vec![
                LevelBreakdown {
                    level: 1,
                    total: 2,
                    correct: 1
                },
                LevelBreakdown {
                    level: 2,
                    total: 2,
                    correct: 1
                },
            ]
        );
    }

    #[test]
    fn empty_exam_scores_zero() {
        let report = ExamReport::build(&[], &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(report.total, 0);
        assert_eq!(report.percentage, 0.0);
    }
}

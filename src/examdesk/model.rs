use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current on-disk schema version.
///
/// v1: `userSettings`, `examData`, `examResults`
/// v2: adds `images`
pub const SCHEMA_VERSION: u32 = 2;

/// A named, isolated key-value collection inside the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Partition {
    #[serde(rename = "userSettings")]
    UserSettings,
    #[serde(rename = "examData")]
    ExamData,
    #[serde(rename = "examResults")]
    ExamResults,
    #[serde(rename = "images")]
    Images,
}

impl Partition {
    pub fn all() -> &'static [Partition] {
        &[
            Partition::UserSettings,
            Partition::ExamData,
            Partition::ExamResults,
            Partition::Images,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Partition::UserSettings => "userSettings",
            Partition::ExamData => "examData",
            Partition::ExamResults => "examResults",
            Partition::Images => "images",
        }
    }

    /// Envelope field that carries the payload for records of this partition.
    pub fn payload_field(&self) -> &'static str {
        match self {
            Partition::UserSettings => "value",
            Partition::ExamData | Partition::ExamResults => "data",
            Partition::Images => "content",
        }
    }

    /// Schema version that introduced the partition.
    pub fn since_version(&self) -> u32 {
        match self {
            Partition::Images => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Partition::all()
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown partition: {}", s))
    }
}

/// Setting names stored in `userSettings`.
pub mod settings {
    pub const TIME_LIMIT: &str = "timeLimit";
    pub const PRACTICE_MODE: &str = "practiceMode";
    pub const DARK_MODE: &str = "darkMode";
    pub const MIGRATION_COMPLETED: &str = "migrationCompleted";

    pub const DEFAULT_TIME_LIMIT_MINUTES: u64 = 60;

    pub fn is_known(name: &str) -> bool {
        matches!(name, TIME_LIMIT | PRACTICE_MODE | DARK_MODE)
    }
}

/// Record ids used in `examData` and `examResults`.
pub mod keys {
    pub const QUIZ_DATA: &str = "quizData";
    pub const FINAL_QUIZ: &str = "finalQuiz";
    pub const EXAM_STATE: &str = "examState";
    pub const EXAM_META: &str = "examMeta";
    pub const IMAGE_MAP: &str = "imageMap";

    pub const EXAM_ANSWERS: &str = "examAnswers";
    pub const REVIEW_MARKS: &str = "reviewMarks";
}

/// One multiple-choice question as produced by the importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct option.
    pub answer: usize,
    #[serde(default)]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn new(question: &str, options: [&str; 4], answer: usize, level: u32) -> Self {
        Self {
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer,
            level,
            explanation: None,
        }
    }

    /// Option indices that are not the correct answer.
    pub fn incorrect_options(&self) -> Vec<usize> {
        (0..self.options.len())
            .filter(|i| *i != self.answer)
            .collect()
    }
}

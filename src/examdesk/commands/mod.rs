//! Command layer: one module per user-facing operation.
//!
//! Commands take the data manager (or config root) plus plain arguments and
//! return a [`CmdResult`]. They never print; the binary renders results.

use crate::config::AppConfig;
use crate::exam::{ExamReport, ExamStatus};
use crate::migration::MigrationReport;
use serde_json::Value;
use std::collections::BTreeMap;

pub mod clear;
pub mod config;
pub mod exam;
pub mod import;
pub mod init;
pub mod migrate;
pub mod results;
pub mod settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// One question as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<String>,
    pub hidden: Vec<usize>,
    pub selected: Option<usize>,
    pub marked: bool,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub settings: Option<BTreeMap<String, Value>>,
    pub status: Option<ExamStatus>,
    pub question: Option<QuestionView>,
    pub report: Option<ExamReport>,
    pub migration: Option<MigrationReport>,
    pub config: Option<AppConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_settings(mut self, settings: BTreeMap<String, Value>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_status(mut self, status: ExamStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_question(mut self, question: QuestionView) -> Self {
        self.question = Some(question);
        self
    }

    pub fn with_report(mut self, report: ExamReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_migration(mut self, report: MigrationReport) -> Self {
        self.migration = Some(report);
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}

/// Letter shown for an option index (`0` → `A`).
pub fn option_label(index: usize) -> char {
    char::from(b'A' + (index % 26) as u8)
}

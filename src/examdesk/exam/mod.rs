//! # Exam Session
//!
//! The in-memory state of one exam attempt and its persistence.
//!
//! ```text
//! Loading ──► InProgress ──► Submitting ──► Submitted
//!                │  ▲
//!                └──┘ select / review / fifty-fifty / navigate / tick
//! ```
//!
//! `InProgress` carries orthogonal flags: time expired, tab-leave count and
//! the set of questions marked for review. Timer expiry and the final
//! tab-leave force the move to `Submitting` without confirmation; once there,
//! submission always completes.
//!
//! ## Persistence
//!
//! - `examData.examMeta` holds `startedAt`. Written once per attempt, never
//!   overwritten, so reloading never restarts the clock.
//! - `examData.examState` holds the [`ExamSnapshot`], rewritten in full after
//!   every mutation. A failed write is logged and superseded by the next one.
//! - On submission, answers and review marks go to `examResults` and the
//!   attempt records are deleted. If the results cannot be saved, the
//!   checkpoint is marked submitted instead; rehydrating it goes straight back
//!   to `Submitted` and retries the results write.

use crate::data::DataManager;
use crate::model::settings;
use crate::store::backend::StorageBackend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod events;
pub mod report;
pub mod session;

pub use events::{EventBus, SessionEvent, SubscriptionId};
pub use report::ExamReport;
pub use session::ExamSession;

pub const DEFAULT_TAB_LEAVE_LIMIT: u32 = 3;

/// Checkpointed part of the session, stored under `examData.examState`.
///
/// An absent key in `answers` means "unanswered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSnapshot {
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub answers: BTreeMap<usize, usize>,
    #[serde(default)]
    pub review_marks: BTreeMap<usize, bool>,
    #[serde(default)]
    pub fifty_fifty_used: BTreeMap<usize, Vec<usize>>,
    #[serde(default)]
    pub tab_leave_count: u32,
    /// Set when the attempt was submitted but its results are not saved yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<SubmitReason>,
}

impl ExamSnapshot {
    pub fn is_marked(&self, question: usize) -> bool {
        self.review_marks.get(&question).copied().unwrap_or(false)
    }

    pub fn marked_count(&self) -> usize {
        self.review_marks.values().filter(|m| **m).count()
    }
}

/// Per-attempt metadata, stored under `examData.examMeta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamMeta {
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Loading,
    InProgress,
    Submitting,
    Submitted,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Loading => "loading",
            SessionPhase::InProgress => "in progress",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Submitted => "submitted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeLeft {
    /// Practice mode: no countdown.
    Unbounded,
    Seconds(u64),
}

impl TimeLeft {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, TimeLeft::Seconds(0))
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLeft::Unbounded => f.write_str("∞"),
            TimeLeft::Seconds(s) => write!(f, "{:02}:{:02}", s / 60, s % 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitReason {
    /// The user confirmed submission.
    Confirmed,
    TimeExpired,
    TabLeaveLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateOutcome {
    Moved(usize),
    /// Moving past either end asks the UI to confirm submission instead.
    ConfirmSubmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub practice_mode: bool,
    pub time_limit_minutes: u64,
    pub tab_leave_limit: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            practice_mode: false,
            time_limit_minutes: settings::DEFAULT_TIME_LIMIT_MINUTES,
            tab_leave_limit: DEFAULT_TAB_LEAVE_LIMIT,
        }
    }
}

impl SessionOptions {
    /// Read practice mode and time limit from the stored user settings.
    pub fn from_settings<B: StorageBackend>(data: &DataManager<B>, tab_leave_limit: u32) -> Self {
        Self {
            practice_mode: data.get_user_setting(settings::PRACTICE_MODE, false),
            time_limit_minutes: data
                .get_user_setting(settings::TIME_LIMIT, settings::DEFAULT_TIME_LIMIT_MINUTES),
            tab_leave_limit,
        }
    }

    pub fn time_limit_secs(&self) -> u64 {
        self.time_limit_minutes.saturating_mul(60)
    }
}

/// Read model for UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamStatus {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub question_count: usize,
    pub answered: usize,
    pub marked_for_review: usize,
    pub time_left: TimeLeft,
    pub time_expired: bool,
    pub tab_leave_count: u32,
    pub started_at: DateTime<Utc>,
}

/// Remaining seconds given a start timestamp, clamped at zero.
pub fn remaining_seconds(limit_secs: u64, started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed = now.signed_duration_since(started_at).num_seconds().max(0) as u64;
    limit_secs.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let mut snapshot = ExamSnapshot::default();
        snapshot.answers.insert(0, 2);
        snapshot.review_marks.insert(1, true);
        snapshot.fifty_fifty_used.insert(2, vec![0, 3]);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["answers"]["0"], 2);
        assert_eq!(json["reviewMarks"]["1"], true);
        assert_eq!(json["fiftyFiftyUsed"]["2"], serde_json::json!([0, 3]));
        assert_eq!(json["currentIndex"], 0);

        let back: ExamSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn older_snapshot_without_tab_count_loads() {
        let snapshot: ExamSnapshot =
            serde_json::from_str(r#"{"currentIndex":1,"answers":{"1":3}}"#).unwrap();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.answers.get(&1), Some(&3));
        assert_eq!(snapshot.tab_leave_count, 0);
    }

    #[test]
    fn remaining_time_is_clamped() {
        let start = Utc::now();
        assert_eq!(remaining_seconds(120, start, start + Duration::seconds(30)), 90);
        assert_eq!(remaining_seconds(120, start, start + Duration::seconds(500)), 0);
        assert_eq!(remaining_seconds(120, start, start - Duration::seconds(10)), 120);
    }

    #[test]
    fn time_left_display() {
        assert_eq!(TimeLeft::Seconds(125).to_string(), "02:05");
        assert_eq!(TimeLeft::Unbounded.to_string(), "∞");
    }
}
